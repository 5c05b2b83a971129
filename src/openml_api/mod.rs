//! Download data sets from [OpenML](https://www.openml.org), caching every response on disk.

mod api_types;
mod file_lock;
mod web_access;

use std::borrow::Cow;

use crate::dataset::{Caps, Dataset};
use crate::error::{Error, Result};

use self::api_types::GenericResponse;
use self::web_access::get_cached;

/// OpenML object identifier
pub trait Id {
    fn as_string(&self) -> Cow<str>;
}

impl Id for String {
    #[inline(always)]
    fn as_string(&self) -> Cow<str> {
        Cow::from(AsRef::<str>::as_ref(self))
    }
}

impl<'a> Id for &'a str {
    #[inline(always)]
    fn as_string(&self) -> Cow<str> {
        Cow::from(*self)
    }
}

impl Id for u32 {
    #[inline(always)]
    fn as_string(&self) -> Cow<str> {
        Cow::from(format!("{}", self))
    }
}

/// Fetch the raw ARFF text of data set `id`.
pub fn fetch_arff<T: Id>(id: T) -> Result<String> {
    let info_url = format!("https://www.openml.org/api/v1/json/data/{}", id.as_string());
    let info: GenericResponse = serde_json::from_str(&get_cached(&info_url)?)?;

    let url = info.download_url().ok_or_else(|| {
        Error::invalid(format!("data set {} has no download url", id.as_string()))
    })?;

    get_cached(url)
}

/// Fetch data set `id` and load it as capped policy records.
pub fn fetch_dataset<T: Id>(id: T, caps: &Caps) -> Result<Dataset> {
    let arff = fetch_arff(id)?;
    Dataset::from_arff(&arff, caps)
}

#[test]
fn ids_render_as_path_segments() {
    assert_eq!(41214u32.as_string(), "41214");
    assert_eq!("41214".as_string(), "41214");
    assert_eq!(String::from("41214").as_string(), "41214");
}
