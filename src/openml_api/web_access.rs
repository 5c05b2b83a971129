//! Access the OpenML REST API

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use app_dirs::{app_root, AppDataType, AppInfo};
use futures::{Future, Stream};
use hyper_tls::HttpsConnector;
use tokio_core::reactor::Core;

use crate::error::{Error, Result};

use super::file_lock::CacheLock;

const APP_INFO: AppInfo = AppInfo {
    name: "claimfreq",
    author: "claimfreq",
};

/// Query a URL. If possible read the response from local cache
pub fn get_cached(url: &str) -> Result<String> {
    let mut path = app_root(AppDataType::UserCache, &APP_INFO)?;
    path.push(url_to_file(url));

    if let Some(data) = read_cached(&path)? {
        info!("Loading cached {}", url);
        return Ok(data);
    }

    info!("Downloading {}", url);
    let data = download(url)?;
    store(&path, &data)?;
    Ok(data)
}

/// Contents of a cache entry, or `None` if there is none yet.
fn read_cached(path: &Path) -> Result<Option<String>> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            error!("Error while opening cache {}: {:?}", path.display(), e);
            return Err(e.into());
        }
    };
    let mut file = CacheLock::shared(f)?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    Ok(Some(data))
}

/// Write a cache entry. The data goes to a private file first and is renamed into place, so a
/// reader sees either no entry or the complete one.
fn store(path: &Path, data: &str) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(format!(".{}.part", process::id()));
    let partial = PathBuf::from(partial);

    let written = File::create(&partial)
        .and_then(CacheLock::exclusive)
        .and_then(|mut file| file.write_all(data.as_bytes()))
        .and_then(|_| fs::rename(&partial, path));

    if let Err(e) = written {
        if let Err(rm) = fs::remove_file(&partial) {
            warn!("Could not remove incomplete cache file: {}", rm);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Query a URL.
fn download(url: &str) -> Result<String> {
    let mut core = Core::new()?;
    let handle = core.handle();
    let client = hyper::Client::configure()
        .connector(HttpsConnector::new(4, &handle)?)
        .build(&handle);

    let work = client.get(url.parse()?).and_then(|res| {
        let status = res.status();
        res.body().concat2().map(move |body| (status, body))
    });
    let (status, body) = core.run(work)?;

    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_owned(),
            status: status.as_u16(),
        });
    }

    Ok(String::from_utf8(body.to_vec())?)
}

/// Convert URL to file name for caching
fn url_to_file(s: &str) -> String {
    s.replace('/', "_").replace(':', "")
}

#[test]
fn cache_file_names() {
    assert_eq!(
        url_to_file("https://www.openml.org/api/v1/json/data/41214"),
        "https__www.openml.org_api_v1_json_data_41214"
    );
}

#[cfg(test)]
fn scratch_path(name: &str) -> PathBuf {
    ::std::env::temp_dir().join(format!("claimfreq-{}-{}", name, process::id()))
}

#[test]
fn missing_entry_reads_as_none() {
    let path = scratch_path("missing");
    assert!(read_cached(&path).unwrap().is_none());
}

#[test]
fn stored_entry_is_read_back() {
    let path = scratch_path("stored");
    store(&path, "{\"data_set_description\": {}}").unwrap();
    let data = read_cached(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(data.as_ref().map(String::as_str), Some("{\"data_set_description\": {}}"));
}

#[test]
fn unreadable_entry_is_an_error() {
    // a directory in place of the cache file opens but cannot be read
    let path = scratch_path("unreadable");
    fs::create_dir_all(&path).unwrap();
    let result = read_cached(&path);
    let _ = fs::remove_dir(&path);

    match result {
        Err(Error::IoError(_)) => {}
        other => panic!("expected IoError, got {:?}", other),
    }
}
