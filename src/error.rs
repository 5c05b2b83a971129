use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::string::FromUtf8Error;

use app_dirs::AppDirsError;
use arff::Error as ArffError;
use hyper::error::UriError as HyperUriError;
use hyper::Error as HyperError;
use hyper_tls::Error as HyperTlsError;
use serde_json::Error as JsonError;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// An argument is outside the domain of the operation
    InvalidArgument(String),

    /// Two sequences that must be paired positionally differ in length
    ShapeMismatch { expected: usize, actual: usize },

    /// Reported by the modeling service; passed through uninterpreted
    TrainingError(String),

    /// A download answered with a non-success status
    HttpStatus { url: String, status: u16 },

    IoError(IoError),
    Utf8Error(FromUtf8Error),
    HyperError(HyperError),
    HyperUriError(HyperUriError),
    HyperTlsError(HyperTlsError),
    JsonError(JsonError),
    ArffError(ArffError),
    AppDirsError(AppDirsError),
}

impl Error {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn training<S: Into<String>>(msg: S) -> Self {
        Error::TrainingError(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidArgument(ref msg) => write!(f, "invalid argument: {}", msg),
            Error::ShapeMismatch { expected, actual } => write!(
                f,
                "shape mismatch: expected {} elements, got {}",
                expected, actual
            ),
            Error::TrainingError(ref msg) => write!(f, "training error: {}", msg),
            Error::HttpStatus { ref url, status } => {
                write!(f, "GET {} answered with status {}", url, status)
            }
            Error::IoError(ref e) => write!(f, "io error: {}", e),
            Error::Utf8Error(ref e) => write!(f, "utf-8 error: {}", e),
            Error::HyperError(ref e) => write!(f, "http error: {}", e),
            Error::HyperUriError(ref e) => write!(f, "invalid uri: {}", e),
            Error::HyperTlsError(ref e) => write!(f, "tls error: {}", e),
            Error::JsonError(ref e) => write!(f, "json error: {}", e),
            Error::ArffError(ref e) => write!(f, "arff error: {:?}", e),
            Error::AppDirsError(ref e) => write!(f, "cache directory error: {}", e),
        }
    }
}

impl StdError for Error {}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::IoError(e)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(e: FromUtf8Error) -> Self {
        Error::Utf8Error(e)
    }
}

impl From<HyperError> for Error {
    fn from(e: HyperError) -> Self {
        Error::HyperError(e)
    }
}

impl From<HyperUriError> for Error {
    fn from(e: HyperUriError) -> Self {
        Error::HyperUriError(e)
    }
}

impl From<HyperTlsError> for Error {
    fn from(e: HyperTlsError) -> Self {
        Error::HyperTlsError(e)
    }
}

impl From<JsonError> for Error {
    fn from(e: JsonError) -> Self {
        Error::JsonError(e)
    }
}

impl From<ArffError> for Error {
    fn from(e: ArffError) -> Self {
        Error::ArffError(e)
    }
}

impl From<AppDirsError> for Error {
    fn from(e: AppDirsError) -> Self {
        match e {
            AppDirsError::Io(e) => Error::IoError(e),
            _ => Error::AppDirsError(e),
        }
    }
}

#[test]
fn display_names_the_kind() {
    let e = Error::ShapeMismatch {
        expected: 3,
        actual: 2,
    };
    assert_eq!(e.to_string(), "shape mismatch: expected 3 elements, got 2");

    let e = Error::training("cluster out of memory");
    assert_eq!(e.to_string(), "training error: cluster out of memory");
}
