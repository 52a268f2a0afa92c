use std::io;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Locator({}) is malformed: {}.", _0, _1)]
    MalformedLocator(String, &'static str),
    #[fail(display = "No transport is mounted for scheme {:?} of locator {}.", _0, _1)]
    UnsupportedScheme(String, String),
    #[fail(display = "Transport for scheme {:?} has been mounted already.", _0)]
    TransportDuplicated(String),
    #[fail(display = "Failed to create {} transport: {}.", _0, _1)]
    Transport(&'static str, String),
    #[fail(display = "Failed to connect to {}: {}", _0, _1)]
    Connection(String, #[cause] io::Error),
    #[fail(display = "Failed to open stream of {}: {}", _0, _1)]
    StreamOpen(String, #[cause] io::Error),
    #[fail(display = "Failed to release {}: {}", _0, _1)]
    Release(String, #[cause] io::Error),
    #[fail(display = "Template source {} has been closed.", _0)]
    Closed(String),
    #[fail(display = "{}", _0)]
    Settings(#[cause] serde_json::Error),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl Error {
    /// Unwraps the underlying I/O failure, or wraps the message of any other
    /// error kind into one.
    pub fn into_io(self) -> io::Error {
        match self {
            Error::Connection(_, err) | Error::StreamOpen(_, err) | Error::Release(_, err) => err,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
