//! Transports turn locators into connections.
//!
//! A `Connection` is an open channel to the metadata of a resource. Nothing is read
//! until a `ContentStream` is opened from it, and every stream must be closed explicitly
//! by its owner. Transports are mounted into `Transports` by scheme, archive locators are
//! handled by the registry itself on top of the transport of their container.

pub mod archive;
pub use self::archive::{ArchiveConnection, BufferStream};

pub mod file;
pub use self::file::{FileConnection, FileStream, FileTransport};

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use self::http::{HttpConnection, HttpStream, HttpTransport};

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::SystemTime;

use crate::errors::*;
use crate::locator::{Locator, LocatorKind};
use crate::settings::Settings;

/// A readable stream over the content of a resource.
pub trait ContentStream: Read + fmt::Debug + Send {
    /// Releases the underlying resources. Closing a closed stream does nothing.
    fn close(&mut self) -> io::Result<()>;
}

/// An open channel to a resource, prior to reading bytes.
pub trait Connection: fmt::Debug + Send {
    /// Gets the timestamp reported natively by the transport, `None` if unknown.
    fn last_modified(&mut self) -> Option<SystemTime>;

    /// Opens a stream positioned at the start of the content.
    fn open_stream(&mut self) -> Result<Box<dyn ContentStream>>;
}

/// `Transport` creates connections for the locators of one or more schemes.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self, locator: &Locator) -> Result<Box<dyn Connection>>;
}

/// The registry of transports, keyed by lower-cased scheme.
pub struct Transports {
    mounts: HashMap<String, Arc<dyn Transport>>,
}

impl Transports {
    /// Creates a registry without any transport mounted.
    pub fn new() -> Self {
        Transports {
            mounts: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in transports enabled by `settings`.
    pub fn with_settings(settings: &Settings) -> Result<Self> {
        let mut transports = Transports::new();

        if settings.schemes.file {
            transports.insert("file", Arc::new(FileTransport::new()));
        }

        #[cfg(feature = "http")]
        {
            if settings.schemes.http {
                let http = Arc::new(HttpTransport::new(&settings.http)?);
                transports.insert("http", http.clone());
                transports.insert("https", http);
            }
        }

        Ok(transports)
    }

    /// Mounts a transport for `scheme`.
    pub fn mount<T, F>(&mut self, scheme: T, transport: F) -> Result<()>
    where
        T: AsRef<str>,
        F: Transport,
    {
        let scheme = scheme.as_ref().to_ascii_lowercase();
        if self.mounts.contains_key(&scheme) {
            return Err(Error::TransportDuplicated(scheme));
        }

        info!("Mounts transport for scheme {:?}.", scheme);
        self.mounts.insert(scheme, Arc::new(transport));
        Ok(())
    }

    /// Unmounts the transport of `scheme` from this registry.
    pub fn unmount<T: AsRef<str>>(&mut self, scheme: T) {
        self.mounts.remove(&scheme.as_ref().to_ascii_lowercase());
    }

    /// Checks if there is a transport mounted for `scheme`.
    pub fn is_mounted<T: AsRef<str>>(&self, scheme: T) -> bool {
        self.mounts
            .contains_key(&scheme.as_ref().to_ascii_lowercase())
    }

    /// Establishes a new connection to `locator`. Archive entries are reached through a
    /// connection to their container.
    pub fn connect(&self, locator: &Locator) -> Result<Box<dyn Connection>> {
        match *locator.kind() {
            LocatorKind::Direct => {
                let scheme = locator.scheme().to_ascii_lowercase();
                let transport = self
                    .mounts
                    .get(&scheme)
                    .ok_or_else(|| Error::UnsupportedScheme(scheme.clone(), locator.to_string()))?;

                debug!("Connects to {}.", locator);
                transport.connect(locator)
            }
            LocatorKind::ArchiveEntry {
                ref container,
                ref entry,
            } => {
                let conn = self.connect(container)?;
                let archive = ArchiveConnection::new(locator.clone(), conn, entry.clone());
                Ok(Box::new(archive))
            }
        }
    }

    fn insert(&mut self, scheme: &str, transport: Arc<dyn Transport>) {
        info!("Mounts transport for scheme {:?}.", scheme);
        self.mounts.insert(scheme.to_owned(), transport);
    }
}

impl Default for Transports {
    fn default() -> Self {
        Transports::with_settings(&Settings::default()).unwrap_or_else(|err| {
            warn!("{}", err);

            let mut transports = Transports::new();
            transports.insert("file", Arc::new(FileTransport::new()));
            transports
        })
    }
}

impl fmt::Debug for Transports {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut schemes: Vec<_> = self.mounts.keys().collect();
        schemes.sort();
        f.debug_struct("Transports")
            .field("schemes", &schemes)
            .finish()
    }
}

lazy_static! {
    static ref SHARED: Arc<Transports> = Arc::new(Transports::default());
}

/// Gets the registry of default transports shared by `TemplateSource::open`. It is
/// created on first use.
pub fn shared() -> Arc<Transports> {
    SHARED.clone()
}

/// Closes `stream`, logging and discarding the failure if any.
pub fn close_quietly(locator: &Locator, stream: &mut dyn ContentStream) {
    if let Err(err) = stream.close() {
        warn!("Ignores failure when closing stream of {}: {}", locator, err);
    }
}

/// Releases the resources held by `conn` by opening a stream and closing it right away,
/// logging and discarding any failure.
pub fn release_quietly(locator: &Locator, conn: &mut dyn Connection) {
    match conn.open_stream() {
        Ok(mut stream) => close_quietly(locator, stream.as_mut()),
        Err(err) => warn!("Ignores failure when releasing {}: {}", locator, err),
    }
}

pub(crate) fn stream_closed() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "stream has been closed")
}
