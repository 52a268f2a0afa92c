//! A template source wraps a `Locator` and implements what a template cache needs from
//! it.
//!
//! The cache owns the source and keeps it around between freshness checks. The source in
//! turn owns at most one connection and one open stream, and releases both in `close`.
//!
//! ```rust,no_run
//! use std::io::Read;
//! use template_source::TemplateSource;
//!
//! let mut source = TemplateSource::open("file:///srv/templates/index.ftl").unwrap();
//! let stamp = source.last_modified();
//!
//! let mut text = String::new();
//! source.input_stream().unwrap().read_to_string(&mut text).unwrap();
//! source.close().unwrap();
//! # let _ = stamp;
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::*;
use crate::locator::{Locator, LocatorKind};
use crate::transport::file::file_modified;
use crate::transport::{self, close_quietly, release_quietly, Connection, ContentStream, Transports};

/// The millisecond timestamp reported when the modification time is unknown.
pub const UNKNOWN: i64 = -1;

#[derive(Debug)]
enum State {
    /// No connection, the next stream request connects again.
    Unopened,
    Connected(Box<dyn Connection>),
    StreamOpen(Box<dyn Connection>, Box<dyn ContentStream>),
    Closed,
}

/// Wraps a `Locator` with the connection and stream opened to it.
///
/// Two sources are equal if their locators are, whatever they have opened. Operations
/// take `&mut self`, a source must be shared between threads with a lock around it.
///
/// A closed source refuses to open streams and reports unknown timestamps.
#[derive(Debug)]
pub struct TemplateSource {
    locator: Locator,
    transports: Arc<Transports>,
    state: State,
}

impl TemplateSource {
    /// Creates a new template source, connecting to `locator` right away. Nothing is
    /// read until a stream is requested.
    pub fn new(locator: Locator, transports: Arc<Transports>) -> Result<Self> {
        let conn = transports.connect(&locator)?;
        debug!("Creates template source {}.", locator);

        Ok(TemplateSource {
            locator,
            transports,
            state: State::Connected(conn),
        })
    }

    /// Parses `locator` and creates a template source with the default transports,
    /// which are shared by every source opened this way.
    pub fn open<T: Into<String>>(locator: T) -> Result<Self> {
        let locator = Locator::new(locator)?;
        TemplateSource::new(locator, transport::shared())
    }

    #[inline]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    #[inline]
    pub fn transports(&self) -> &Arc<Transports> {
        &self.transports
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        match self.state {
            State::Closed => true,
            _ => false,
        }
    }

    #[inline]
    pub fn has_open_stream(&self) -> bool {
        match self.state {
            State::StreamOpen(..) => true,
            _ => false,
        }
    }

    /// Gets the modification time of the template, `None` if it is unknown.
    ///
    /// The timestamp of an archive entry is the timestamp of its container. Containers
    /// on the local disk are checked with the filesystem, others with a short-lived
    /// connection that is released before returning. Local files fall back to the
    /// filesystem when their connection can not tell.
    ///
    /// Failures are never reported, they turn into an unknown timestamp. Nothing opened
    /// here outlives the call.
    pub fn last_modified(&mut self) -> Option<SystemTime> {
        let native = match self.state {
            State::Closed => {
                warn!("Queries timestamp of closed template source {}.", self.locator);
                return None;
            }
            State::Unopened => None,
            State::Connected(ref mut conn) | State::StreamOpen(ref mut conn, _) => {
                if self.locator.is_archive_entry() {
                    None
                } else {
                    conn.last_modified()
                }
            }
        };

        match *self.locator.kind() {
            LocatorKind::ArchiveEntry { ref container, .. } => {
                container_modified(&self.transports, container)
            }
            LocatorKind::Direct if native.is_none() && self.locator.is_local_file() => {
                self.locator.to_file_path().and_then(file_modified)
            }
            LocatorKind::Direct => native,
        }
    }

    /// Gets the modification time of the template in milliseconds since the unix epoch,
    /// or `UNKNOWN`.
    pub fn last_modified_millis(&mut self) -> i64 {
        match self.last_modified() {
            Some(ts) => match ts.duration_since(UNIX_EPOCH) {
                Ok(v) => v.as_millis() as i64,
                Err(err) => -(err.duration().as_millis() as i64),
            },
            None => UNKNOWN,
        }
    }

    /// Gets a stream reading the template from its first byte.
    ///
    /// The stream stays owned by this source. If a stream has been opened before, it is
    /// closed and a new connection is established, so every call reads the whole content
    /// again.
    pub fn input_stream(&mut self) -> Result<&mut dyn ContentStream> {
        let mut conn = match mem::replace(&mut self.state, State::Unopened) {
            State::Closed => {
                self.state = State::Closed;
                return Err(Error::Closed(self.locator.to_string()));
            }
            State::Connected(conn) => conn,
            State::StreamOpen(_, mut stream) => {
                // the previous stream might have been closed by its reader already.
                close_quietly(&self.locator, stream.as_mut());
                debug!("Reconnects to {} to read from the start.", self.locator);
                self.transports.connect(&self.locator)?
            }
            State::Unopened => self.transports.connect(&self.locator)?,
        };

        let stream = match conn.open_stream() {
            Ok(stream) => stream,
            Err(err) => {
                self.state = State::Connected(conn);
                return Err(err);
            }
        };

        debug!("Opens stream of {}.", self.locator);
        self.state = State::StreamOpen(conn, stream);
        match self.state {
            State::StreamOpen(_, ref mut stream) => Ok(stream.as_mut()),
            _ => Err(Error::Closed(self.locator.to_string())),
        }
    }

    /// Releases the stream and the connection of this source.
    ///
    /// Without an open stream, a stream is opened from the connection and closed right
    /// away to free whatever the connection holds. Failures are reported as
    /// `Error::Release`, but the source ends up closed in any case. Closing a closed
    /// source does nothing.
    pub fn close(&mut self) -> Result<()> {
        let result = match mem::replace(&mut self.state, State::Closed) {
            State::StreamOpen(_, mut stream) => stream.close(),
            State::Connected(mut conn) => conn
                .open_stream()
                .map_err(Error::into_io)
                .and_then(|mut stream| stream.close()),
            State::Unopened | State::Closed => return Ok(()),
        };

        debug!("Releases template source {}.", self.locator);
        result.map_err(|err| Error::Release(self.locator.to_string(), err))
    }
}

fn container_modified(transports: &Transports, container: &Locator) -> Option<SystemTime> {
    // a nested archive changes only with the outermost one.
    if let Some(outer) = container.container() {
        return container_modified(transports, outer);
    }

    if let Some(path) = container.to_file_path() {
        return file_modified(path);
    }

    match transports.connect(container) {
        Ok(mut conn) => {
            let ts = conn.last_modified();
            release_quietly(container, conn.as_mut());
            ts
        }
        Err(err) => {
            debug!("Could not connect to container {}: {}", container, err);
            None
        }
    }
}

impl PartialEq for TemplateSource {
    fn eq(&self, rhs: &Self) -> bool {
        self.locator == rhs.locator
    }
}

impl Eq for TemplateSource {}

impl Hash for TemplateSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.locator.hash(state);
    }
}

impl Borrow<Locator> for TemplateSource {
    fn borrow(&self) -> &Locator {
        &self.locator
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.locator)
    }
}
