use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::*;
use crate::locator::Locator;

use super::{stream_closed, Connection, ContentStream, Transport};

/// Reads the modification time of `path` from the filesystem, `None` if it could not
/// be told.
pub fn file_modified<T: AsRef<Path>>(path: T) -> Option<SystemTime> {
    fs::metadata(path).and_then(|v| v.modified()).ok()
}

/// Serves `file` locators from the local host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTransport {}

impl FileTransport {
    pub fn new() -> Self {
        FileTransport {}
    }
}

impl Transport for FileTransport {
    fn connect(&self, locator: &Locator) -> Result<Box<dyn Connection>> {
        let path = locator.to_file_path().ok_or_else(|| {
            let err = io::Error::new(io::ErrorKind::InvalidInput, "not a local file locator");
            Error::Connection(locator.to_string(), err)
        })?;

        let metadata = fs::metadata(&path).map_err(|err| Error::Connection(locator.to_string(), err))?;
        if metadata.is_dir() {
            let err = io::Error::new(io::ErrorKind::Other, format!("{:?} is a directory", path));
            return Err(Error::Connection(locator.to_string(), err));
        }

        Ok(Box::new(FileConnection {
            locator: locator.clone(),
            path,
        }))
    }
}

/// A connection to a file. Every stream opened from it is a new file handle.
#[derive(Debug)]
pub struct FileConnection {
    locator: Locator,
    path: PathBuf,
}

impl FileConnection {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connection for FileConnection {
    fn last_modified(&mut self) -> Option<SystemTime> {
        file_modified(&self.path)
    }

    fn open_stream(&mut self) -> Result<Box<dyn ContentStream>> {
        let file = fs::File::open(&self.path)
            .map_err(|err| Error::StreamOpen(self.locator.to_string(), err))?;

        Ok(Box::new(FileStream { file: Some(file) }))
    }
}

#[derive(Debug)]
pub struct FileStream {
    file: Option<fs::File>,
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.file {
            Some(ref mut file) => file.read(buf),
            None => Err(stream_closed()),
        }
    }
}

impl ContentStream for FileStream {
    fn close(&mut self) -> io::Result<()> {
        self.file.take();
        Ok(())
    }
}
