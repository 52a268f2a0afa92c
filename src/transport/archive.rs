use std::io::{self, Cursor, Read};
use std::time::SystemTime;

use crate::errors::*;
use crate::locator::Locator;

use super::{close_quietly, stream_closed, Connection, ContentStream};

/// A connection to an entry of a zip-like archive, such as a jar.
///
/// The archive is read through a connection to its container. Opening a stream buffers
/// the container, closes its stream and extracts the entry into memory, so no handle of
/// the container stays open while the entry is being read.
#[derive(Debug)]
pub struct ArchiveConnection {
    locator: Locator,
    container: Box<dyn Connection>,
    entry: String,
}

impl ArchiveConnection {
    pub fn new<T: Into<String>>(locator: Locator, container: Box<dyn Connection>, entry: T) -> Self {
        ArchiveConnection {
            locator,
            container,
            entry: entry.into(),
        }
    }

    #[inline]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    fn read_container(&mut self) -> Result<Vec<u8>> {
        let mut stream = self.container.open_stream()?;

        let mut buf = Vec::new();
        let read = stream.read_to_end(&mut buf);

        match self.locator.container() {
            Some(container) => close_quietly(container, stream.as_mut()),
            None => close_quietly(&self.locator, stream.as_mut()),
        }

        read.map_err(|err| Error::StreamOpen(self.locator.to_string(), err))?;
        Ok(buf)
    }

    fn extract(&self, buf: Vec<u8>) -> io::Result<Vec<u8>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(buf))?;
        let mut file = archive.by_name(&self.entry)?;

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Connection for ArchiveConnection {
    // Entries can not change without their archive, this never touches the entry.
    fn last_modified(&mut self) -> Option<SystemTime> {
        self.container.last_modified()
    }

    fn open_stream(&mut self) -> Result<Box<dyn ContentStream>> {
        let buf = self
            .read_container()
            .map_err(|err| Error::StreamOpen(self.locator.to_string(), err.into_io()))?;

        let bytes = self
            .extract(buf)
            .map_err(|err| Error::StreamOpen(self.locator.to_string(), err))?;

        debug!("Extracts {} bytes from {}.", bytes.len(), self.locator);
        Ok(Box::new(BufferStream::new(bytes)))
    }
}

/// A stream over bytes held in memory.
#[derive(Debug)]
pub struct BufferStream {
    buffer: Option<Cursor<Vec<u8>>>,
}

impl BufferStream {
    pub fn new(bytes: Vec<u8>) -> Self {
        BufferStream {
            buffer: Some(Cursor::new(bytes)),
        }
    }
}

impl Read for BufferStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.buffer {
            Some(ref mut buffer) => buffer.read(buf),
            None => Err(stream_closed()),
        }
    }
}

impl ContentStream for BufferStream {
    fn close(&mut self) -> io::Result<()> {
        self.buffer.take();
        Ok(())
    }
}
