#![allow(dead_code)]

use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use template_source::errors::*;
use template_source::locator::Locator;
use template_source::transport::{Connection, ContentStream, Transport};

pub fn init() {
    let _ = env_logger::try_init();
}

pub fn stamp(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn write_file<P: AsRef<Path>>(path: P, bytes: &[u8], modified: SystemTime) {
    fs::write(&path, bytes).unwrap();
    touch(path, modified);
}

pub fn touch<P: AsRef<Path>>(path: P, modified: SystemTime) {
    fs::OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

/// Builds a zip archive in memory.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for &(name, bytes) in entries {
        writer
            .start_file(name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

pub fn read_all(stream: &mut dyn ContentStream) -> Vec<u8> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).unwrap();
    buf
}

/// Counts every resource handed out by a `FakeTransport`.
#[derive(Debug, Default)]
pub struct Counters {
    pub connects: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub timestamps: AtomicUsize,
    pub refuse_connect: AtomicBool,
    pub refuse_open: AtomicBool,
    pub refuse_close: AtomicBool,
}

impl Counters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn timestamps(&self) -> usize {
        self.timestamps.load(Ordering::SeqCst)
    }

    /// Streams opened but not closed yet.
    pub fn live(&self) -> usize {
        self.opened() - self.closed()
    }

    pub fn set(&self, flag: &AtomicBool, v: bool) {
        flag.store(v, Ordering::SeqCst);
    }
}

/// A transport serving fixed bytes for any locator of its scheme.
#[derive(Debug, Clone)]
pub struct FakeTransport {
    pub counters: Arc<Counters>,
    pub content: Arc<Vec<u8>>,
    pub last_modified: Option<SystemTime>,
}

impl FakeTransport {
    pub fn new<T: Into<Vec<u8>>>(content: T, last_modified: Option<SystemTime>) -> Self {
        FakeTransport {
            counters: Arc::new(Counters::default()),
            content: Arc::new(content.into()),
            last_modified,
        }
    }
}

impl Transport for FakeTransport {
    fn connect(&self, locator: &Locator) -> Result<Box<dyn Connection>> {
        if self.counters.refuse_connect.load(Ordering::SeqCst) {
            let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
            return Err(Error::Connection(locator.to_string(), err));
        }

        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            locator: locator.clone(),
            transport: self.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    locator: Locator,
    transport: FakeTransport,
}

impl Connection for FakeConnection {
    fn last_modified(&mut self) -> Option<SystemTime> {
        self.transport
            .counters
            .timestamps
            .fetch_add(1, Ordering::SeqCst);
        self.transport.last_modified
    }

    fn open_stream(&mut self) -> Result<Box<dyn ContentStream>> {
        let counters = self.transport.counters.clone();
        if counters.refuse_open.load(Ordering::SeqCst) {
            let err = io::Error::new(io::ErrorKind::Other, "refused");
            return Err(Error::StreamOpen(self.locator.to_string(), err));
        }

        counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            cursor: Some(Cursor::new(self.transport.content.to_vec())),
            counters,
        }))
    }
}

#[derive(Debug)]
pub struct FakeStream {
    cursor: Option<Cursor<Vec<u8>>>,
    counters: Arc<Counters>,
}

impl Read for FakeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.cursor {
            Some(ref mut cursor) => cursor.read(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "closed")),
        }
    }
}

impl ContentStream for FakeStream {
    fn close(&mut self) -> io::Result<()> {
        if self.cursor.take().is_none() {
            return Ok(());
        }

        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.counters.refuse_close.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "refused"));
        }

        Ok(())
    }
}
