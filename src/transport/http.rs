use std::io::{self, Read};
use std::time::{Duration, SystemTime};

use reqwest::blocking::{Client, Response};
use reqwest::header::LAST_MODIFIED;
use reqwest::StatusCode;

use crate::errors::*;
use crate::locator::Locator;
use crate::settings::HttpParams;

use super::{stream_closed, Connection, ContentStream, Transport};

/// Serves `http` and `https` locators with blocking GET requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(params: &HttpParams) -> Result<Self> {
        let client = Client::builder()
            .timeout(params.timeout_ms.map(Duration::from_millis))
            .user_agent(params.user_agent.as_str())
            .build()
            .map_err(|err| Error::Transport("http", err.to_string()))?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn connect(&self, locator: &Locator) -> Result<Box<dyn Connection>> {
        let response =
            fetch(&self.client, locator).map_err(|err| Error::Connection(locator.to_string(), err))?;

        Ok(Box::new(HttpConnection {
            client: self.client.clone(),
            locator: locator.clone(),
            last_modified: parse_last_modified(&response),
            response: Some(response),
        }))
    }
}

/// A connection holding the response of its latest request. The body of that response
/// is handed to the first stream, every later stream issues a new request.
#[derive(Debug)]
pub struct HttpConnection {
    client: Client,
    locator: Locator,
    response: Option<Response>,
    last_modified: Option<SystemTime>,
}

impl Connection for HttpConnection {
    fn last_modified(&mut self) -> Option<SystemTime> {
        self.last_modified
    }

    fn open_stream(&mut self) -> Result<Box<dyn ContentStream>> {
        let response = match self.response.take() {
            Some(response) => response,
            None => {
                debug!("Requests {} again.", self.locator);
                fetch(&self.client, &self.locator)
                    .map_err(|err| Error::StreamOpen(self.locator.to_string(), err))?
            }
        };

        self.last_modified = parse_last_modified(&response);
        Ok(Box::new(HttpStream {
            response: Some(response),
        }))
    }
}

#[derive(Debug)]
pub struct HttpStream {
    response: Option<Response>,
}

impl Read for HttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.response {
            Some(ref mut response) => response.read(buf),
            None => Err(stream_closed()),
        }
    }
}

impl ContentStream for HttpStream {
    fn close(&mut self) -> io::Result<()> {
        self.response.take();
        Ok(())
    }
}

fn fetch(client: &Client, locator: &Locator) -> io::Result<Response> {
    let response = client
        .get(&**locator)
        .send()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let kind = if status == StatusCode::NOT_FOUND {
        io::ErrorKind::NotFound
    } else {
        io::ErrorKind::Other
    };

    Err(io::Error::new(kind, format!("server responded with {}", status)))
}

/// Parses the `Last-Modified` header, `None` if it is absent or malformed.
fn parse_last_modified(response: &Response) -> Option<SystemTime> {
    response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| chrono::DateTime::parse_from_rfc2822(v).ok())
        .map(SystemTime::from)
}
