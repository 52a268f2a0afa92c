//! Functions for loading transport settings.

use serde::{Deserialize, Serialize};

use crate::errors::*;

/// A structure containing configuration data for the built-in transports, which are
/// used to decide what schemes should be mounted and how they behave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpParams,
    pub schemes: SchemeParams,
}

impl Settings {
    /// Loads settings from a JSON document. Missing fields take their default values.
    pub fn from_json<T: AsRef<str>>(json: T) -> Result<Self> {
        serde_json::from_str(json.as_ref()).map_err(Error::Settings)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpParams {
    /// Sets the timeout of a whole request in milliseconds. `None` blocks until the
    /// remote side answers or drops the connection.
    pub timeout_ms: Option<u64>,
    /// Sets the `User-Agent` header of every request.
    pub user_agent: String,
}

impl Default for HttpParams {
    fn default() -> Self {
        HttpParams {
            timeout_ms: None,
            user_agent: concat!("template-source/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Specifies which built-in transports are mounted by `Transports::with_settings`.
/// `http` has no effect unless the `http` feature is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeParams {
    pub file: bool,
    pub http: bool,
}

impl Default for SchemeParams {
    fn default() -> Self {
        SchemeParams {
            file: true,
            http: true,
        }
    }
}
