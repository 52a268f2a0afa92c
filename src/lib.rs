//! Connection-backed template sources.
//!
//! A `TemplateSource` wraps a single `Locator` and implements what a template cache needs
//! from it: a stream over the current content, a cheap last-modified query for freshness
//! checks, and a deterministic release of every connection and stream it opened.
//!
//! # Locators
//!
//! All template sources are addressed with URL-like locators. Plain locators such as
//! `file:///srv/templates/index.ftl` or `https://example.com/t/index.ftl` are served by the
//! transport mounted for their scheme. Archive locators name an entry inside a container:
//!
//! ```sh
//! "jar:file:///srv/app/templates.jar!/mail/welcome.ftl"
//! ```
//!
//! The container part is a locator on its own, so entries can live in archives on any
//! mounted transport.
//!
//! # Freshness
//!
//! Entries of an archive can not change without the archive file itself being rewritten,
//! so the timestamp of an archive entry is always the timestamp of its container. For
//! containers on the local disk it is read from the filesystem directly, without opening
//! the archive at all. Local files whose transport can not tell a timestamp fall back to
//! the filesystem as well.
//!
//! # Transports
//!
//! `Transports` is a registry of pluggable `Transport`s keyed by scheme. `file` is always
//! available, `http` and `https` are added with the `http` cargo feature.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod errors;
pub mod locator;
pub mod settings;
pub mod source;
pub mod transport;

pub mod prelude {
    pub use crate::errors::{Error, Result};
    pub use crate::locator::{Locator, LocatorKind};
    pub use crate::settings::Settings;
    pub use crate::source::TemplateSource;
    pub use crate::transport::{Connection, ContentStream, Transport, Transports};
}

pub use crate::errors::{Error, Result};
pub use crate::locator::{Locator, LocatorKind};
pub use crate::source::TemplateSource;
