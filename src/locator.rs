//! Uniqued resource locators.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::errors::*;

/// Schemes whose locators name an entry inside an archive container.
pub const ARCHIVE_SCHEMES: &[&str] = &["jar", "zip"];

/// Separates the container locator from the entry path of an archive locator.
pub const ARCHIVE_SEPARATOR: &str = "!/";

const SCHEME_END: usize = 0;
const USERNAME: usize = 1;
const USERNAME_END: usize = 2;
const PASSWORD: usize = 3;
const PASSWORD_END: usize = 4;
const HOST: usize = 5;
const HOST_END: usize = 6;
const PORT: usize = 7;
const PORT_END: usize = 8;
const PATH: usize = 9;
const PATH_END: usize = 10;
const QUERY: usize = 11;
const QUERY_END: usize = 12;
const FRAGMENT: usize = 13;
const FRAGMENT_END: usize = 14;
const MAX_COMPONENTS: usize = 15;

/// How a locator reaches its bytes, resolved once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorKind {
    /// Served by the transport mounted for the scheme of the locator.
    Direct,
    /// An entry of the archive named by `container`.
    ArchiveEntry {
        container: Box<Locator>,
        entry: String,
    },
}

/// All template sources are addressed with URL-like locators. On creation, the locator
/// will be parsed and indices to its parts will be stored internally.
///
/// Identity is the exact locator string: equality, hashing and display never look at
/// anything else.
#[derive(Debug, Clone)]
pub struct Locator {
    url: String,
    components: [usize; MAX_COMPONENTS],
    kind: LocatorKind,
}

impl Locator {
    /// Parses a new locator.
    pub fn new<T: Into<String>>(url: T) -> Result<Self> {
        let url = url.into();
        let mut components = [0; MAX_COMPONENTS];

        let scheme_end = url
            .find(':')
            .ok_or_else(|| Error::MalformedLocator(url.clone(), "missing scheme"))?;

        if !is_scheme(&url[..scheme_end]) {
            return Err(Error::MalformedLocator(url, "invalid scheme"));
        }

        components[SCHEME_END] = scheme_end;

        let archive = ARCHIVE_SCHEMES
            .iter()
            .any(|v| url[..scheme_end].eq_ignore_ascii_case(v));

        if archive {
            let kind = Locator::parse_archive_entry(&url, scheme_end + 1)?;
            return Ok(Locator {
                url,
                components,
                kind,
            });
        }

        Locator::parse_hierarchical(&url, scheme_end + 1, &mut components)?;
        Ok(Locator {
            url,
            components,
            kind: LocatorKind::Direct,
        })
    }

    /// Builds a `file` locator from an absolute path, percent-encoding whatever a URL
    /// path can not hold.
    pub fn from_file_path<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let url = Url::from_file_path(path).map_err(|_| {
            Error::MalformedLocator(path.to_string_lossy().into_owned(), "path must be absolute")
        })?;

        Locator::new(String::from(url))
    }

    fn parse_archive_entry(url: &str, body: usize) -> Result<LocatorKind> {
        let sep = url[body..]
            .rfind(ARCHIVE_SEPARATOR)
            .map(|v| v + body)
            .ok_or_else(|| Error::MalformedLocator(url.into(), "missing `!/` entry separator"))?;

        let entry = &url[(sep + ARCHIVE_SEPARATOR.len())..];
        if entry.is_empty() {
            return Err(Error::MalformedLocator(url.into(), "archive entry could not be empty"));
        }

        let container = Locator::new(&url[body..sep])?;
        Ok(LocatorKind::ArchiveEntry {
            container: Box::new(container),
            entry: entry.to_owned(),
        })
    }

    fn parse_hierarchical(url: &str, body: usize, components: &mut [usize]) -> Result<()> {
        let mut iter = body;

        if url[iter..].starts_with("//") {
            iter += 2;
            let authority_end = url[iter..]
                .find('/')
                .map(|v| v + iter)
                .ok_or_else(|| Error::MalformedLocator(url.into(), "missing path"))?;

            // extract user and password
            if let Some(info_end) = url[iter..authority_end].rfind('@') {
                let info_end = info_end + iter;
                components[USERNAME] = iter;

                if let Some(user_end) = url[iter..info_end].find(':') {
                    let user_end = user_end + iter;
                    components[USERNAME_END] = user_end;
                    components[PASSWORD] = user_end + 1;
                    components[PASSWORD_END] = info_end;
                } else {
                    components[USERNAME_END] = info_end;
                }

                iter = info_end + 1;
            }

            components[HOST] = iter;
            components[HOST_END] = authority_end;

            // the port colon must come after any bracketed ipv6 literal.
            if let Some(colon) = url[iter..authority_end].rfind(':') {
                let colon = colon + iter;
                if !url[colon..authority_end].contains(']') {
                    components[HOST_END] = colon;
                    components[PORT] = colon + 1;
                    components[PORT_END] = authority_end;
                }
            }

            iter = authority_end;
        } else {
            components[HOST] = iter;
            components[HOST_END] = iter;
        }

        if !url[iter..].starts_with('/') {
            return Err(Error::MalformedLocator(url.into(), "path must be absolute"));
        }

        components[PATH] = iter;
        components[PATH_END] = url.len();

        if let Some(fragment) = url[iter..].find('#') {
            let fragment = fragment + iter;
            components[PATH_END] = fragment;
            components[FRAGMENT] = fragment + 1;
            components[FRAGMENT_END] = url.len();
        }

        if let Some(query) = url[iter..components[PATH_END]].find('?') {
            let query = query + iter;
            components[QUERY] = query + 1;
            components[QUERY_END] = components[PATH_END];
            components[PATH_END] = query;
        }

        Ok(())
    }

    /// Gets the scheme of this locator, in the case it was written.
    #[inline]
    pub fn scheme(&self) -> &str {
        &self.url[..self.components[SCHEME_END]]
    }

    #[inline]
    pub fn kind(&self) -> &LocatorKind {
        &self.kind
    }

    /// Gets the container locator if this locator names an archive entry.
    pub fn container(&self) -> Option<&Locator> {
        match self.kind {
            LocatorKind::ArchiveEntry { ref container, .. } => Some(container),
            LocatorKind::Direct => None,
        }
    }

    /// Gets the entry path inside the container if this locator names an archive entry.
    pub fn entry(&self) -> Option<&str> {
        match self.kind {
            LocatorKind::ArchiveEntry { ref entry, .. } => Some(entry),
            LocatorKind::Direct => None,
        }
    }

    #[inline]
    pub fn is_archive_entry(&self) -> bool {
        self.container().is_some()
    }

    /// Returns true if this locator points at the local filesystem directly.
    #[inline]
    pub fn is_local_file(&self) -> bool {
        self.kind == LocatorKind::Direct && self.scheme().eq_ignore_ascii_case("file")
    }

    /// Gets the percent-decoded filesystem path of a local file locator. `None` if the
    /// locator is not a local file, or names a remote host.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.is_local_file() {
            return None;
        }

        Url::parse(&self.url).ok()?.to_file_path().ok()
    }
}

macro_rules! field {
    ($name: ident, $start: ident, $end: ident) => {
        #[inline]
        pub fn $name(&self) -> &str {
            &self.url[self.components[$start]..self.components[$end]]
        }
    };
}

macro_rules! optional_field {
    ($name: ident, $start: ident, $end: ident) => {
        #[inline]
        pub fn $name(&self) -> Option<&str> {
            if self.components[$end] > self.components[$start] {
                Some(&self.url[self.components[$start]..self.components[$end]])
            } else {
                None
            }
        }
    };
}

// Archive locators are opaque, all of these are empty for them.
impl Locator {
    field!(host, HOST, HOST_END);
    field!(path, PATH, PATH_END);

    optional_field!(username, USERNAME, USERNAME_END);
    optional_field!(password, PASSWORD, PASSWORD_END);
    optional_field!(port, PORT, PORT_END);
    optional_field!(query, QUERY, QUERY_END);
    optional_field!(fragment, FRAGMENT, FRAGMENT_END);
}

fn is_scheme(v: &str) -> bool {
    let mut chars = v.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

impl PartialEq for Locator {
    fn eq(&self, rhs: &Self) -> bool {
        self.url == rhs.url
    }
}

impl Eq for Locator {}

impl Hash for Locator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl Borrow<str> for Locator {
    fn borrow(&self) -> &str {
        &self.url
    }
}

impl std::ops::Deref for Locator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.url
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl FromStr for Locator {
    type Err = Error;

    fn from_str(v: &str) -> Result<Self> {
        Locator::new(v)
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Locator::new(url).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn schemes() {
        assert!(is_scheme("file"));
        assert!(is_scheme("svn+ssh"));
        assert!(!is_scheme(""));
        assert!(!is_scheme("1http"));
        assert!(!is_scheme("ht tp"));
    }
}
