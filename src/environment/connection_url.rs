//! Connection string grammar.
//!
//! Hosting platforms hand out one URL per dependency:
//!
//! ```text
//! scheme://[user[:password]@]host[:port][/name][?query]
//! ```
//!
//! The host is mandatory; everything else is optional. The query string is
//! accepted and ignored. Userinfo and path are percent-decoded, so a
//! password containing `@`, `/` or `:` arrives in its encoded form.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Everything but RFC 3986 unreserved characters.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The parts of a parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUrl {
    pub scheme: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    /// Path without the leading slash. `None` when absent or empty.
    pub path: Option<String>,
}

impl ConnectionUrl {
    /// Parse a connection string. The error is a human-readable reason.
    pub fn parse(input: &str) -> Result<Self, String> {
        let url = Url::parse(input.trim()).map_err(|e| {
            format!(
                "{} (expected scheme://[user[:password]@]host[:port][/name])",
                e
            )
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "connection string has no host".to_string())?
            .to_string();

        let path = url.path().trim_start_matches('/');
        let path = if path.is_empty() {
            None
        } else {
            Some(decode(path)?)
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            user: non_empty(url.username()).map(decode).transpose()?,
            password: url.password().and_then(non_empty).map(decode).transpose()?,
            host,
            port: url.port(),
            path,
        })
    }

    /// Fail unless the scheme is one of `accepted`.
    pub fn require_scheme(&self, accepted: &[&str]) -> Result<(), String> {
        if accepted.contains(&self.scheme.as_str()) {
            Ok(())
        } else {
            Err(format!(
                "scheme '{}' is not one of: {}",
                self.scheme,
                accepted.join(", ")
            ))
        }
    }
}

/// Percent-encode a username or password for embedding in a URL.
pub fn encode_userinfo(value: &str) -> String {
    utf8_percent_encode(value, USERINFO).to_string()
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn decode(value: &str) -> Result<String, String> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|_| format!("'{}' is not valid UTF-8 once decoded", value))
}
