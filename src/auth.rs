//! Credentials for the ClickHouse HTTP interface.
//!
//! ClickHouse accepts the user and password as two plain request headers,
//! attached to every request the client sends.

use crate::error::{ClickHouseLinkError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;

pub const USER_HEADER: &str = "X-ClickHouse-User";
pub const KEY_HEADER: &str = "X-ClickHouse-Key";

/// User/password pair sent as `X-ClickHouse-User` / `X-ClickHouse-Key`.
///
/// # Examples
///
/// ```rust
/// use clickhouse_link::Credentials;
///
/// // The server's built-in account with no password
/// let creds = Credentials::default();
/// assert_eq!(creds.user(), "default");
///
/// let creds = Credentials::new("alice", "secret123");
/// assert_eq!(format!("{:?}", creds), "Credentials { user: \"alice\", password: \"***\" }");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Build the two authentication headers.
    ///
    /// Fails if the user or password contains bytes that are not valid in an
    /// HTTP header value.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(2);
        self.apply_to_headers(&mut headers)?;
        Ok(headers)
    }

    /// Insert the authentication headers into an existing map
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(
            HeaderName::from_static("x-clickhouse-user"),
            header_value("user", &self.user)?,
        );
        let mut key = header_value("password", &self.password)?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-clickhouse-key"), key);
        Ok(())
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("default", "")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        ClickHouseLinkError::ConfigurationError(format!(
            "{} contains characters that cannot be sent in an HTTP header",
            what
        ))
    })
}
