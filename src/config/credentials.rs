//! Store credentials file.
//!
//! The record store is reached through a small JSON document kept next to
//! the binary (`auth.json` by default):
//!
//! ```json
//! { "Hostname": "localhost", "Port": "27017", "Username": "oag", "Password": "..." }
//! ```

use crate::error::{GatewayError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StoreCredentials {
    pub hostname: String,
    pub port: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl StoreCredentials {
    /// Read and parse the credentials file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!(
                "cannot read store credentials {}: {}",
                path.display(),
                e
            ))
        })?;

        let creds: Self = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::Config(format!(
                "malformed store credentials {}: {}",
                path.display(),
                e
            ))
        })?;

        if creds.hostname.trim().is_empty() {
            return Err(GatewayError::Config(format!(
                "store credentials {} have an empty Hostname",
                path.display()
            )));
        }

        Ok(creds)
    }

    /// Connection string without the secret; credentials are attached separately.
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.hostname, self.port)
    }

    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// Never print the password
impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_credentials() {
        let file = write_temp(
            r#"{"Hostname":"db.local","Port":"27017","Username":"oag","Password":"secret"}"#,
        );
        let creds = StoreCredentials::load(file.path()).unwrap();
        assert_eq!(creds.uri(), "mongodb://db.local:27017");
        assert!(creds.has_auth());
        assert!(!format!("{:?}", creds).contains("secret"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = StoreCredentials::load("/definitely/not/here/auth.json");
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let file = write_temp("{ not json");
        assert!(matches!(
            StoreCredentials::load(file.path()),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_anonymous_credentials() {
        let file = write_temp(r#"{"Hostname":"localhost","Port":"27017"}"#);
        let creds = StoreCredentials::load(file.path()).unwrap();
        assert!(!creds.has_auth());
    }
}
