//! Endpoint model identifying one remote server instance

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// HTTP method used to issue procedure calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// Parameters in the query string
    Get,
    /// Parameters in a form-encoded body
    #[default]
    Post,
}

/// Password material sent with each request
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// Sent as the `Password` field
    Password(String),
    /// SHA-256 hex digest, sent as the `Hashedpassword` field
    Hashed(String),
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Password(_) => f.write_str("Password(***)"),
            Secret::Hashed(_) => f.write_str("Hashed(***)"),
        }
    }
}

/// User credentials for an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: Secret,
}

impl Credentials {
    /// Credentials that send the password as-is
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Password(password.into()),
        }
    }

    /// Credentials that send a SHA-256 digest of the password
    pub fn hashed(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Hashed(hash_password(password)),
        }
    }

    /// Credentials with an already computed digest
    pub fn prehashed(username: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Hashed(digest.into()),
        }
    }

    /// Request field name and value carrying the secret
    pub fn secret_field(&self) -> (&'static str, &str) {
        match &self.secret {
            Secret::Password(p) => ("Password", p),
            Secret::Hashed(h) => ("Hashedpassword", h),
        }
    }
}

/// Lowercase hex SHA-256 digest of a password
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// A remote server instance
///
/// Immutable once built; the `with_*` methods consume and return `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    use_encryption: bool,
    admin: bool,
    method: HttpMethod,
    credentials: Option<Credentials>,
}

impl Endpoint {
    /// Default HTTP port of the server
    pub const DEFAULT_PORT: u16 = 8080;

    /// Path of the JSON procedure API
    pub const API_PATH: &'static str = "/api/1.0/";

    /// Create an endpoint for a host and port (plain HTTP, POST, no credentials)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            use_encryption: false,
            admin: false,
            method: HttpMethod::default(),
            credentials: None,
        }
    }

    /// Use HTTPS instead of HTTP
    pub fn with_encryption(mut self, use_encryption: bool) -> Self {
        self.use_encryption = use_encryption;
        self
    }

    /// Send the `admin=true` flag with every request
    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn use_encryption(&self) -> bool {
        self.use_encryption
    }

    pub fn admin(&self) -> bool {
        self.admin
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Full URL of the procedure API on this endpoint
    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        let scheme = if self.use_encryption { "https" } else { "http" };
        Url::parse(&format!("{}://{}:{}", scheme, self.host, self.port))?.join(Self::API_PATH)
    }

    /// Registry key identifying this endpoint
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey {
            host: self.host.clone(),
            port: self.port,
            admin: self.admin,
            user: self.credentials.as_ref().map(|c| c.username.clone()),
        }
    }
}

/// Identity of a connection in a [`crate::ConnectionRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub host: String,
    pub port: u16,
    pub admin: bool,
    pub user: Option<String>,
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        write!(f, "{}:{}", self.host, self.port)?;
        if self.admin {
            f.write_str(" (admin)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let endpoint = Endpoint::new("db1", 8080);
        assert_eq!(endpoint.api_url().unwrap().as_str(), "http://db1:8080/api/1.0/");

        let secure = Endpoint::new("db1", 8443).with_encryption(true);
        assert_eq!(secure.api_url().unwrap().as_str(), "https://db1:8443/api/1.0/");
    }

    #[test]
    fn test_invalid_host() {
        let endpoint = Endpoint::new("bad host", 8080);
        assert!(endpoint.api_url().is_err());
    }

    #[test]
    fn test_hash_password() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_secret_field() {
        let plain = Credentials::password("admin", "secret");
        assert_eq!(plain.secret_field(), ("Password", "secret"));

        let hashed = Credentials::hashed("admin", "abc");
        let (name, value) = hashed.secret_field();
        assert_eq!(name, "Hashedpassword");
        assert_eq!(value.len(), 64);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::password("admin", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("admin"));
    }

    #[test]
    fn test_key_distinguishes_admin_and_user() {
        let plain = Endpoint::new("db1", 8080);
        let admin = Endpoint::new("db1", 8080).with_admin(true);
        let user = Endpoint::new("db1", 8080).with_credentials(Credentials::password("ops", "x"));

        assert_ne!(plain.key(), admin.key());
        assert_ne!(plain.key(), user.key());
        assert_eq!(user.key().to_string(), "ops@db1:8080");
        assert_eq!(admin.key().to_string(), "db1:8080 (admin)");
    }
}
