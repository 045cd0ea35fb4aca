//! kintone authentication.
//!
//! [`Auth`] implements [`kintone_client::Credentials`]. Debug output never
//! includes passwords, tokens or certificate bytes.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kintone_client::{Credentials, HttpHeader};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Header carrying password authentication.
pub const PASSWORD_AUTH_HEADER: &str = "X-Cybozu-Authorization";

/// Header carrying one or more API tokens.
pub const API_TOKEN_HEADER: &str = "X-Cybozu-API-Token";

/// Header carrying HTTP basic authentication.
pub const BASIC_AUTH_HEADER: &str = "Authorization";

#[derive(Clone)]
struct UserPassword {
    username: String,
    password: String,
}

impl UserPassword {
    fn encoded(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }
}

/// Authentication settings for a kintone domain.
///
/// Password, API token and basic authentication can be combined. A client
/// certificate is independent of the header-based methods.
#[derive(Clone, Default)]
pub struct Auth {
    password_auth: Option<UserPassword>,
    api_tokens: Vec<String>,
    basic_auth: Option<UserPassword>,
    client_cert: Option<Vec<u8>>,
    cert_password: String,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field(
                "password_auth",
                &self.password_auth.as_ref().map(|p| p.username.as_str()),
            )
            .field(
                "api_tokens",
                &format!("[REDACTED; {}]", self.api_tokens.len()),
            )
            .field(
                "basic_auth",
                &self.basic_auth.as_ref().map(|p| p.username.as_str()),
            )
            .field("client_cert", &self.client_cert.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Auth {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate as a kintone user.
    pub fn with_password_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.password_auth = Some(UserPassword {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Add an API token. Repeated calls accumulate tokens.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.is_empty() && !self.api_tokens.contains(&token) {
            self.api_tokens.push(token);
        }
        self
    }

    /// Set HTTP basic authentication (for domains behind basic auth).
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth = Some(UserPassword {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Use an in-memory client certificate.
    pub fn with_client_cert_data(
        mut self,
        data: impl Into<Vec<u8>>,
        password: impl Into<String>,
    ) -> Self {
        self.client_cert = Some(data.into());
        self.cert_password = password.into();
        self
    }

    /// Read a client certificate from disk.
    pub fn with_client_cert_file(
        self,
        path: impl AsRef<Path>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        debug!(path = %path.display(), len = data.len(), "Loaded client certificate");
        Ok(self.with_client_cert_data(data, password))
    }

    /// API tokens configured so far.
    pub fn api_tokens(&self) -> &[String] {
        &self.api_tokens
    }

    /// Returns true if any authentication method is configured.
    pub fn is_configured(&self) -> bool {
        self.password_auth.is_some()
            || !self.api_tokens.is_empty()
            || self.basic_auth.is_some()
            || self.client_cert.is_some()
    }

    /// Load authentication from environment variables.
    ///
    /// - `KINTONE_USERNAME` / `KINTONE_PASSWORD`
    /// - `KINTONE_API_TOKEN` (comma-separated for several tokens)
    /// - `KINTONE_BASIC_USERNAME` / `KINTONE_BASIC_PASSWORD`
    /// - `KINTONE_CLIENT_CERT_PATH` / `KINTONE_CLIENT_CERT_PASSWORD`
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut auth = Self::new();

        if let Some(username) = var("KINTONE_USERNAME") {
            let password = var("KINTONE_PASSWORD")
                .ok_or_else(|| Error::new(ErrorKind::EnvVar("KINTONE_PASSWORD".to_string())))?;
            auth = auth.with_password_auth(username, password);
        }

        if let Some(tokens) = var("KINTONE_API_TOKEN") {
            for token in tokens.split(',') {
                auth = auth.with_api_token(token.trim());
            }
        }

        if let Some(username) = var("KINTONE_BASIC_USERNAME") {
            let password = var("KINTONE_BASIC_PASSWORD").ok_or_else(|| {
                Error::new(ErrorKind::EnvVar("KINTONE_BASIC_PASSWORD".to_string()))
            })?;
            auth = auth.with_basic_auth(username, password);
        }

        if let Some(path) = var("KINTONE_CLIENT_CERT_PATH") {
            let password = var("KINTONE_CLIENT_CERT_PASSWORD").unwrap_or_default();
            auth = auth.with_client_cert_file(path, password)?;
        }

        if !auth.is_configured() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "no authentication configured in environment".to_string(),
            )));
        }

        Ok(auth)
    }
}

impl Credentials for Auth {
    fn header_credentials(&self) -> Vec<HttpHeader> {
        let mut headers = Vec::new();

        if let Some(basic) = &self.basic_auth {
            headers.push(HttpHeader::new(
                BASIC_AUTH_HEADER,
                format!("Basic {}", basic.encoded()),
            ));
        }
        if let Some(password) = &self.password_auth {
            headers.push(HttpHeader::new(PASSWORD_AUTH_HEADER, password.encoded()));
        }
        if !self.api_tokens.is_empty() {
            headers.push(HttpHeader::new(API_TOKEN_HEADER, self.api_tokens.join(",")));
        }

        headers
    }

    fn client_cert_data(&self) -> Option<&[u8]> {
        self.client_cert.as_deref()
    }

    fn cert_password(&self) -> &str {
        &self.cert_password
    }
}
