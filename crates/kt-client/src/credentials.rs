//! The credential source a [`Connection`](crate::Connection) draws on.

use crate::header::HttpHeader;

/// Supplier of authentication headers and client-certificate material.
///
/// Implemented by `kintone-auth`; anything else that can produce headers
/// (a token cache, a test double) works as well.
pub trait Credentials: Send + Sync {
    /// Headers carrying the credentials, in the order they should be applied.
    fn header_credentials(&self) -> Vec<HttpHeader>;

    /// PKCS#12 client certificate bytes, if client-certificate auth is used.
    fn client_cert_data(&self) -> Option<&[u8]> {
        None
    }

    /// Passphrase protecting [`client_cert_data`](Self::client_cert_data).
    fn cert_password(&self) -> &str {
        ""
    }
}

/// Header-only credentials, mostly useful for tests and pre-signed headers.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    headers: Vec<HttpHeader>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.headers.iter().map(HttpHeader::key).collect();
        f.debug_struct("StaticCredentials")
            .field("header_keys", &keys)
            .finish()
    }
}

impl StaticCredentials {
    /// Create credentials that emit exactly `headers`.
    pub fn new(headers: Vec<HttpHeader>) -> Self {
        Self { headers }
    }
}

impl Credentials for StaticCredentials {
    fn header_credentials(&self) -> Vec<HttpHeader> {
        self.headers.clone()
    }
}
