//! # kintone-auth
//!
//! Authentication for the kintone REST API.
//!
//! ## Security
//!
//! - Passwords, tokens and certificate bytes are redacted in Debug output
//! - Error messages never include credential values
//!
//! ## Supported Authentication Methods
//!
//! - **Password authentication** (`X-Cybozu-Authorization`)
//! - **API tokens** (`X-Cybozu-API-Token`, several tokens comma-joined)
//! - **HTTP basic authentication** for domains behind a basic-auth gate
//! - **Client certificates** from memory or from a file
//!
//! ## Example
//!
//! ```rust,ignore
//! use kintone_auth::Auth;
//!
//! // From environment variables
//! let auth = Auth::from_env()?;
//!
//! // Explicit
//! let auth = Auth::new()
//!     .with_api_token("token-for-app-1")
//!     .with_api_token("token-for-app-2")
//!     .with_client_cert_file("client.pfx", "passphrase")?;
//! ```

mod auth;
mod error;

pub use auth::{Auth, API_TOKEN_HEADER, BASIC_AUTH_HEADER, PASSWORD_AUTH_HEADER};
pub use error::{Error, ErrorKind, Result};
pub use kintone_client::Credentials;
