//! # kintone-api
//!
//! kintone REST API transport for Rust.
//!
//! ## Security
//!
//! - Passwords, tokens, proxy passwords and certificate bytes are redacted in
//!   Debug output
//! - Tracing/logging skips credential parameters
//! - Error messages never include credential values
//!
//! ## Crates
//!
//! - **kintone-client** - Connection, header merging, proxy and client
//!   certificate transport, JSON and file requests
//! - **kintone-auth** - Password, API token, basic and certificate authentication
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kintone_api::{Auth, Connection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = Auth::from_env()?;
//!     let conn = Connection::new("example.cybozu.com", auth)?;
//!
//!     let records: serde_json::Value = conn
//!         .request("GET", "RECORDS", &serde_json::json!({"app": 1, "fields": ["$id"]}))
//!         .await?;
//!     println!("{records}");
//!
//!     let file_key = conn.upload("notes.txt", b"hello".to_vec()).await?;
//!     println!("{}", String::from_utf8_lossy(&file_key));
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "auth")]
pub use kintone_auth as auth;
#[cfg(feature = "client")]
pub use kintone_client as client;

// Re-export commonly used types at the top level
#[cfg(feature = "auth")]
pub use kintone_auth::Auth;
#[cfg(feature = "client")]
pub use kintone_client::{
    ApiError, ClientConfig, Connection, Credentials, HttpHeader, ProxyConfig, TransportAgent,
};
