//! # kintone-client
//!
//! Core HTTP transport for the kintone REST API.
//!
//! This crate assembles and executes requests for callers that already know
//! the API name and payload shape:
//! - Credential headers merged with caller headers (`User-Agent` accumulates)
//! - GET bodies encoded as bracketed query strings, other bodies as JSON
//! - Client certificates and HTTP/HTTPS proxy tunnels
//! - Binary file transfer with a single normalized error type
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Connection                               │
//! │  - Credentials + persistent headers                         │
//! │  - Active TransportAgent (cert / proxy / proxy + cert)      │
//! │  - request (JSON, raw errors) / request_file (bytes,        │
//! │    ApiError) / upload / download                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  RequestDescriptor (per call)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HttpClient                               │
//! │  - reqwest client built (and validated) from the agent      │
//! │  - Status checking, tracing                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use kintone_client::{Connection, ProxyConfig};
//! use kintone_auth::Auth;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = Auth::new().with_api_token("token");
//!     let mut conn = Connection::new("example.cybozu.com", auth)?;
//!     conn.set_proxy(&ProxyConfig::new("proxy.local", 3128));
//!
//!     let record: serde_json::Value = conn
//!         .request("GET", "RECORD", &serde_json::json!({"app": 1, "id": 1}))
//!         .await?;
//!
//!     let upload = conn.upload("report.csv", b"a,b\n1,2\n".to_vec()).await?;
//!     Ok(())
//! }
//! ```

mod agent;
mod client;
mod config;
mod connection;
mod credentials;
mod error;
mod header;
mod query;
mod request;
mod response;

pub use agent::{ClientCert, ProxyAgent, TransportAgent};
pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder, ProxyConfig};
pub use connection::{Connection, FILE_API, FILE_FIELD_NAME};
pub use credentials::{Credentials, StaticCredentials};
pub use error::{ApiError, Error, ErrorKind, ErrorResponse, Result};
pub use header::{merge_headers, HttpHeader, USER_AGENT_HEADER};
pub use query::serialize_params;
pub use request::{
    file_form, multipart_content_type, RequestBody, RequestDescriptor, RequestMethod,
    ResponseType,
};
pub use response::{ResponseBody, ResponseExt};

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("kintone-api-rs/", env!("CARGO_PKG_VERSION"));
