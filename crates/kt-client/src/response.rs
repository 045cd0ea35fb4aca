//! Response status handling and payload decoding.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::request::ResponseType;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 4096;

/// Extension trait turning non-success responses into errors.
pub trait ResponseExt: Sized {
    /// Pass 2xx responses through; read the body of anything else into an
    /// [`ErrorKind::Http`] error.
    fn error_for_kintone_status(self) -> impl std::future::Future<Output = Result<Self>> + Send;
}

impl ResponseExt for reqwest::Response {
    async fn error_for_kintone_status(self) -> Result<Self> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }

        match self.bytes().await {
            Ok(body) => Err(http_error(status.as_u16(), &body)),
            Err(err) => Err(unreadable_body_error(status.as_u16(), err)),
        }
    }
}

/// A successful response payload, read according to its [`ResponseType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Decoded JSON document.
    Json(Value),
    /// Raw bytes.
    Binary(Bytes),
}

impl ResponseBody {
    /// Read `response` as requested by `response_type`.
    pub async fn read(response: reqwest::Response, response_type: ResponseType) -> Result<Self> {
        match response_type {
            ResponseType::Json => Ok(ResponseBody::Json(response.json().await?)),
            ResponseType::Binary => Ok(ResponseBody::Binary(response.bytes().await?)),
        }
    }

    /// Deserialize the payload into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            ResponseBody::Json(value) => Ok(serde_json::from_value(value)?),
            ResponseBody::Binary(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    /// Raw payload bytes.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            ResponseBody::Json(value) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
            ResponseBody::Binary(bytes) => Ok(bytes),
        }
    }
}

/// Build the HTTP error for a failed response body.
pub(crate) fn http_error(status: u16, body: &[u8]) -> Error {
    let mut message = String::from_utf8_lossy(body).into_owned();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push_str("...[truncated]");
    }
    Error::new(ErrorKind::Http { status, message })
}

/// HTTP error for a failed response whose body could not be read.
pub(crate) fn unreadable_body_error(status: u16, err: reqwest::Error) -> Error {
    let message = format!("<error body unreadable: {err}>");
    Error::with_source(ErrorKind::Http { status, message }, err)
}
