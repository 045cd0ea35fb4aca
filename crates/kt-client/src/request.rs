//! Per-call request descriptors.
//!
//! A [`RequestDescriptor`] is assembled fresh for every call and consumed by
//! dispatch. GET descriptors carry their body in the query slot; every other
//! method carries it in the payload slot. The two slots are never both set.

use std::collections::HashMap;
use std::str::FromStr;

use reqwest::multipart::Form;
use serde_json::Value;
use url::Url;

use crate::agent::TransportAgent;
use crate::error::{Error, ErrorKind, Result};
use crate::header::HttpHeader;
use crate::query::serialize_params;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
    Head,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
            RequestMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Head => "HEAD",
        }
    }
}

impl FromStr for RequestMethod {
    type Err = Error;

    /// Case-insensitive parse.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PATCH" => Ok(RequestMethod::Patch),
            "PUT" => Ok(RequestMethod::Put),
            "DELETE" => Ok(RequestMethod::Delete),
            "HEAD" => Ok(RequestMethod::Head),
            _ => Err(Error::new(ErrorKind::InvalidMethod(s.to_string()))),
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body content.
#[derive(Debug)]
pub enum RequestBody {
    /// Structured data: JSON payload, or query parameters for GET.
    Json(Value),
    /// Multipart form (file upload).
    Multipart(Form),
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Form> for RequestBody {
    fn from(form: Form) -> Self {
        RequestBody::Multipart(form)
    }
}

/// How the response body should be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Decode as JSON.
    #[default]
    Json,
    /// Return the raw bytes.
    Binary,
}

/// Everything needed to dispatch one request.
#[derive(Debug)]
pub struct RequestDescriptor {
    pub(crate) method: RequestMethod,
    pub(crate) url: Url,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) params: Option<Value>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) response_type: ResponseType,
    pub(crate) agent: TransportAgent,
}

impl RequestDescriptor {
    /// Assemble a descriptor, routing `body` by method.
    ///
    /// A GET moves a JSON body into the query slot; a multipart body cannot be
    /// sent with GET and is rejected.
    pub fn new(
        method: RequestMethod,
        url: Url,
        headers: HashMap<String, String>,
        body: RequestBody,
        response_type: ResponseType,
        agent: TransportAgent,
    ) -> Result<Self> {
        let (params, body) = match (method, body) {
            (RequestMethod::Get, RequestBody::Json(value)) => (Some(value), None),
            (RequestMethod::Get, RequestBody::Multipart(_)) => {
                return Err(Error::new(ErrorKind::Config(
                    "multipart body cannot be sent with GET".to_string(),
                )));
            }
            (_, body) => (None, Some(body)),
        };

        Ok(Self {
            method,
            url,
            headers,
            params,
            body,
            response_type,
            agent,
        })
    }

    /// Normalized method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Resolved absolute URL, without the query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Merged request headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Query parameters (GET only).
    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// Payload body (non-GET only).
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Response decoding hint.
    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Transport agent this request will be sent through.
    pub fn agent(&self) -> &TransportAgent {
        &self.agent
    }

    /// URL including the serialized query string.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if let Some(params) = &self.params {
            let query = serialize_params(params);
            if !query.is_empty() {
                url.set_query(Some(&query));
            }
        }
        url
    }

    /// Turn the descriptor into a reqwest request on `client`.
    pub(crate) fn into_reqwest(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let url = self.full_url();
        let multipart = matches!(self.body, Some(RequestBody::Multipart(_)));
        let mut req = client.request(self.method.to_reqwest(), url);

        for (name, value) in &self.headers {
            // reqwest writes the multipart content type (same boundary) itself
            if multipart && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            req = req.header(name.as_str(), value.as_str());
        }

        match self.body {
            Some(RequestBody::Json(value)) => req.json(&value),
            Some(RequestBody::Multipart(form)) => req.multipart(form),
            None => req,
        }
    }
}

/// Build a single-part multipart form holding `content` under `field`.
///
/// The part's MIME type is guessed from `file_name`.
pub fn file_form(field: &str, file_name: &str, content: Vec<u8>) -> Result<Form> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    let part = reqwest::multipart::Part::bytes(content)
        .file_name(file_name.to_string())
        .mime_str(mime.essence_str())?;
    Ok(Form::new().part(field.to_string(), part))
}

/// `Content-Type` value announcing `form`'s boundary.
pub fn multipart_content_type(form: &Form) -> String {
    format!("multipart/form-data; boundary={}", form.boundary())
}

/// Convenience for building overlay headers.
pub(crate) fn content_type_header(value: String) -> HttpHeader {
    HttpHeader::new("Content-Type", value)
}
