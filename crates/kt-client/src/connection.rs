//! Connection to one kintone domain.
//!
//! A [`Connection`] owns the per-instance configuration: base URL, guest
//! space, persistent headers, credentials and the active transport agent.
//! Each call merges headers and assembles a fresh [`RequestDescriptor`], so
//! nothing a call does is visible to any other call.
//!
//! Two request flavors exist:
//!
//! - [`Connection::request`] exchanges JSON and surfaces the raw [`Error`](crate::Error).
//! - [`Connection::request_file`] transfers bytes and wraps every failure
//!   in [`ApiError`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::agent::TransportAgent;
use crate::client::HttpClient;
use crate::config::{ClientConfig, ProxyConfig};
use crate::credentials::Credentials;
use crate::error::{ApiError, Error, ErrorKind, Result};
use crate::header::{merge_headers, HttpHeader, USER_AGENT_HEADER};
use crate::request::{
    content_type_header, file_form, multipart_content_type, RequestBody, RequestDescriptor,
    RequestMethod, ResponseType,
};

/// Logical API name of the file endpoint.
pub const FILE_API: &str = "FILE";

/// Multipart field name carrying uploaded file content.
pub const FILE_FIELD_NAME: &str = "file";

/// Logical API names and the path segment each resolves to.
const API_PATHS: &[(&str, &str)] = &[
    ("RECORD", "record"),
    ("RECORDS", "records"),
    ("RECORD_COMMENT", "record/comment"),
    ("RECORD_COMMENTS", "record/comments"),
    ("RECORD_STATUS", "record/status"),
    ("RECORDS_STATUS", "records/status"),
    ("RECORD_ASSIGNEES", "record/assignees"),
    ("RECORD_CURSOR", "records/cursor"),
    ("BULK_REQUEST", "bulkRequest"),
    ("FILE", "file"),
    ("APP", "app"),
    ("APPS", "apps"),
    ("FORM", "form"),
    ("APP_SETTINGS", "app/settings"),
    ("APP_FIELDS", "app/form/fields"),
    ("APP_LAYOUT", "app/form/layout"),
    ("APP_VIEWS", "app/views"),
    ("APP_ACL", "app/acl"),
    ("RECORD_ACL", "record/acl"),
    ("FIELD_ACL", "field/acl"),
    ("APP_STATUS", "app/status"),
    ("APP_PREVIEW", "preview/app"),
    ("APP_DEPLOY", "preview/app/deploy"),
    ("SPACE", "space"),
    ("SPACE_BODY", "space/body"),
    ("SPACE_MEMBERS", "space/members"),
    ("SPACE_THREAD", "space/thread"),
    ("SPACE_TEMPLATE", "template/space"),
    ("GUEST_SPACE", "space/guest"),
    ("GUESTS", "guests"),
];

/// Connection to a kintone domain.
pub struct Connection {
    base_url: Url,
    guest_space_id: Option<u64>,
    credentials: Arc<dyn Credentials>,
    headers: Vec<HttpHeader>,
    config: ClientConfig,
    agent: TransportAgent,
    client: Mutex<Option<HttpClient>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_keys: Vec<&str> = self.headers.iter().map(HttpHeader::key).collect();
        f.debug_struct("Connection")
            .field("base_url", &self.base_url.as_str())
            .field("guest_space_id", &self.guest_space_id)
            .field("header_keys", &header_keys)
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Connect to `https://{domain}` with default configuration.
    pub fn new(domain: &str, credentials: impl Credentials + 'static) -> Result<Self> {
        Self::with_config(domain, credentials, ClientConfig::default())
    }

    /// Connect to `https://{domain}` with custom configuration.
    ///
    /// If the credentials carry a client certificate, the certificate agent is
    /// activated immediately.
    pub fn with_config(
        domain: &str,
        credentials: impl Credentials + 'static,
        config: ClientConfig,
    ) -> Result<Self> {
        let domain = domain.trim().trim_end_matches('/');
        let base_url = Url::parse(&format!("https://{domain}"))?;

        let mut connection = Self {
            base_url,
            guest_space_id: None,
            credentials: Arc::new(credentials),
            headers: Vec::new(),
            config,
            agent: TransportAgent::None,
            client: Mutex::new(None),
        };
        connection.refresh_header().set_client_cert();
        Ok(connection)
    }

    /// Replace the base URL, e.g. for an on-premise proxy front end.
    ///
    /// A path on the base URL is kept as a prefix: with
    /// `https://gateway.local/kintone`, `RECORD` resolves to
    /// `https://gateway.local/kintone/k/v1/record.json`. Query and fragment
    /// are dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url)?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(Error::new(ErrorKind::InvalidUrl(format!(
                "base URL needs a host: {base_url}"
            ))));
        }
        url.set_query(None);
        url.set_fragment(None);
        self.base_url = url;
        Ok(self)
    }

    /// Route every request into a guest space.
    pub fn with_guest_space_id(mut self, guest_space_id: u64) -> Self {
        self.guest_space_id = Some(guest_space_id);
        self
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Guest space id, if any.
    pub fn guest_space_id(&self) -> Option<u64> {
        self.guest_space_id
    }

    /// Active transport agent.
    pub fn agent(&self) -> &TransportAgent {
        &self.agent
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =========================================================================
    // Headers
    // =========================================================================

    /// Add a base header sent with every request until
    /// [`refresh_header`](Self::refresh_header) is called.
    ///
    /// Repeated `User-Agent` entries accumulate; any other key is overwritten
    /// by its latest entry when headers are merged. Headers for a single call
    /// go through [`request_with_headers`](Self::request_with_headers) or
    /// [`request_file_with_headers`](Self::request_file_with_headers).
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push(HttpHeader::new(key, value));
        self
    }

    /// Drop every header added with [`set_header`](Self::set_header),
    /// leaving only the configured `User-Agent`.
    pub fn refresh_header(&mut self) -> &mut Self {
        self.headers = vec![HttpHeader::new(
            USER_AGENT_HEADER,
            self.config.user_agent.clone(),
        )];
        self
    }

    /// Persistent headers, in insertion order.
    pub fn headers(&self) -> &[HttpHeader] {
        &self.headers
    }

    /// The `User-Agent` value requests currently carry.
    pub fn user_agent(&self) -> Option<String> {
        self.merged_headers(&[]).remove(USER_AGENT_HEADER)
    }

    fn merged_headers(&self, overlay: &[HttpHeader]) -> HashMap<String, String> {
        let credentials = self.credentials.header_credentials();
        merge_headers(&credentials, self.headers.iter().chain(overlay))
    }

    // =========================================================================
    // Transport agents
    // =========================================================================

    /// Present the credentials' client certificate on direct connections.
    ///
    /// Does nothing if the credentials carry no certificate.
    pub fn set_client_cert(&mut self) -> &mut Self {
        if let Some(agent) = TransportAgent::client_cert(self.credentials.as_ref()) {
            self.replace_agent(agent);
        }
        self
    }

    /// Tunnel through an HTTP proxy.
    pub fn set_proxy(&mut self, proxy: &ProxyConfig) -> &mut Self {
        let agent = TransportAgent::plain_proxy(proxy, self.credentials.as_ref());
        self.replace_agent(agent);
        self
    }

    /// Tunnel through an HTTPS proxy.
    pub fn set_https_proxy(&mut self, proxy: &ProxyConfig) -> &mut Self {
        let agent = TransportAgent::secure_proxy(proxy, self.credentials.as_ref());
        self.replace_agent(agent);
        self
    }

    fn replace_agent(&mut self, agent: TransportAgent) {
        if self.config.enable_tracing {
            debug!(
                proxy = agent.proxy_url().as_deref(),
                client_cert = agent.cert().is_some(),
                "Transport agent configured"
            );
        }
        self.agent = agent;
        *self.client.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
    }

    // =========================================================================
    // Request assembly
    // =========================================================================

    /// Resolve a logical API name to its absolute URL.
    ///
    /// Known names map through a fixed table, unknown names are lower-cased,
    /// and names starting with `/` are used as paths under the base URL.
    /// The result always stays on the base URL's scheme, host and port.
    pub fn uri(&self, api_name: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();

        if api_name.starts_with('/') {
            url.set_path(&format!("{prefix}{api_name}"));
            return Ok(url);
        }

        let segment = API_PATHS
            .iter()
            .find(|(name, _)| *name == api_name)
            .map(|(_, segment)| (*segment).to_string())
            .unwrap_or_else(|| api_name.to_ascii_lowercase());

        let path = match self.guest_space_id {
            Some(id) => format!("{prefix}/k/guest/{id}/v1/{segment}.json"),
            None => format!("{prefix}/k/v1/{segment}.json"),
        };
        url.set_path(&path);
        Ok(url)
    }

    /// Assemble the descriptor for one call.
    ///
    /// `overlay` headers apply to this call only.
    pub fn assemble_request(
        &self,
        method: &str,
        api_name: &str,
        body: RequestBody,
        response_type: ResponseType,
        overlay: &[HttpHeader],
    ) -> Result<RequestDescriptor> {
        let method: RequestMethod = method.parse()?;
        let url = self.uri(api_name)?;
        let headers = self.merged_headers(overlay);

        RequestDescriptor::new(
            method,
            url,
            headers,
            body,
            response_type,
            self.agent.clone(),
        )
    }

    /// Build (or reuse) the client for the descriptor's agent.
    ///
    /// Certificate and proxy material is validated here, before anything is
    /// sent. A failed build is not cached.
    pub fn preflight(&self, descriptor: &RequestDescriptor) -> Result<HttpClient> {
        let mut cached = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = cached.as_ref() {
            return Ok(client.clone());
        }

        let client = HttpClient::new(descriptor.agent(), &self.config).inspect_err(|err| {
            if self.config.enable_tracing {
                warn!(error = %err, "Transport preflight failed");
            }
        })?;
        *cached = Some(client.clone());
        Ok(client)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// JSON request to a logical API.
    ///
    /// GET sends `body` as query parameters; other methods send it as the JSON
    /// payload. Failures are returned as-is.
    pub async fn request<T, B>(&self, method: &str, api_name: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with_headers(method, api_name, body, &[]).await
    }

    /// [`request`](Self::request) with extra headers for this call only.
    #[instrument(skip(self, body, headers), fields(api = %api_name))]
    pub async fn request_with_headers<T, B>(
        &self,
        method: &str,
        api_name: &str,
        body: &B,
        headers: &[HttpHeader],
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let descriptor = self.assemble_request(
            method,
            api_name,
            RequestBody::Json(body),
            ResponseType::Json,
            headers,
        )?;
        let client = self.preflight(&descriptor)?;
        client.send(descriptor).await?.into_json()
    }

    /// Binary request to a logical API.
    ///
    /// Returns the raw response bytes. Every failure, including TLS preflight,
    /// is wrapped in [`ApiError`].
    pub async fn request_file(
        &self,
        method: &str,
        api_name: &str,
        body: impl Into<RequestBody>,
    ) -> std::result::Result<Bytes, ApiError> {
        self.execute_file(method, api_name, body.into(), &[]).await
    }

    /// [`request_file`](Self::request_file) with extra headers for this call only.
    pub async fn request_file_with_headers(
        &self,
        method: &str,
        api_name: &str,
        body: impl Into<RequestBody>,
        headers: &[HttpHeader],
    ) -> std::result::Result<Bytes, ApiError> {
        self.execute_file(method, api_name, body.into(), headers).await
    }

    #[instrument(skip(self, body, overlay), fields(api = %api_name))]
    async fn execute_file(
        &self,
        method: &str,
        api_name: &str,
        body: RequestBody,
        overlay: &[HttpHeader],
    ) -> std::result::Result<Bytes, ApiError> {
        let descriptor =
            self.assemble_request(method, api_name, body, ResponseType::Binary, overlay)?;
        let client = self.preflight(&descriptor)?;
        Ok(client.send(descriptor).await?.into_bytes()?)
    }

    /// Upload a file, returning the raw response (a JSON `{"fileKey": ...}`).
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> std::result::Result<Bytes, ApiError> {
        let form = file_form(FILE_FIELD_NAME, file_name, content)?;
        let overlay = [content_type_header(multipart_content_type(&form))];
        self.execute_file("POST", FILE_API, RequestBody::Multipart(form), &overlay)
            .await
    }

    /// Download the file identified by `file_key`.
    #[instrument(skip(self))]
    pub async fn download(&self, file_key: &str) -> std::result::Result<Bytes, ApiError> {
        let params = serde_json::json!({ "fileKey": file_key });
        self.request_file("GET", FILE_API, params).await
    }
}
