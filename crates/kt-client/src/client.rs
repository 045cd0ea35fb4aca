//! HTTP dispatch of assembled request descriptors.

use tracing::{debug, info};

use crate::agent::TransportAgent;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::RequestDescriptor;
use crate::response::{ResponseBody, ResponseExt};

/// A reqwest client bound to one transport agent.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    enable_tracing: bool,
}

impl HttpClient {
    /// Build a client for `agent`, validating its TLS and proxy material.
    pub fn new(agent: &TransportAgent, config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            inner: agent.build_client(config)?,
            enable_tracing: config.enable_tracing,
        })
    }

    /// Send the request and fail on non-success status codes.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<reqwest::Response> {
        let method = descriptor.method();
        let url = descriptor.url().clone();

        if self.enable_tracing {
            debug!(%method, %url, "Sending request");
        }

        let response = descriptor.into_reqwest(&self.inner).send().await?;

        if self.enable_tracing {
            let status = response.status().as_u16();
            let content_length = response.content_length();

            if response.status().is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, %method, %url, "Non-success response");
            }
        }

        response.error_for_kintone_status().await
    }

    /// Send the request and read the payload as the descriptor's
    /// [`ResponseType`](crate::ResponseType) asks.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<ResponseBody> {
        let response_type = descriptor.response_type();
        let response = self.execute(descriptor).await?;
        ResponseBody::read(response, response_type).await
    }
}
