//! The seam between [`crate::RateLimitAwareClient`] and the network.

use crate::http::error::TransportFailure;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;

/// Status and decoded body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues exactly one GET request. No retries, no pacing.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawResponse, TransportFailure>> + Send;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<RawResponse, TransportFailure> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await?;
        let status = response.status();
        // Decodes with the charset from Content-Type; AEMET serves ISO-8859-15.
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
