//! HTTP transport for portal requests
//!
//! The portal distinguishes a successful login from a rejected one by
//! where it redirects, not by status code, so every response carries the
//! final resolved URL alongside the body. One client owns one cookie jar;
//! the portal correlates requests through it, and it must never be shared
//! across sessions or persisted.

use super::PortalError;
use std::time::Duration;
use tracing::debug;

/// Response to a single portal request, after redirects
#[derive(Debug, Clone)]
pub struct PortalResponse {
    pub status: u16,
    pub reason: String,
    /// URL the request resolved to after following redirects
    pub final_url: String,
    pub body: String,
}

/// Minimal request interface the session manager drives
///
/// `PortalClient` is the production implementation; tests substitute a
/// scripted fake to exercise the state machine deterministically.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<PortalResponse, PortalError>;

    /// POST `form` URL-encoded as the request body
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<PortalResponse, PortalError>;
}

/// reqwest-backed transport with a per-client cookie jar and timeout
pub struct PortalClient {
    client: reqwest::Client,
}

impl PortalClient {
    /// Build a client for one logical session
    ///
    /// The timeout bounds every call to the portal; the portal is an
    /// external, sometimes-unreliable service and requests must not hang
    /// indefinitely. No retries happen at this layer.
    pub fn new(timeout: Duration) -> Result<Self, PortalError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<PortalResponse, PortalError> {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("unknown").to_string();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(PortalError::Http {
                code: status.as_u16(),
                reason,
            });
        }

        let body = response.text().await?;
        Ok(PortalResponse {
            status: status.as_u16(),
            reason,
            final_url,
            body,
        })
    }
}

impl Transport for PortalClient {
    async fn get(&self, url: &str) -> Result<PortalResponse, PortalError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<PortalResponse, PortalError> {
        debug!("POST {} ({} fields)", url, form.len());
        let response = self.client.post(url).form(form).send().await?;
        Self::read(response).await
    }
}
