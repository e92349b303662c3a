//! Authenticated calls to the campaign platform and direct writes to blob
//! storage.
//!
//! Every platform response passes through [`normalize_response`], so a
//! non-success status and a `success: false` body fail the same way
//! regardless of which operation issued the call. Calls are attempted once.

use async_trait::async_trait;
use bytes::Bytes;
use campaign_core::{CampaignError, CampaignResult, PlatformConfig, RemoteMethod};
use reqwest::header::{HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Transport seam every higher-level operation is written against.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Issue one authenticated platform call. `Value::Null` sends no body.
    async fn call(&self, method: RemoteMethod, path: &str, body: Value) -> CampaignResult<Value>;

    /// PUT raw bytes to an absolute, presigned storage URL. Carries no
    /// session credential.
    async fn transfer(&self, url: &str, content_type: &str, body: Bytes) -> CampaignResult<()>;
}

#[async_trait]
impl<T: RemoteCall + ?Sized> RemoteCall for Arc<T> {
    async fn call(&self, method: RemoteMethod, path: &str, body: Value) -> CampaignResult<Value> {
        (**self).call(method, path, body).await
    }

    async fn transfer(&self, url: &str, content_type: &str, body: Bytes) -> CampaignResult<()> {
        (**self).transfer(url, content_type, body).await
    }
}

/// Turns a raw platform response into its decoded payload or the error
/// that names the failing call.
pub fn normalize_response(
    method: RemoteMethod,
    path: &str,
    status: StatusCode,
    body: &str,
) -> CampaignResult<Value> {
    if !status.is_success() {
        let text = body.trim();
        let text = if text.is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            text.to_string()
        };
        return Err(CampaignError::Status {
            method,
            path: path.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    let payload = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).map_err(|source| CampaignError::Decode {
            method,
            path: path.to_string(),
            source,
        })?
    };

    if payload.get("success") == Some(&Value::Bool(false)) {
        return Err(CampaignError::Rejected {
            method,
            path: path.to_string(),
            payload,
        });
    }

    Ok(payload)
}

/// `reqwest`-backed platform client holding a fixed session cookie.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    cookie: HeaderValue,
}

impl HttpRemote {
    pub fn new(config: &PlatformConfig) -> CampaignResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CampaignError::Config(format!("failed to create HTTP client: {e}")))?;
        Self::with_client(config, client)
    }

    /// Reuse an existing `reqwest::Client` (and its connection pool).
    pub fn with_client(config: &PlatformConfig, client: reqwest::Client) -> CampaignResult<Self> {
        let config = config.clone().validated()?;
        let mut cookie = HeaderValue::from_str(&config.cookie_header())
            .map_err(|e| CampaignError::Config(format!("session cookie is not a valid header: {e}")))?;
        cookie.set_sensitive(true);

        Ok(Self {
            client,
            base_url: config.base_url,
            cookie,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RemoteCall for HttpRemote {
    async fn call(&self, method: RemoteMethod, path: &str, body: Value) -> CampaignResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, path = %path, "Calling campaign platform");

        let mut request = self
            .client
            .request(method.into(), &url)
            .header(COOKIE, self.cookie.clone());
        if !body.is_null() {
            request = request.json(&body);
        }

        let transport_err = |source| CampaignError::Transport {
            method,
            path: path.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport_err)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_err)?;

        let result = normalize_response(method, path, status, &text);
        let outcome = match &result {
            Ok(_) => "ok",
            Err(CampaignError::Rejected { .. }) => "rejected",
            Err(_) => "error",
        };
        metrics::counter!(
            "platform.remote_calls",
            "method" => method.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        if let Err(e) = &result {
            warn!(method = %method, path = %path, status = status.as_u16(), error = %e, "Campaign platform call failed");
        }
        result
    }

    async fn transfer(&self, url: &str, content_type: &str, body: Bytes) -> CampaignResult<()> {
        let size = body.len();
        debug!(bytes = size, content_type = %content_type, "Uploading archive to presigned destination");

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| CampaignError::BlobTransfer {
                status: None,
                message: e.to_string(),
            });

        let result = match response {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                let message = if text.trim().is_empty() {
                    status.canonical_reason().unwrap_or("unknown status").to_string()
                } else {
                    text.trim().to_string()
                };
                Err(CampaignError::BlobTransfer {
                    status: Some(status.as_u16()),
                    message,
                })
            }
            Err(e) => Err(e),
        };

        metrics::counter!(
            "platform.blob_transfers",
            "outcome" => if result.is_ok() { "ok" } else { "error" }
        )
        .increment(1);
        result
    }
}
