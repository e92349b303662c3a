use thiserror::Error;

use crate::types::RemoteMethod;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The platform answered with a non-success HTTP status.
    #[error("{method} {path} failed with status {status}: {body}")]
    Status {
        method: RemoteMethod,
        path: String,
        status: u16,
        body: String,
    },

    /// The platform answered 2xx but flagged the call with `success: false`.
    #[error("{method} {path} was rejected by the platform: {payload}")]
    Rejected {
        method: RemoteMethod,
        path: String,
        payload: serde_json::Value,
    },

    /// The direct write to the presigned storage destination failed.
    /// Never carries a platform path or a JSON payload.
    #[error("Blob storage transfer failed{}: {message}", status_suffix(.status))]
    BlobTransfer { status: Option<u16>, message: String },

    #[error("{method} {path} returned an unexpected response: {message}")]
    UnexpectedResponse {
        method: RemoteMethod,
        path: String,
        message: String,
    },

    #[error("{method} {path} could not be sent: {source}")]
    Transport {
        method: RemoteMethod,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} returned a body that is not JSON: {source}")]
    Decode {
        method: RemoteMethod,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl CampaignError {
    /// True for failures reported by the campaign platform's own API.
    pub fn is_platform_error(&self) -> bool {
        matches!(
            self,
            Self::Status { .. }
                | Self::Rejected { .. }
                | Self::UnexpectedResponse { .. }
                | Self::Transport { .. }
                | Self::Decode { .. }
        )
    }

    pub fn is_blob_transfer(&self) -> bool {
        matches!(self, Self::BlobTransfer { .. })
    }

    /// The decoded JSON payload of an application-level rejection.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Rejected { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Method and path of the platform call that failed, if any.
    pub fn call_site(&self) -> Option<(RemoteMethod, &str)> {
        match self {
            Self::Status { method, path, .. }
            | Self::Rejected { method, path, .. }
            | Self::UnexpectedResponse { method, path, .. }
            | Self::Transport { method, path, .. }
            | Self::Decode { method, path, .. } => Some((*method, path.as_str())),
            _ => None,
        }
    }
}
