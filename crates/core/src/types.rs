use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Verb of a campaign-platform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteMethod {
    Read,
    Create,
    Replace,
    Delete,
}

impl RemoteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "GET",
            Self::Create => "POST",
            Self::Replace => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RemoteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RemoteMethod> for reqwest::Method {
    fn from(method: RemoteMethod) -> Self {
        match method {
            RemoteMethod::Read => reqwest::Method::GET,
            RemoteMethod::Create => reqwest::Method::POST,
            RemoteMethod::Replace => reqwest::Method::PUT,
            RemoteMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

// ─── Identifiers ────────────────────────────────────────────────────────────

/// Identifier of a campaign, minted by the platform on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

/// Identifier of a campaign's email message. Only disclosed by the
/// platform once the campaign's identity has been set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailMessageId(String);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(CampaignId);
opaque_id!(EmailMessageId);

// ─── Campaign Input ─────────────────────────────────────────────────────────

/// Sender fields applied to the email message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderIdentity {
    pub from_name: String,
    /// Local part only; the domain is fixed by the platform account.
    pub from_email_username: String,
    pub reply_to_email: String,
}

/// Who receives the campaign. Both fields are forwarded as-is; the
/// platform decides precedence when both are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudienceTargeting {
    pub filter: Option<serde_json::Value>,
    pub segment_id: Option<String>,
}

impl AudienceTargeting {
    /// Targets the entire audience.
    pub fn everyone() -> Self {
        Self::default()
    }
}

pub const DEFAULT_ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Zip archive holding `index.mjml` and the assets it references.
#[derive(Debug, Clone)]
pub struct MjmlArchive {
    bytes: Bytes,
    content_type: String,
}

impl MjmlArchive {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: DEFAULT_ARCHIVE_CONTENT_TYPE.to_string(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Reads an archive already built on disk.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(bytes))
    }

    /// Cheap clone of the archive body.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything needed to provision one campaign.
#[derive(Debug, Clone)]
pub struct CampaignDraft {
    pub emoji: String,
    pub name: String,
    pub sender: SenderIdentity,
    pub subject: String,
    pub audience: AudienceTargeting,
    pub archive: MjmlArchive,
}

// ─── Platform Values ────────────────────────────────────────────────────────

/// Single-use upload destination issued for one email message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// Server-assigned object name, echoed back on confirmation.
    pub filename: String,
    pub presigned_url: String,
}

/// Content editor mode of an email message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorType {
    #[serde(rename = "MJML")]
    Mjml,
}

/// Campaign lifecycle status as the platform names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sent,
}

/// When a scheduled campaign goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMethod {
    Now,
}

// ─── Workflow ───────────────────────────────────────────────────────────────

/// Furthest point a provisioning run has reached. Runs only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvisioningStage {
    #[default]
    Absent,
    Created,
    IdentitySet,
    ContentSet,
    AudienceSet,
    SchedulingSet,
    Scheduled,
}

impl ProvisioningStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Created => "created",
            Self::IdentitySet => "identity-set",
            Self::ContentSet => "content-set",
            Self::AudienceSet => "audience-set",
            Self::SchedulingSet => "scheduling-set",
            Self::Scheduled => "scheduled",
        }
    }

    /// No operations are issued once a campaign is scheduled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scheduled)
    }
}

impl fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a completed provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningReport {
    pub run_id: Uuid,
    pub campaign_id: CampaignId,
    pub email_message_id: EmailMessageId,
    pub stage: ProvisioningStage,
    /// Calls issued to the platform API, excluding the blob transfer.
    pub platform_calls: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
