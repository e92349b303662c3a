//! Typed operations over the platform's generic campaign and email-message
//! endpoints.
//!
//! The platform reuses `PUT /campaigns/{id}` and
//! `PUT /emailMessages/{id}/update` for unrelated changes. Each operation
//! here sends its own request shape so fields never leak between them.

use campaign_core::{
    AudienceTargeting, CampaignError, CampaignId, CampaignResult, CampaignStatus, EditorType,
    EmailMessageId, RemoteMethod, SchedulingMethod,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::remote::RemoteCall;

pub(crate) const CREATE_CAMPAIGN_PATH: &str = "/campaigns/create";

pub(crate) fn campaign_path(id: &CampaignId) -> String {
    format!("/campaigns/{id}")
}

pub(crate) fn email_message_path(id: &EmailMessageId) -> String {
    format!("/emailMessages/{id}/update")
}

// ─── Request Shapes ─────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCampaignRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<&'a str>,
}

#[derive(Serialize)]
struct IdentityUpdate<'a> {
    emoji: &'a str,
    name: &'a str,
}

/// Both keys are always sent, `null` included.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudienceUpdate<'a> {
    audience_filter: Option<&'a Value>,
    audience_segment_id: Option<&'a str>,
}

#[derive(Serialize)]
struct SchedulingUpdate {
    scheduling: Scheduling,
}

#[derive(Serialize)]
struct Scheduling {
    method: SchedulingMethod,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: CampaignStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FromNameUpdate<'a> {
    from_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FromEmailUpdate<'a> {
    from_email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyToUpdate<'a> {
    reply_to_email: &'a str,
}

#[derive(Serialize)]
struct SubjectUpdate<'a> {
    subject: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditorTypeUpdate {
    editor_type: EditorType,
}

// ─── Response Shapes ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CampaignResponse {
    campaign_id: Option<String>,
    email_message_id: Option<String>,
    campaign: Option<CampaignRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CampaignRecord {
    id: Option<String>,
    email_message_id: Option<String>,
}

fn non_empty(id: Option<String>) -> Option<String> {
    id.filter(|s| !s.trim().is_empty())
}

// ─── Operations ─────────────────────────────────────────────────────────────

/// Narrow, single-purpose mutations of platform resources.
pub struct CampaignApi<R> {
    remote: R,
    template_id: Option<String>,
}

impl<R: RemoteCall> CampaignApi<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            template_id: None,
        }
    }

    /// Mint new campaigns from this template instead of the platform default.
    pub fn with_template_id(mut self, template_id: Option<String>) -> Self {
        self.template_id = template_id;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub(crate) async fn send<B: Serialize>(
        &self,
        method: RemoteMethod,
        path: &str,
        body: &B,
    ) -> CampaignResult<Value> {
        let body = serde_json::to_value(body)?;
        self.remote.call(method, path, body).await
    }

    /// Mint a new campaign. Not idempotent: every call creates another one.
    pub async fn create_campaign(&self) -> CampaignResult<CampaignId> {
        let request = CreateCampaignRequest {
            template_id: self.template_id.as_deref(),
        };
        let payload = self
            .send(RemoteMethod::Create, CREATE_CAMPAIGN_PATH, &request)
            .await?;

        let unexpected = |message: &str| CampaignError::UnexpectedResponse {
            method: RemoteMethod::Create,
            path: CREATE_CAMPAIGN_PATH.to_string(),
            message: message.to_string(),
        };
        let response: CampaignResponse =
            serde_json::from_value(payload).map_err(|e| unexpected(&e.to_string()))?;
        let id = non_empty(response.campaign_id)
            .or_else(|| non_empty(response.campaign.and_then(|c| c.id)))
            .ok_or_else(|| unexpected("missing campaignId"))?;

        debug!(campaign_id = %id, "Campaign created");
        Ok(CampaignId::new(id))
    }

    /// Set the campaign's emoji and name. The platform creates the email
    /// message as a side effect and only discloses its id here.
    pub async fn set_identity(
        &self,
        campaign_id: &CampaignId,
        emoji: &str,
        name: &str,
    ) -> CampaignResult<EmailMessageId> {
        let path = campaign_path(campaign_id);
        let payload = self
            .send(RemoteMethod::Replace, &path, &IdentityUpdate { emoji, name })
            .await?;

        let unexpected = |message: &str| CampaignError::UnexpectedResponse {
            method: RemoteMethod::Replace,
            path: path.clone(),
            message: message.to_string(),
        };
        let response: CampaignResponse =
            serde_json::from_value(payload).map_err(|e| unexpected(&e.to_string()))?;
        let id = non_empty(response.email_message_id)
            .or_else(|| non_empty(response.campaign.and_then(|c| c.email_message_id)))
            .ok_or_else(|| unexpected("missing emailMessageId"))?;

        debug!(campaign_id = %campaign_id, email_message_id = %id, "Campaign identity set");
        Ok(EmailMessageId::new(id))
    }

    pub async fn set_audience(
        &self,
        campaign_id: &CampaignId,
        audience: &AudienceTargeting,
    ) -> CampaignResult<()> {
        let request = AudienceUpdate {
            audience_filter: audience.filter.as_ref(),
            audience_segment_id: audience.segment_id.as_deref(),
        };
        self.send(RemoteMethod::Replace, &campaign_path(campaign_id), &request)
            .await?;
        Ok(())
    }

    pub async fn set_scheduling(
        &self,
        campaign_id: &CampaignId,
        method: SchedulingMethod,
    ) -> CampaignResult<()> {
        let request = SchedulingUpdate {
            scheduling: Scheduling { method },
        };
        self.send(RemoteMethod::Replace, &campaign_path(campaign_id), &request)
            .await?;
        Ok(())
    }

    pub async fn set_status(
        &self,
        campaign_id: &CampaignId,
        status: CampaignStatus,
    ) -> CampaignResult<()> {
        self.send(
            RemoteMethod::Replace,
            &campaign_path(campaign_id),
            &StatusUpdate { status },
        )
        .await?;
        Ok(())
    }

    pub async fn set_sender_name(&self, id: &EmailMessageId, from_name: &str) -> CampaignResult<()> {
        self.send(
            RemoteMethod::Replace,
            &email_message_path(id),
            &FromNameUpdate { from_name },
        )
        .await?;
        Ok(())
    }

    /// `username` is the local part of the from address.
    pub async fn set_sender_username(&self, id: &EmailMessageId, username: &str) -> CampaignResult<()> {
        self.send(
            RemoteMethod::Replace,
            &email_message_path(id),
            &FromEmailUpdate {
                from_email: username,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn set_reply_to(&self, id: &EmailMessageId, reply_to: &str) -> CampaignResult<()> {
        self.send(
            RemoteMethod::Replace,
            &email_message_path(id),
            &ReplyToUpdate {
                reply_to_email: reply_to,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn set_subject(&self, id: &EmailMessageId, subject: &str) -> CampaignResult<()> {
        self.send(
            RemoteMethod::Replace,
            &email_message_path(id),
            &SubjectUpdate { subject },
        )
        .await?;
        Ok(())
    }

    pub async fn set_editor_type(&self, id: &EmailMessageId, editor_type: EditorType) -> CampaignResult<()> {
        self.send(
            RemoteMethod::Replace,
            &email_message_path(id),
            &EditorTypeUpdate { editor_type },
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRemote;
    use serde_json::json;
    use std::sync::Arc;

    fn api() -> (Arc<RecordingRemote>, CampaignApi<Arc<RecordingRemote>>) {
        let remote = Arc::new(RecordingRemote::new());
        (remote.clone(), CampaignApi::new(remote))
    }

    #[tokio::test]
    async fn test_create_campaign_sends_empty_body_without_template() {
        let (remote, api) = api();
        let id = api.create_campaign().await.unwrap();
        assert_eq!(id.as_str(), "cmp_1");

        let calls = remote.calls();
        assert_eq!(calls[0].label(), "POST /campaigns/create");
        assert_eq!(calls[0].body(), Some(&json!({})));
    }

    #[tokio::test]
    async fn test_create_campaign_forwards_template() {
        let (remote, api) = api();
        let api = api.with_template_id(Some("tpl_9".into()));
        api.create_campaign().await.unwrap();
        assert_eq!(remote.calls()[0].body(), Some(&json!({ "templateId": "tpl_9" })));
    }

    #[tokio::test]
    async fn test_identity_returns_email_message_id() {
        let (remote, api) = api();
        let campaign = CampaignId::new("cmp_7");
        let message = api.set_identity(&campaign, "🚀", "Launch").await.unwrap();
        assert_eq!(message.as_str(), "em_1");

        let calls = remote.calls();
        assert_eq!(calls[0].label(), "PUT /campaigns/cmp_7");
        assert_eq!(calls[0].body(), Some(&json!({ "emoji": "🚀", "name": "Launch" })));
    }

    #[tokio::test]
    async fn test_audience_forwards_both_fields_verbatim() {
        let (remote, api) = api();
        let filter = json!({ "AND": [{ "key": "plan", "operator": "equals", "value": "pro" }] });
        let audience = AudienceTargeting {
            filter: Some(filter.clone()),
            segment_id: Some("seg_42".into()),
        };
        api.set_audience(&CampaignId::new("cmp_1"), &audience).await.unwrap();
        assert_eq!(
            remote.calls()[0].body(),
            Some(&json!({ "audienceFilter": filter, "audienceSegmentId": "seg_42" }))
        );
    }

    #[tokio::test]
    async fn test_audience_sends_explicit_nulls_for_everyone() {
        let (remote, api) = api();
        api.set_audience(&CampaignId::new("cmp_1"), &AudienceTargeting::everyone())
            .await
            .unwrap();
        assert_eq!(
            remote.calls()[0].body(),
            Some(&json!({ "audienceFilter": null, "audienceSegmentId": null }))
        );
    }

    #[tokio::test]
    async fn test_message_mutators_send_one_field_each() {
        let (remote, api) = api();
        let id = EmailMessageId::new("em_3");
        api.set_sender_name(&id, "Acme").await.unwrap();
        api.set_sender_username(&id, "news").await.unwrap();
        api.set_reply_to(&id, "support@acme.test").await.unwrap();
        api.set_subject(&id, "Hi").await.unwrap();
        api.set_editor_type(&id, EditorType::Mjml).await.unwrap();

        let calls = remote.calls();
        assert!(calls.iter().all(|c| c.label() == "PUT /emailMessages/em_3/update"));
        let bodies: Vec<_> = calls.iter().filter_map(|c| c.body().cloned()).collect();
        assert_eq!(
            bodies,
            vec![
                json!({ "fromName": "Acme" }),
                json!({ "fromEmail": "news" }),
                json!({ "replyToEmail": "support@acme.test" }),
                json!({ "subject": "Hi" }),
                json!({ "editorType": "MJML" }),
            ]
        );
    }

    #[tokio::test]
    async fn test_scheduling_and_status_bodies() {
        let (remote, api) = api();
        let id = CampaignId::new("cmp_5");
        api.set_scheduling(&id, SchedulingMethod::Now).await.unwrap();
        api.set_status(&id, CampaignStatus::Scheduled).await.unwrap();

        let bodies: Vec<_> = remote.calls().iter().filter_map(|c| c.body().cloned()).collect();
        assert_eq!(
            bodies,
            vec![
                json!({ "scheduling": { "method": "now" } }),
                json!({ "status": "Scheduled" }),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_identifier_is_unexpected_response() {
        struct Silent;

        #[async_trait::async_trait]
        impl RemoteCall for Silent {
            async fn call(&self, _: RemoteMethod, _: &str, _: Value) -> CampaignResult<Value> {
                Ok(json!({ "success": true, "campaignId": "" }))
            }
            async fn transfer(&self, _: &str, _: &str, _: bytes::Bytes) -> CampaignResult<()> {
                Ok(())
            }
        }

        let api = CampaignApi::new(Silent);
        let err = api.create_campaign().await.unwrap_err();
        assert!(matches!(err, CampaignError::UnexpectedResponse { .. }));
        assert_eq!(err.call_site(), Some((RemoteMethod::Create, "/campaigns/create")));

        let err = api
            .set_identity(&CampaignId::new("cmp_1"), "X", "Test")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing emailMessageId"));
    }

    #[tokio::test]
    async fn test_nested_identifiers_are_accepted() {
        struct Nested;

        #[async_trait::async_trait]
        impl RemoteCall for Nested {
            async fn call(&self, _: RemoteMethod, path: &str, _: Value) -> CampaignResult<Value> {
                if path == CREATE_CAMPAIGN_PATH {
                    Ok(json!({ "campaign": { "id": "cmp_nested" } }))
                } else {
                    Ok(json!({ "campaign": { "id": "cmp_nested", "emailMessageId": "em_nested" } }))
                }
            }
            async fn transfer(&self, _: &str, _: &str, _: bytes::Bytes) -> CampaignResult<()> {
                Ok(())
            }
        }

        let api = CampaignApi::new(Nested);
        let campaign = api.create_campaign().await.unwrap();
        assert_eq!(campaign.as_str(), "cmp_nested");
        let message = api.set_identity(&campaign, "X", "Test").await.unwrap();
        assert_eq!(message.as_str(), "em_nested");
    }

    #[tokio::test]
    async fn test_platform_failure_propagates_unchanged() {
        let remote = RecordingRemote::new().failing_when(|_, path, _| path.starts_with("/campaigns/cmp"));
        let api = CampaignApi::new(remote);
        let err = api
            .set_status(&CampaignId::new("cmp_1"), CampaignStatus::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::Status { status: 500, .. }));
    }
}
