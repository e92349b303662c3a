//! Provisioning workflow as a chain of stage types.
//!
//! Each stage owns exactly the identifiers earned so far and each step
//! consumes the stage before it, so steps cannot be reordered or skipped:
//! only [`IdentitySet`] holds an [`EmailMessageId`], and only
//! [`AudienceSet`] can move on to scheduling.

use campaign_core::{
    AudienceTargeting, CampaignError, CampaignId, CampaignResult, CampaignStatus,
    EmailMessageId, MjmlArchive, ProvisioningReport, ProvisioningStage, SchedulingMethod,
    SenderIdentity,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::mutators::CampaignApi;
use crate::remote::RemoteCall;
use crate::upload::UPLOAD_PLATFORM_CALLS;

/// Bookkeeping shared by every stage of one run.
struct Run<'a, R> {
    api: &'a CampaignApi<R>,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    platform_calls: usize,
}

impl<R> Run<'_, R> {
    fn aborted(&self, stage: ProvisioningStage, campaign_id: Option<&CampaignId>, err: &CampaignError) {
        warn!(
            run_id = %self.run_id,
            stage = %stage,
            campaign_id = campaign_id.map(CampaignId::as_str).unwrap_or("-"),
            error = %err,
            "Campaign provisioning aborted; remote state left as is"
        );
    }

    fn report(
        &self,
        stage: ProvisioningStage,
        campaign_id: &CampaignId,
        email_message_id: &EmailMessageId,
    ) -> ProvisioningReport {
        ProvisioningReport {
            run_id: self.run_id,
            campaign_id: campaign_id.clone(),
            email_message_id: email_message_id.clone(),
            stage,
            platform_calls: self.platform_calls,
            started_at: self.started_at,
            completed_at: Utc::now(),
        }
    }
}

/// Campaign exists; nothing configured yet.
pub struct Created<'a, R> {
    run: Run<'a, R>,
    campaign_id: CampaignId,
}

/// Identity set; the email message id is known.
pub struct IdentitySet<'a, R> {
    run: Run<'a, R>,
    campaign_id: CampaignId,
    email_message_id: EmailMessageId,
}

/// Sender fields and subject applied. Still `identity-set` on the platform.
pub struct MessageAddressed<'a, R> {
    run: Run<'a, R>,
    campaign_id: CampaignId,
    email_message_id: EmailMessageId,
}

/// MJML content bound to the email message.
pub struct ContentSet<'a, R> {
    run: Run<'a, R>,
    campaign_id: CampaignId,
    email_message_id: EmailMessageId,
}

/// Audience applied. A fully provisioned, unsent campaign.
pub struct AudienceSet<'a, R> {
    run: Run<'a, R>,
    campaign_id: CampaignId,
    email_message_id: EmailMessageId,
}

/// Immediate sending requested but status not yet `Scheduled`.
pub struct SchedulingSet<'a, R> {
    run: Run<'a, R>,
    campaign_id: CampaignId,
    email_message_id: EmailMessageId,
}

/// Terminal. Nothing more is issued for this campaign.
pub struct Scheduled {
    report: ProvisioningReport,
}

impl<'a, R: RemoteCall> Created<'a, R> {
    pub const STAGE: ProvisioningStage = ProvisioningStage::Created;

    /// Mint the campaign that the rest of the run configures.
    pub async fn start(api: &'a CampaignApi<R>) -> CampaignResult<Self> {
        let mut run = Run {
            api,
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            platform_calls: 0,
        };
        let campaign_id = api
            .create_campaign()
            .await
            .inspect_err(|e| run.aborted(ProvisioningStage::Absent, None, e))?;
        run.platform_calls += 1;
        debug!(run_id = %run.run_id, campaign_id = %campaign_id, "Stage reached: created");

        Ok(Self { run, campaign_id })
    }

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub fn run_id(&self) -> Uuid {
        self.run.run_id
    }

    pub async fn set_identity(self, emoji: &str, name: &str) -> CampaignResult<IdentitySet<'a, R>> {
        let Self {
            mut run,
            campaign_id,
        } = self;
        let email_message_id = run
            .api
            .set_identity(&campaign_id, emoji, name)
            .await
            .inspect_err(|e| run.aborted(Self::STAGE, Some(&campaign_id), e))?;
        run.platform_calls += 1;
        debug!(run_id = %run.run_id, campaign_id = %campaign_id, "Stage reached: identity-set");

        Ok(IdentitySet {
            run,
            campaign_id,
            email_message_id,
        })
    }
}

impl<'a, R: RemoteCall> IdentitySet<'a, R> {
    pub const STAGE: ProvisioningStage = ProvisioningStage::IdentitySet;

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub fn email_message_id(&self) -> &EmailMessageId {
        &self.email_message_id
    }

    /// Apply sender name, sender username, reply-to and subject, one call
    /// at a time.
    pub async fn address(
        self,
        sender: &SenderIdentity,
        subject: &str,
    ) -> CampaignResult<MessageAddressed<'a, R>> {
        let Self {
            mut run,
            campaign_id,
            email_message_id,
        } = self;
        let api = run.api;
        let id = &email_message_id;

        let result = async {
            api.set_sender_name(id, &sender.from_name).await?;
            api.set_sender_username(id, &sender.from_email_username).await?;
            api.set_reply_to(id, &sender.reply_to_email).await?;
            api.set_subject(id, subject).await
        }
        .await;
        result.inspect_err(|e| run.aborted(Self::STAGE, Some(&campaign_id), e))?;
        run.platform_calls += 4;

        Ok(MessageAddressed {
            run,
            campaign_id,
            email_message_id,
        })
    }
}

impl<'a, R: RemoteCall> MessageAddressed<'a, R> {
    pub const STAGE: ProvisioningStage = ProvisioningStage::IdentitySet;

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub async fn upload_content(self, archive: &MjmlArchive) -> CampaignResult<ContentSet<'a, R>> {
        let Self {
            mut run,
            campaign_id,
            email_message_id,
        } = self;
        run.api
            .upload_mjml(&email_message_id, archive)
            .await
            .inspect_err(|e| run.aborted(Self::STAGE, Some(&campaign_id), e))?;
        run.platform_calls += UPLOAD_PLATFORM_CALLS;
        debug!(run_id = %run.run_id, campaign_id = %campaign_id, "Stage reached: content-set");

        Ok(ContentSet {
            run,
            campaign_id,
            email_message_id,
        })
    }
}

impl<'a, R: RemoteCall> ContentSet<'a, R> {
    pub const STAGE: ProvisioningStage = ProvisioningStage::ContentSet;

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub async fn set_audience(self, audience: &AudienceTargeting) -> CampaignResult<AudienceSet<'a, R>> {
        let Self {
            mut run,
            campaign_id,
            email_message_id,
        } = self;
        run.api
            .set_audience(&campaign_id, audience)
            .await
            .inspect_err(|e| run.aborted(Self::STAGE, Some(&campaign_id), e))?;
        run.platform_calls += 1;
        debug!(run_id = %run.run_id, campaign_id = %campaign_id, "Stage reached: audience-set");

        Ok(AudienceSet {
            run,
            campaign_id,
            email_message_id,
        })
    }
}

impl<'a, R: RemoteCall> AudienceSet<'a, R> {
    pub const STAGE: ProvisioningStage = ProvisioningStage::AudienceSet;

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub fn report(&self) -> ProvisioningReport {
        self.run
            .report(Self::STAGE, &self.campaign_id, &self.email_message_id)
    }

    pub fn into_campaign_id(self) -> CampaignId {
        self.campaign_id
    }

    /// Ask the platform to send as soon as the campaign is scheduled.
    pub async fn schedule_now(self) -> CampaignResult<SchedulingSet<'a, R>> {
        let Self {
            mut run,
            campaign_id,
            email_message_id,
        } = self;
        run.api
            .set_scheduling(&campaign_id, SchedulingMethod::Now)
            .await
            .inspect_err(|e| run.aborted(Self::STAGE, Some(&campaign_id), e))?;
        run.platform_calls += 1;
        debug!(run_id = %run.run_id, campaign_id = %campaign_id, "Stage reached: scheduling-set");

        Ok(SchedulingSet {
            run,
            campaign_id,
            email_message_id,
        })
    }
}

impl<R: RemoteCall> SchedulingSet<'_, R> {
    pub const STAGE: ProvisioningStage = ProvisioningStage::SchedulingSet;

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub async fn mark_scheduled(self) -> CampaignResult<Scheduled> {
        let Self {
            mut run,
            campaign_id,
            email_message_id,
        } = self;
        run.api
            .set_status(&campaign_id, CampaignStatus::Scheduled)
            .await
            .inspect_err(|e| run.aborted(Self::STAGE, Some(&campaign_id), e))?;
        run.platform_calls += 1;

        Ok(Scheduled {
            report: run.report(ProvisioningStage::Scheduled, &campaign_id, &email_message_id),
        })
    }
}

impl Scheduled {
    pub const STAGE: ProvisioningStage = ProvisioningStage::Scheduled;

    pub fn campaign_id(&self) -> &CampaignId {
        &self.report.campaign_id
    }

    pub fn into_report(self) -> ProvisioningReport {
        self.report
    }
}
