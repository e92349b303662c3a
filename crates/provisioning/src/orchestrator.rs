//! Entry points that provision (and optionally send) a whole campaign.

use campaign_core::{
    CampaignDraft, CampaignError, CampaignId, CampaignResult, PlatformConfig, ProvisioningReport,
};
use tracing::{info, info_span, Instrument};

use crate::mutators::CampaignApi;
use crate::pipeline::{AudienceSet, Created};
use crate::remote::{HttpRemote, RemoteCall};

/// Provisions campaigns on the platform. Holds no per-run state, so one
/// client can drive any number of independent runs.
pub struct CampaignClient<R = HttpRemote> {
    api: CampaignApi<R>,
}

impl CampaignClient<HttpRemote> {
    pub fn from_config(config: PlatformConfig) -> CampaignResult<Self> {
        let remote = HttpRemote::new(&config)?;
        Ok(Self::with_api(
            CampaignApi::new(remote).with_template_id(config.template_id),
        ))
    }

    /// Build from `CAMPAIGN_PLATFORM__*` environment variables.
    pub fn from_env() -> CampaignResult<Self> {
        Self::from_config(PlatformConfig::load()?)
    }
}

impl<R: RemoteCall> CampaignClient<R> {
    pub fn new(remote: R) -> Self {
        Self::with_api(CampaignApi::new(remote))
    }

    pub fn with_api(api: CampaignApi<R>) -> Self {
        Self { api }
    }

    /// The individual operations, for callers driving steps themselves.
    pub fn api(&self) -> &CampaignApi<R> {
        &self.api
    }

    /// Create and fully configure a campaign without sending it.
    ///
    /// Any failure stops the run; steps already applied stay applied on the
    /// platform. Calling this twice creates two campaigns.
    pub async fn create_campaign(&self, draft: &CampaignDraft) -> CampaignResult<CampaignId> {
        Ok(self.provision_with_report(draft).await?.campaign_id)
    }

    /// [`create_campaign`](Self::create_campaign), then request immediate
    /// sending and mark the campaign `Scheduled`.
    pub async fn create_and_send_campaign(&self, draft: &CampaignDraft) -> CampaignResult<CampaignId> {
        Ok(self.provision_and_send_with_report(draft).await?.campaign_id)
    }

    pub async fn provision_with_report(&self, draft: &CampaignDraft) -> CampaignResult<ProvisioningReport> {
        let span = info_span!("provision_campaign", name = %draft.name);
        async {
            let provisioned = self.provision(draft).await?;
            let report = provisioned.report();
            info!(
                run_id = %report.run_id,
                campaign_id = %report.campaign_id,
                calls = report.platform_calls,
                "Campaign provisioned"
            );
            Ok::<_, CampaignError>(report)
        }
        .instrument(span)
        .await
    }

    pub async fn provision_and_send_with_report(
        &self,
        draft: &CampaignDraft,
    ) -> CampaignResult<ProvisioningReport> {
        let span = info_span!("provision_and_send_campaign", name = %draft.name);
        async {
            let provisioned = self.provision(draft).await?;
            let report = provisioned
                .schedule_now()
                .await?
                .mark_scheduled()
                .await?
                .into_report();
            info!(
                run_id = %report.run_id,
                campaign_id = %report.campaign_id,
                calls = report.platform_calls,
                "Campaign scheduled for immediate sending"
            );
            Ok::<_, CampaignError>(report)
        }
        .instrument(span)
        .await
    }

    async fn provision(&self, draft: &CampaignDraft) -> CampaignResult<AudienceSet<'_, R>> {
        Created::start(&self.api)
            .await?
            .set_identity(&draft.emoji, &draft.name)
            .await?
            .address(&draft.sender, &draft.subject)
            .await?
            .upload_content(&draft.archive)
            .await?
            .set_audience(&draft.audience)
            .await
    }
}
