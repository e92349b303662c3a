//! MJML archive upload: announce the editor mode, obtain a presigned
//! destination, write the bytes to blob storage, then confirm.
//!
//! The phases run in order and are not retried as a unit. A failure part-way
//! leaves the email message in MJML mode with no bound content.

use campaign_core::{
    CampaignError, CampaignResult, EditorType, EmailMessageId, MjmlArchive, RemoteMethod,
    UploadTicket,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::mutators::CampaignApi;
use crate::remote::RemoteCall;

pub(crate) const UPLOAD_TICKET_PATH: &str = "/trpc/emailMessages.getPresignedMjmlUpload";

/// Platform calls issued by one upload, not counting the blob transfer.
pub(crate) const UPLOAD_PLATFORM_CALLS: usize = 3;

pub(crate) fn confirm_upload_path(id: &EmailMessageId) -> String {
    format!("/emailMessages/{id}/upload-mjml-zip")
}

/// Procedure-call envelope: the payload travels under `json`.
#[derive(Serialize)]
struct TrpcRequest<T> {
    json: T,
}

#[derive(Deserialize)]
struct TrpcResponse<T> {
    result: TrpcResult<T>,
}

#[derive(Deserialize)]
struct TrpcResult<T> {
    data: TrpcData<T>,
}

#[derive(Deserialize)]
struct TrpcData<T> {
    json: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketRequest<'a> {
    email_message_id: &'a EmailMessageId,
}

#[derive(Serialize)]
struct ConfirmUpload<'a> {
    filename: &'a str,
}

impl<R: RemoteCall> CampaignApi<R> {
    /// Ask the platform for a single-use upload destination.
    pub async fn request_upload_ticket(&self, id: &EmailMessageId) -> CampaignResult<UploadTicket> {
        let request = TrpcRequest {
            json: TicketRequest {
                email_message_id: id,
            },
        };
        let payload = self
            .send(RemoteMethod::Create, UPLOAD_TICKET_PATH, &request)
            .await?;

        let response: TrpcResponse<UploadTicket> =
            serde_json::from_value(payload).map_err(|e| CampaignError::UnexpectedResponse {
                method: RemoteMethod::Create,
                path: UPLOAD_TICKET_PATH.to_string(),
                message: format!("malformed upload ticket: {e}"),
            })?;
        Ok(response.result.data.json)
    }

    /// Write the archive straight to the ticket's presigned URL.
    pub async fn transfer_archive(
        &self,
        ticket: &UploadTicket,
        archive: &MjmlArchive,
    ) -> CampaignResult<()> {
        self.remote()
            .transfer(&ticket.presigned_url, archive.content_type(), archive.bytes())
            .await
    }

    /// Bind the uploaded object to the email message.
    pub async fn confirm_upload(&self, id: &EmailMessageId, filename: &str) -> CampaignResult<()> {
        self.send(
            RemoteMethod::Create,
            &confirm_upload_path(id),
            &ConfirmUpload { filename },
        )
        .await?;
        Ok(())
    }

    /// Run all four phases against one email message.
    ///
    /// The editor-mode change is assumed to gate ticket issuance on the
    /// platform side; it is not re-checked before requesting the ticket.
    pub async fn upload_mjml(&self, id: &EmailMessageId, archive: &MjmlArchive) -> CampaignResult<()> {
        self.set_editor_type(id, EditorType::Mjml).await?;

        let ticket = self.request_upload_ticket(id).await?;
        debug!(email_message_id = %id, filename = %ticket.filename, "Upload ticket issued");

        self.transfer_archive(&ticket, archive).await?;

        self.confirm_upload(id, &ticket.filename).await?;
        info!(
            email_message_id = %id,
            filename = %ticket.filename,
            bytes = archive.len(),
            "MJML archive uploaded"
        );
        Ok(())
    }
}
