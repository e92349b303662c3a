//! In-memory platform used by the unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use campaign_core::{CampaignError, CampaignResult, RemoteMethod};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::remote::RemoteCall;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Recorded {
    Platform {
        method: RemoteMethod,
        path: String,
        body: Value,
    },
    Transfer {
        url: String,
        content_type: String,
        len: usize,
    },
}

impl Recorded {
    /// `"PUT /campaigns/cmp_1"` style label for order assertions.
    pub(crate) fn label(&self) -> String {
        match self {
            Self::Platform { method, path, .. } => format!("{method} {path}"),
            Self::Transfer { url, .. } => format!("PUT {url}"),
        }
    }

    pub(crate) fn body(&self) -> Option<&Value> {
        match self {
            Self::Platform { body, .. } => Some(body),
            Self::Transfer { .. } => None,
        }
    }
}

type FailWhen = Box<dyn Fn(RemoteMethod, &str, &Value) -> bool + Send + Sync>;

/// Answers like the platform: mints fresh ids on create and identity calls
/// and a fresh ticket per upload request.
pub(crate) struct RecordingRemote {
    calls: Mutex<Vec<Recorded>>,
    minted: AtomicUsize,
    fail_when: Option<FailWhen>,
    fail_transfer: bool,
}

impl RecordingRemote {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            minted: AtomicUsize::new(0),
            fail_when: None,
            fail_transfer: false,
        }
    }

    /// Answer matching platform calls with a 500.
    pub(crate) fn failing_when(
        mut self,
        pred: impl Fn(RemoteMethod, &str, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Box::new(pred));
        self
    }

    pub(crate) fn failing_transfer(mut self) -> Self {
        self.fail_transfer = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn labels(&self) -> Vec<String> {
        self.calls().iter().map(Recorded::label).collect()
    }

    fn next(&self) -> usize {
        self.minted.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl RemoteCall for RecordingRemote {
    async fn call(&self, method: RemoteMethod, path: &str, body: Value) -> CampaignResult<Value> {
        self.calls.lock().unwrap().push(Recorded::Platform {
            method,
            path: path.to_string(),
            body: body.clone(),
        });

        if self.fail_when.as_ref().is_some_and(|f| f(method, path, &body)) {
            return Err(CampaignError::Status {
                method,
                path: path.to_string(),
                status: 500,
                body: "Internal Server Error".into(),
            });
        }

        let reply = if path == "/campaigns/create" {
            json!({ "success": true, "campaignId": format!("cmp_{}", self.next()) })
        } else if path.starts_with("/campaigns/") && body.get("emoji").is_some() {
            json!({ "success": true, "emailMessageId": format!("em_{}", self.next()) })
        } else if path == "/trpc/emailMessages.getPresignedMjmlUpload" {
            let n = self.next();
            json!({ "result": { "data": { "json": {
                "filename": format!("upload-{n}.zip"),
                "presignedUrl": format!("https://storage.test/upload-{n}.zip?sig=abc"),
            } } } })
        } else {
            json!({ "success": true })
        };
        Ok(reply)
    }

    async fn transfer(&self, url: &str, content_type: &str, body: Bytes) -> CampaignResult<()> {
        self.calls.lock().unwrap().push(Recorded::Transfer {
            url: url.to_string(),
            content_type: content_type.to_string(),
            len: body.len(),
        });
        if self.fail_transfer {
            return Err(CampaignError::BlobTransfer {
                status: Some(403),
                message: "AccessDenied".into(),
            });
        }
        Ok(())
    }
}
