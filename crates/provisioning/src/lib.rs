//! Campaign provisioning against the email campaign platform.
//!
//! Creates a campaign, sets its identity, sender and subject, uploads MJML
//! content through a presigned-URL handoff, applies audience targeting and
//! optionally schedules it for immediate sending. Runs fail fast and never
//! undo remote changes.

pub mod mutators;
pub mod orchestrator;
pub mod pipeline;
pub mod remote;
pub mod upload;

#[cfg(test)]
mod testing;

pub use mutators::CampaignApi;
pub use orchestrator::CampaignClient;
pub use remote::{HttpRemote, RemoteCall};
