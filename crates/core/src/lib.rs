//! Shared configuration, error taxonomy and domain types for campaign
//! provisioning against the email campaign platform.

pub mod config;
pub mod error;
pub mod types;

pub use config::PlatformConfig;
pub use error::{CampaignError, CampaignResult};
pub use types::*;
