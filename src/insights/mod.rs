//! Uploading audit results to a Fairwinds Insights instance.

pub mod auth;
pub mod client;

pub use auth::{Authenticator, FileAuthenticator};
pub use client::{InsightsClient, PolarisReport, WorkloadsReport, results_url};
