use crate::error::AuditError;
use crate::kube::WorkloadInventory;
use crate::traits::{HttpClient, PostRequest};
use crate::validator::AuditData;
use anyhow::{Context, Result};
use serde::Serialize;
use url::Url;

/// Schema version of the workload inventory payload
pub const WORKLOADS_VERSION: &str = "0.2";

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadsReport {
    pub version: String,
    pub payload: WorkloadInventory,
}

impl WorkloadsReport {
    pub fn new(payload: WorkloadInventory) -> Self {
        Self {
            version: WORKLOADS_VERSION.to_string(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PolarisReport {
    pub version: String,
    pub payload: AuditData,
}

impl PolarisReport {
    pub fn new(payload: AuditData) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            payload,
        }
    }
}

#[derive(Serialize)]
struct AuditBundle<'a> {
    workloads: &'a WorkloadsReport,
    polaris: &'a PolarisReport,
}

/// Authenticated client for one organization on one Insights host
pub struct InsightsClient<'a> {
    http: &'a dyn HttpClient,
    host: String,
    organization: String,
    token: String,
}

impl<'a> InsightsClient<'a> {
    pub fn new(http: &'a dyn HttpClient, host: &str, organization: &str, token: &str) -> Self {
        Self {
            http,
            host: host.to_string(),
            organization: organization.to_string(),
            token: token.to_string(),
        }
    }

    /// Submit both reports in a single request. Any failure is final.
    pub fn report_audit(
        &self,
        cluster: &str,
        workloads: &WorkloadsReport,
        polaris: &PolarisReport,
    ) -> Result<()> {
        let url = join_url(
            &self.host,
            &[
                "v0",
                "organizations",
                &self.organization,
                "clusters",
                cluster,
                "data",
                "audit",
            ],
        )?;

        let body = serde_json::to_vec(&AuditBundle { workloads, polaris })
            .context("Failed to serialize audit report")?;

        let request = PostRequest::new(url.as_str(), body, "application/json")
            .with_header("Authorization", &format!("Bearer {}", self.token))
            .with_header("Accept", "application/json");

        let response = self.http.post(&request)?;
        if !response.is_success() {
            return Err(AuditError::Reporting(format!(
                "{} responded with status {}: {}",
                url,
                response.status,
                response.body.trim()
            ))
            .into());
        }

        Ok(())
    }
}

/// Where the uploaded results can be viewed
pub fn results_url(host: &str, organization: &str, cluster: &str) -> Result<String> {
    let url = join_url(
        host,
        &["orgs", organization, "clusters", cluster, "action-items"],
    )?;
    Ok(url.to_string())
}

/// Append path segments to `host`, percent-encoding each one
fn join_url(host: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(host).with_context(|| format!("Invalid Insights host URL: {}", host))?;

    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Invalid Insights host URL: {}", host))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}
