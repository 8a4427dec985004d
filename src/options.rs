//! Immutable per-invocation options and the policies derived from them.

use crate::config::AuditConfiguration;
use crate::error::AuditError;
use crate::kube::{AuditScope, ResourceSelector};
use crate::report::{OutputFormat, SinkTargets};
use crate::traits::Output;
use crate::validator::CountSummary;
use std::path::PathBuf;

pub const DEFAULT_INSIGHTS_HOST: &str = "https://insights.fairwinds.com";

/// Everything the `audit` command was asked to do. Built once from the
/// command line; unset string flags are `None`, never empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub audit_path: Option<PathBuf>,
    pub set_exit_code_on_danger: bool,
    pub only_show_failed_tests: bool,
    pub min_score: i64,
    pub output_url: Option<String>,
    pub output_file: Option<PathBuf>,
    pub format: OutputFormat,
    pub color: bool,
    pub display_name: Option<String>,
    pub resource: Option<String>,
    pub helm_chart: Option<String>,
    pub helm_values: Option<String>,
    pub checks: Vec<String>,
    pub namespace: Option<String>,
    pub skip_ssl_validation: bool,
    pub upload_insights: bool,
    pub cluster_name: Option<String>,
    pub insights_host: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            audit_path: None,
            set_exit_code_on_danger: false,
            only_show_failed_tests: false,
            min_score: 0,
            output_url: None,
            output_file: None,
            format: OutputFormat::Json,
            color: true,
            display_name: None,
            resource: None,
            helm_chart: None,
            helm_values: None,
            checks: Vec::new(),
            namespace: None,
            skip_ssl_validation: false,
            upload_insights: false,
            cluster_name: None,
            insights_host: DEFAULT_INSIGHTS_HOST.to_string(),
        }
    }
}

/// Where resources will come from once any chart has been rendered
#[derive(Debug, Clone, PartialEq)]
pub enum ScopePlan {
    HelmChart {
        chart: String,
        values: Option<String>,
    },
    Ready(AuditScope),
}

impl RunOptions {
    /// Treat empty strings from the command line as unset
    pub fn non_empty(value: Option<String>) -> Option<String> {
        value.filter(|v| !v.trim().is_empty())
    }

    /// Flag combinations that are invalid for an Insights upload. Checked
    /// before any chart rendering or resource discovery.
    pub fn check_upload(&self) -> Result<(), AuditError> {
        if !self.upload_insights {
            return Ok(());
        }

        if self.cluster_name.is_none() {
            return Err(AuditError::MissingClusterName);
        }
        if self.audit_path.is_some() || self.helm_chart.is_some() {
            return Err(AuditError::UploadWithAuditPath);
        }

        Ok(())
    }

    /// The two in-place mutations of the loaded configuration
    pub fn apply_to(&self, config: &mut AuditConfiguration) {
        if let Some(name) = &self.display_name {
            config.set_display_name(name);
        }
        config.restrict_checks(&self.checks);
    }

    /// Pick the single input mode to audit. Chart beats path beats resource
    /// beats namespace; each ignored option is warned about.
    pub fn reconcile(
        &self,
        config: &AuditConfiguration,
        output: &dyn Output,
    ) -> Result<ScopePlan, AuditError> {
        let namespace = self
            .namespace
            .clone()
            .or_else(|| Self::non_empty(Some(config.namespace.clone())));
        let resource = self
            .resource
            .clone()
            .or_else(|| Self::non_empty(Some(config.resource.clone())));

        if namespace.is_some() {
            if self.helm_chart.is_some() {
                output.warning(
                    "--namespace and --helm-chart are mutually exclusive. --namespace will be ignored.",
                );
            }
            if self.audit_path.is_some() {
                output.warning(
                    "--namespace and --audit-path are mutually exclusive. --namespace will be ignored.",
                );
            }
        }

        if let Some(resource) = &resource {
            if self.helm_chart.is_some() || self.audit_path.is_some() {
                output.warning(&format!(
                    "--resource {} only applies to in-cluster audits and will be ignored.",
                    resource
                ));
            } else if namespace.is_some() {
                output.warning(
                    "--namespace and --resource are mutually exclusive. --namespace will be ignored.",
                );
            }
        }

        if let Some(chart) = &self.helm_chart {
            if self.audit_path.is_some() {
                output.warning(
                    "--audit-path is overridden by the rendered output of --helm-chart.",
                );
            }
            return Ok(ScopePlan::HelmChart {
                chart: chart.clone(),
                values: self.helm_values.clone(),
            });
        }

        if let Some(path) = &self.audit_path {
            return Ok(ScopePlan::Ready(AuditScope::Path(path.clone())));
        }

        if let Some(resource) = &resource {
            let selector = ResourceSelector::parse(resource)?;
            return Ok(ScopePlan::Ready(AuditScope::Resource(selector)));
        }

        Ok(ScopePlan::Ready(AuditScope::Cluster { namespace }))
    }

    pub fn sink_targets(&self) -> SinkTargets {
        SinkTargets {
            file: self.output_file.clone(),
            url: self.output_url.clone(),
            skip_ssl_validation: self.skip_ssl_validation,
        }
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy {
            exit_on_danger: self.set_exit_code_on_danger,
            min_score: self.min_score,
        }
    }
}

/// How a completed audit ends the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Passed,
    DangerFound { dangers: u32 },
    BelowScore { score: u32, min_score: i64 },
}

impl AuditOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            AuditOutcome::Passed => 0,
            AuditOutcome::DangerFound { .. } => 3,
            AuditOutcome::BelowScore { .. } => 4,
        }
    }

    /// Operator-facing explanation for a non-zero exit
    pub fn message(&self) -> Option<String> {
        match self {
            AuditOutcome::Passed => None,
            AuditOutcome::DangerFound { dangers } => {
                Some(format!("{} danger items found in audit", dangers))
            }
            AuditOutcome::BelowScore { score, min_score } => Some(format!(
                "Audit score of {} is less than the provided minimum of {}",
                score, min_score
            )),
        }
    }
}

/// Thresholds that turn a finished audit into a non-zero exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitPolicy {
    pub exit_on_danger: bool,
    /// Zero or below disables the score check
    pub min_score: i64,
}

impl ExitPolicy {
    /// First matching rule wins: dangers, then score
    pub fn evaluate(&self, summary: &CountSummary) -> AuditOutcome {
        if self.exit_on_danger && summary.dangers > 0 {
            return AuditOutcome::DangerFound {
                dangers: summary.dangers,
            };
        }

        let score = summary.score();
        if self.min_score > 0 && i64::from(score) < self.min_score {
            return AuditOutcome::BelowScore {
                score,
                min_score: self.min_score,
            };
        }

        AuditOutcome::Passed
    }
}
