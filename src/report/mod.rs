//! Rendering audit results and delivering them to their destinations.

pub mod sink;

pub use sink::{SinkDispatcher, SinkTargets};

use crate::validator::AuditData;
use anyhow::{Context, Result};

/// Encoding of the rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Pretty,
    Score,
}

impl OutputFormat {
    /// Unrecognized names fall back to JSON
    pub fn parse(name: &str) -> Self {
        match name {
            "yaml" => OutputFormat::Yaml,
            "pretty" => OutputFormat::Pretty,
            "score" => OutputFormat::Score,
            _ => OutputFormat::Json,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Yaml => "application/x-yaml",
            OutputFormat::Pretty | OutputFormat::Score => "text/plain",
        }
    }
}

/// Report bytes together with the MIME type they were rendered as
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

pub struct Renderer;

impl Renderer {
    /// Serialize `audit` in `format`. With `failures_only` the report is
    /// built from a filtered copy; `audit` itself is left untouched.
    pub fn render(
        audit: &AuditData,
        format: OutputFormat,
        color: bool,
        failures_only: bool,
    ) -> Result<Rendered> {
        let filtered;
        let audit = if failures_only {
            filtered = audit.remove_successful_results();
            &filtered
        } else {
            audit
        };

        let bytes = match format {
            OutputFormat::Score => format!("{}\n", audit.summary().score()).into_bytes(),
            OutputFormat::Yaml => Self::to_yaml(audit)?.into_bytes(),
            OutputFormat::Pretty => audit.pretty_output(color).into_bytes(),
            OutputFormat::Json => {
                serde_json::to_vec_pretty(audit).context("Error marshalling audit")?
            }
        };

        Ok(Rendered {
            bytes,
            content_type: format.content_type(),
        })
    }

    /// JSON first, then JSON to YAML, so both encodings share one shape
    fn to_yaml(audit: &AuditData) -> Result<String> {
        let json = serde_json::to_vec(audit).context("Error marshalling audit")?;
        let value: serde_yaml::Value =
            serde_json::from_slice(&json).context("Error converting audit JSON to YAML")?;
        serde_yaml::to_string(&value).context("Error converting audit JSON to YAML")
    }
}
