//! Helm chart materialization.
//!
//! Renders a chart into plain manifests so it can be audited like any other
//! directory. The output directory is never removed; callers that care about
//! disk usage must clean it up themselves.

use crate::context::Context;
use crate::error::AuditError;
use anyhow::{Context as AnyhowContext, Result};
use std::path::PathBuf;

const HELM: &str = "helm";

pub struct HelmMaterializer;

impl HelmMaterializer {
    /// Update chart dependencies, then render the chart into a fresh
    /// temporary directory and return that directory.
    pub fn materialize(ctx: &Context, chart: &str, values: Option<&str>) -> Result<PathBuf> {
        Self::run(
            ctx,
            vec!["dependency".to_string(), "update".to_string(), chart.to_string()],
        )?;

        let dir = ctx
            .fs
            .create_temp_dir()
            .context("Couldn't create a directory for rendered templates")?;

        let mut args = vec![
            "template".to_string(),
            chart.to_string(),
            "--generate-name".to_string(),
            "--output-dir".to_string(),
            dir.display().to_string(),
        ];
        if let Some(values) = values {
            args.push("--values".to_string());
            args.push(values.to_string());
        }

        Self::run(ctx, args)?;

        ctx.output
            .info(&format!("Rendered chart {} into {}", chart, dir.display()));
        Ok(dir)
    }

    fn run(ctx: &Context, args: Vec<String>) -> Result<()> {
        let command = format!("{} {}", HELM, args.join(" "));
        let output = ctx.command.run(HELM, &args)?;

        if !output.success {
            // stdout then stderr, as captured
            if !output.combined.trim().is_empty() {
                ctx.output.dimmed(output.combined.trim_end());
            }
            return Err(AuditError::CommandFailed {
                command,
                exit_code: output.exit_code,
                output: output.combined,
            }
            .into());
        }

        Ok(())
    }
}
