use super::Rendered;
use crate::context::Context;
use crate::error::AuditError;
use crate::traits::PostRequest;
use anyhow::{Context as AnyhowContext, Result};
use std::path::PathBuf;

/// Where a rendered report goes. With neither set, it goes to stdout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkTargets {
    pub file: Option<PathBuf>,
    pub url: Option<String>,
    pub skip_ssl_validation: bool,
}

impl SinkTargets {
    /// Reject URLs that are not absolute http(s) before any audit work runs
    pub fn validate(&self) -> Result<(), AuditError> {
        let Some(raw) = &self.url else {
            return Ok(());
        };

        let invalid = |message: &str| AuditError::InvalidOutputUrl {
            url: raw.clone(),
            message: message.to_string(),
        };

        let parsed = url::Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(&format!("unsupported scheme '{}'", other))),
        }
    }
}

pub struct SinkDispatcher;

impl SinkDispatcher {
    /// Deliver the report. The URL and file sinks are independent and both
    /// run when both are configured.
    pub fn dispatch(ctx: &Context, rendered: &Rendered, targets: &SinkTargets) -> Result<()> {
        if targets.file.is_none() && targets.url.is_none() {
            return ctx.output.raw(&rendered.bytes);
        }

        if let Some(url) = &targets.url {
            Self::post(ctx, rendered, url, targets.skip_ssl_validation)?;
        }

        if let Some(file) = &targets.file {
            ctx.fs
                .write(file, &rendered.bytes)
                .with_context(|| format!("Error writing output to file {:?}", file))?;
        }

        Ok(())
    }

    /// Single attempt. Transport errors are fatal; an error status is only
    /// logged.
    fn post(ctx: &Context, rendered: &Rendered, url: &str, skip_ssl_validation: bool) -> Result<()> {
        let request = PostRequest::new(url, rendered.bytes.clone(), rendered.content_type)
            .skip_ssl_validation(skip_ssl_validation);

        let response = ctx
            .http
            .post(&request)
            .with_context(|| format!("Error making request for output to {}", url))?;

        if !response.is_success() {
            ctx.output.warning(&format!(
                "Output endpoint {} responded with status {}",
                url, response.status
            ));
        }
        ctx.output
            .info(&format!("Received response: {}", response.body));

        Ok(())
    }
}
