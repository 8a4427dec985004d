use std::fmt;

/// Errors raised by the audit pipeline itself, as opposed to failures
/// bubbling up from I/O or serialization
#[derive(Debug)]
pub enum AuditError {
    /// `--upload-insights` without `--cluster-name`
    MissingClusterName,

    /// `--upload-insights` combined with an audit path (or a rendered chart)
    UploadWithAuditPath,

    /// `--resource` not in `namespace/kind/version/name` form
    InvalidResourceSelector(String),

    /// `--output-url` is not an absolute http(s) URL
    InvalidOutputUrl { url: String, message: String },

    /// An external process exited unsuccessfully
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// Authentication, inventory or submission to the reporting service failed
    Reporting(String),
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::MissingClusterName => {
                write!(f, "cluster-name is required when using --upload-insights")
            }
            AuditError::UploadWithAuditPath => {
                write!(
                    f,
                    "upload-insights and audit-path are not supported when used simultaneously"
                )
            }
            AuditError::InvalidResourceSelector(selector) => {
                write!(
                    f,
                    "Invalid resource '{}': expected namespace/kind/version/name",
                    selector
                )
            }
            AuditError::InvalidOutputUrl { url, message } => {
                write!(f, "Invalid output URL '{}': {}", url, message)
            }
            AuditError::CommandFailed {
                command,
                exit_code,
                output,
            } => {
                write!(f, "Command '{}' failed", command)?;

                if let Some(code) = exit_code {
                    write!(f, " (exit code {})", code)?;
                }

                let output = output.trim();
                if !output.is_empty() {
                    write!(f, ": {}", output)?;
                }

                Ok(())
            }
            AuditError::Reporting(msg) => {
                write!(f, "Reporting to Fairwinds Insights failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for AuditError {}
