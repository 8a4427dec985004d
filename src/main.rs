mod commands;
mod config;
mod context;
mod error;
mod helm;
mod insights;
mod kube;
mod options;
mod output;
mod report;
mod traits;
mod validator;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::AuditCommand;
use context::Context;
use options::{DEFAULT_INSIGHTS_HOST, RunOptions};
use report::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "polaris")]
#[command(about = "Polaris - validation of best practices in your Kubernetes clusters", long_about = None)]
#[command(version)]
struct Cli {
    /// Location of the audit configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fairwinds Insights host to upload results to
    #[arg(long, global = true, env = "POLARIS_INSIGHTS_HOST", default_value = DEFAULT_INSIGHTS_HOST)]
    insights_host: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs a one-time audit
    Audit(AuditArgs),
}

#[derive(Args)]
struct AuditArgs {
    /// If specified, audits one or more YAML files instead of a cluster
    #[arg(long)]
    audit_path: Option<PathBuf>,

    /// Set an exit code of 3 when the audit contains danger-level issues
    #[arg(long)]
    set_exit_code_on_danger: bool,

    /// If specified, audit output will only show failed tests
    #[arg(long)]
    only_show_failed_tests: bool,

    /// Set an exit code of 4 when the score is below this threshold (0 disables)
    #[arg(long = "set-exit-code-below-score", default_value_t = 0, allow_negative_numbers = true)]
    min_score: i64,

    /// Destination URL to send audit results
    #[arg(long)]
    output_url: Option<String>,

    /// Destination file for audit results
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Output format for results - json, yaml, pretty, or score
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Whether to use color in pretty format
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    color: bool,

    /// An optional identifier for the audit
    #[arg(long)]
    display_name: Option<String>,

    /// Audit a specific resource, in the format namespace/kind/version/name,
    /// e.g. nginx-ingress/Deployment.apps/v1/default-backend
    #[arg(long)]
    resource: Option<String>,

    /// Render this Helm chart and audit the result
    #[arg(long)]
    helm_chart: Option<String>,

    /// Values file for the Helm chart
    #[arg(long)]
    helm_values: Option<String>,

    /// Only run these checks (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    checks: Vec<String>,

    /// Namespace to audit. Only applies to in-cluster audits
    #[arg(long)]
    namespace: Option<String>,

    /// Skip https certificate verification
    #[arg(long)]
    skip_ssl_validation: bool,

    /// Upload scan results to Fairwinds Insights
    #[arg(long)]
    upload_insights: bool,

    /// A descriptive name for the cluster being audited, required with --upload-insights
    #[arg(long)]
    cluster_name: Option<String>,
}

impl AuditArgs {
    fn into_options(self, config: Option<PathBuf>, insights_host: String) -> RunOptions {
        let path = |p: Option<PathBuf>| p.filter(|p| !p.as_os_str().is_empty());

        RunOptions {
            config_path: path(config),
            audit_path: path(self.audit_path),
            set_exit_code_on_danger: self.set_exit_code_on_danger,
            only_show_failed_tests: self.only_show_failed_tests,
            min_score: self.min_score,
            output_url: RunOptions::non_empty(self.output_url),
            output_file: path(self.output_file),
            format: OutputFormat::parse(&self.format),
            color: self.color,
            display_name: RunOptions::non_empty(self.display_name),
            resource: RunOptions::non_empty(self.resource),
            helm_chart: RunOptions::non_empty(self.helm_chart),
            helm_values: RunOptions::non_empty(self.helm_values),
            checks: self
                .checks
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            namespace: RunOptions::non_empty(self.namespace),
            skip_ssl_validation: self.skip_ssl_validation,
            upload_insights: self.upload_insights,
            cluster_name: RunOptions::non_empty(self.cluster_name),
            insights_host: insights_host.trim_end_matches('/').to_string(),
        }
    }
}

fn run(ctx: &Context, cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Audit(args) => {
            let options = args.into_options(cli.config, cli.insights_host);
            let outcome = AuditCommand::execute(ctx, &options)?;
            Ok(outcome.exit_code())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ctx = Context::new();

    match run(&ctx, cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
