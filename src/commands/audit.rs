use crate::config::AuditConfiguration;
use crate::context::Context;
use crate::error::AuditError;
use crate::helm::HelmMaterializer;
use crate::insights::{
    Authenticator, FileAuthenticator, InsightsClient, PolarisReport, WorkloadsReport, results_url,
};
use crate::kube::{
    AuditResourceProvider, AuditScope, InventoryResourceProvider, KubeLoader, KubectlInventory,
};
use crate::options::{AuditOutcome, RunOptions, ScopePlan};
use crate::report::Renderer;
use crate::report::SinkDispatcher;
use crate::validator::{self, AuditData};
use anyhow::{Context as AnyhowContext, Result};

pub struct AuditCommand;

impl AuditCommand {
    /// Run one audit end to end and report how the process should exit
    pub fn execute(ctx: &Context, options: &RunOptions) -> Result<AuditOutcome> {
        if !options.upload_insights {
            return Self::execute_with(ctx, options, None);
        }

        let authenticator =
            FileAuthenticator::new(ctx.fs.as_ref(), ctx.input.as_ref(), ctx.output.as_ref())?;
        Self::execute_with(ctx, options, Some(&authenticator))
    }

    /// Credentials are only consulted when uploading to Insights
    pub fn execute_with(
        ctx: &Context,
        options: &RunOptions,
        authenticator: Option<&dyn Authenticator>,
    ) -> Result<AuditOutcome> {
        options.check_upload()?;
        if !options.upload_insights {
            options.sink_targets().validate()?;
        }

        let mut config = Self::load_config(ctx, options)?;
        options.apply_to(&mut config);

        let plan = options.reconcile(&config, ctx.output.as_ref())?;

        let authenticator = match authenticator {
            Some(authenticator) if options.upload_insights => {
                if !authenticator.is_logged_in(&options.insights_host) {
                    authenticator
                        .login(&options.insights_host)
                        .context("Error handling login")?;
                }
                Some(authenticator)
            }
            None if options.upload_insights => {
                anyhow::bail!("No Insights credentials available for upload")
            }
            _ => None,
        };

        let scope = match plan {
            ScopePlan::HelmChart { chart, values } => {
                let dir = HelmMaterializer::materialize(ctx, &chart, values.as_deref())
                    .context("Couldn't process helm chart")?;
                AuditScope::Path(dir)
            }
            ScopePlan::Ready(scope) => scope,
        };

        let loader = KubeLoader::new(ctx.fs.as_ref(), ctx.command.as_ref());
        let provider = loader
            .fetch(&scope)
            .context("Error fetching Kubernetes resources")?;

        let audit = validator::run_audit(&config, &provider)
            .context("Error while running audit on resources")?;

        match authenticator {
            Some(authenticator) => Self::upload(ctx, options, authenticator, &audit)?,
            None => {
                let rendered = Renderer::render(
                    &audit,
                    options.format,
                    options.color,
                    options.only_show_failed_tests,
                )?;
                SinkDispatcher::dispatch(ctx, &rendered, &options.sink_targets())?;
            }
        }

        let outcome = options.exit_policy().evaluate(&audit.summary());
        if let Some(message) = outcome.message() {
            ctx.output.info(&message);
        }

        Ok(outcome)
    }

    fn load_config(ctx: &Context, options: &RunOptions) -> Result<AuditConfiguration> {
        match &options.config_path {
            Some(path) => AuditConfiguration::from_file(ctx.fs.as_ref(), path),
            None => Ok(AuditConfiguration::default()),
        }
    }

    fn upload(
        ctx: &Context,
        options: &RunOptions,
        authenticator: &dyn Authenticator,
        audit: &AuditData,
    ) -> Result<()> {
        let cluster = options
            .cluster_name
            .as_deref()
            .ok_or(AuditError::MissingClusterName)?;
        let host = options.insights_host.as_str();

        let auth = authenticator
            .get_auth(host)
            .map_err(|e| AuditError::Reporting(format!("getting auth: {:#}", e)))?;

        let inventory = KubectlInventory::new(ctx.command.as_ref())
            .inventory()
            .map_err(|e| AuditError::Reporting(format!("creating resource provider: {:#}", e)))?;

        ctx.output.info(&format!(
            "Uploading to Fairwinds Insights organization '{}/{}'...",
            auth.organization, cluster
        ));

        InsightsClient::new(ctx.http.as_ref(), host, &auth.organization, &auth.token)
            .report_audit(
                cluster,
                &WorkloadsReport::new(inventory),
                &PolarisReport::new(audit.clone()),
            )
            .context("reporting audit file to insights")?;

        ctx.output.success("Success! You can see your results at:");
        ctx.output
            .lavender(&results_url(host, &auth.organization, cluster)?);
        Ok(())
    }
}
