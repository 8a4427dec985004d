use crate::traits::{FileSystem, Output, UserInput};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Credentials for one Insights host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsAuth {
    pub organization: String,
    pub token: String,
}

/// Credentials file layout, keyed by host
#[derive(Debug, Default, Serialize, Deserialize)]
struct AuthFile {
    #[serde(default)]
    hosts: BTreeMap<String, InsightsAuth>,
}

/// Session handling for the reporting service
pub trait Authenticator {
    fn is_logged_in(&self, host: &str) -> bool;

    /// Obtain credentials for `host` and persist them
    fn login(&self, host: &str) -> Result<()>;

    fn get_auth(&self, host: &str) -> Result<InsightsAuth>;
}

/// Keeps credentials in a YAML file, prompting for them on login
pub struct FileAuthenticator<'a> {
    fs: &'a dyn FileSystem,
    input: &'a dyn UserInput,
    output: &'a dyn Output,
    path: PathBuf,
}

impl<'a> FileAuthenticator<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        input: &'a dyn UserInput,
        output: &'a dyn Output,
    ) -> Result<Self> {
        let path = Self::default_path()?;
        Ok(Self::with_path(fs, input, output, path))
    }

    pub fn with_path(
        fs: &'a dyn FileSystem,
        input: &'a dyn UserInput,
        output: &'a dyn Output,
        path: PathBuf,
    ) -> Self {
        Self {
            fs,
            input,
            output,
            path,
        }
    }

    /// `<config dir>/polaris/auth.yaml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("polaris").join("auth.yaml"))
    }

    fn load(&self) -> Result<AuthFile> {
        if !self.fs.exists(&self.path) {
            return Ok(AuthFile::default());
        }

        let contents = self.fs.read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(AuthFile::default());
        }

        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials file: {:?}", self.path))
    }

    fn save(&self, file: &AuthFile) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(file).context("Failed to serialize credentials")?;
        self.fs.write(&self.path, yaml.as_bytes())
    }

    fn prompt_non_empty(&self, prompt: &str, secret: bool) -> Result<String> {
        let answer = if secret {
            self.input.secret(prompt)?
        } else {
            self.input.text(prompt)?
        };

        let answer = answer.trim().to_string();
        if answer.is_empty() {
            anyhow::bail!("{} cannot be empty", prompt.trim_end_matches(':'));
        }
        Ok(answer)
    }
}

impl Authenticator for FileAuthenticator<'_> {
    fn is_logged_in(&self, host: &str) -> bool {
        self.load()
            .map(|file| file.hosts.contains_key(host))
            .unwrap_or(false)
    }

    fn login(&self, host: &str) -> Result<()> {
        self.output
            .info(&format!("Logging in to Fairwinds Insights at {}", host));
        self.output
            .dimmed("Create an API token under your organization's settings page");

        let organization = self.prompt_non_empty("Organization:", false)?;
        let token = self.prompt_non_empty("API token:", true)?;

        let mut file = self.load()?;
        file.hosts.insert(
            host.to_string(),
            InsightsAuth {
                organization: organization.clone(),
                token,
            },
        );
        self.save(&file)?;

        self.output
            .success(&format!("Logged in to organization '{}'", organization));
        Ok(())
    }

    fn get_auth(&self, host: &str) -> Result<InsightsAuth> {
        self.load()?
            .hosts
            .remove(host)
            .with_context(|| format!("Not logged in to {}", host))
    }
}
