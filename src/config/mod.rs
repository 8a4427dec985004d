//! Audit configuration: which checks run and how severe their failures are.

use crate::traits::FileSystem;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Severity assigned to a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ignore,
    Warning,
    Danger,
}

/// Run configuration shared by every stage of an audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfiguration {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub checks: BTreeMap<String, Severity>,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub resource: String,
}

impl Default for AuditConfiguration {
    fn default() -> Self {
        let checks = [
            ("hostIPCSet", Severity::Danger),
            ("hostPIDSet", Severity::Danger),
            ("hostNetworkSet", Severity::Warning),
            ("runAsRootAllowed", Severity::Danger),
            ("runAsPrivileged", Severity::Danger),
            ("privilegeEscalationAllowed", Severity::Danger),
            ("notReadOnlyRootFilesystem", Severity::Warning),
            ("cpuRequestsMissing", Severity::Warning),
            ("memoryRequestsMissing", Severity::Warning),
            ("cpuLimitsMissing", Severity::Warning),
            ("memoryLimitsMissing", Severity::Warning),
            ("readinessProbeMissing", Severity::Warning),
            ("livenessProbeMissing", Severity::Warning),
            ("tagNotSpecified", Severity::Danger),
            ("pullPolicyNotAlways", Severity::Warning),
        ]
        .into_iter()
        .map(|(id, severity)| (id.to_string(), severity))
        .collect();

        Self {
            display_name: String::new(),
            checks,
            namespace: String::new(),
            resource: String::new(),
        }
    }
}

impl AuditConfiguration {
    /// Load a configuration file. Checks the file does not mention keep
    /// their default severity.
    pub fn from_file(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs.read_to_string(path)?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse configuration file: {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let parsed: AuditConfiguration = serde_yaml::from_str(content)?;

        let mut config = Self::default();
        config.checks.extend(parsed.checks);
        config.display_name = parsed.display_name;
        config.namespace = parsed.namespace;
        config.resource = parsed.resource;
        Ok(config)
    }

    /// Severity of a check; unknown checks are ignored
    pub fn severity(&self, check: &str) -> Severity {
        self.checks.get(check).copied().unwrap_or(Severity::Ignore)
    }

    pub fn set_display_name(&mut self, name: &str) {
        if !name.is_empty() {
            self.display_name = name.to_string();
        }
    }

    /// Keep only `targets` active; every other configured check becomes Ignore.
    /// An empty target list leaves the configuration untouched.
    pub fn restrict_checks(&mut self, targets: &[String]) {
        if targets.is_empty() {
            return;
        }

        let targets: BTreeSet<&str> = targets.iter().map(String::as_str).collect();
        for (check, severity) in self.checks.iter_mut() {
            if !targets.contains(check.as_str()) {
                *severity = Severity::Ignore;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockFileSystem;

    #[test]
    fn test_restrict_checks_ignores_others() {
        let mut config = AuditConfiguration {
            checks: BTreeMap::from([
                ("foo".to_string(), Severity::Danger),
                ("bar".to_string(), Severity::Warning),
            ]),
            ..AuditConfiguration::default()
        };

        config.restrict_checks(&["foo".to_string()]);

        assert_eq!(config.severity("foo"), Severity::Danger);
        assert_eq!(config.severity("bar"), Severity::Ignore);
    }

    #[test]
    fn test_restrict_checks_empty_is_noop() {
        let mut config = AuditConfiguration::default();
        let before = config.clone();
        config.restrict_checks(&[]);
        assert_eq!(config, before);
    }

    #[test]
    fn test_display_name_override_skips_empty() {
        let mut config = AuditConfiguration {
            display_name: "from-file".to_string(),
            ..AuditConfiguration::default()
        };

        config.set_display_name("");
        assert_eq!(config.display_name, "from-file");

        config.set_display_name("prod");
        assert_eq!(config.display_name, "prod");
    }

    #[test]
    fn test_from_yaml_merges_with_defaults() {
        let config = AuditConfiguration::from_yaml(
            "displayName: staging\nchecks:\n  hostNetworkSet: danger\n  tagNotSpecified: ignore\n",
        )
        .unwrap();

        assert_eq!(config.display_name, "staging");
        assert_eq!(config.severity("hostNetworkSet"), Severity::Danger);
        assert_eq!(config.severity("tagNotSpecified"), Severity::Ignore);
        assert_eq!(config.severity("hostIPCSet"), Severity::Danger);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_severity() {
        let result = AuditConfiguration::from_yaml("checks:\n  hostIPCSet: critical\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let fs = MockFileSystem::new();
        assert!(AuditConfiguration::from_file(&fs, Path::new("/nope.yaml")).is_err());
    }

    #[test]
    fn test_unknown_check_is_ignored() {
        let config = AuditConfiguration::default();
        assert_eq!(config.severity("noSuchCheck"), Severity::Ignore);
    }
}
