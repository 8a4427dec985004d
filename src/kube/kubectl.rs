use crate::error::AuditError;
use crate::traits::CommandExecutor;
use anyhow::{Context, Result};
use serde_json::Value;

/// Thin JSON front-end over the `kubectl` binary
pub struct Kubectl<'a> {
    command: &'a dyn CommandExecutor,
}

impl<'a> Kubectl<'a> {
    pub fn new(command: &'a dyn CommandExecutor) -> Self {
        Self { command }
    }

    /// Run `kubectl <args> -o json` and decode the result
    pub fn get_json(&self, args: &[&str]) -> Result<Value> {
        let mut argv: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        argv.push("-o".to_string());
        argv.push("json".to_string());

        let output = self.command.run("kubectl", &argv)?;
        if !output.success {
            return Err(AuditError::CommandFailed {
                command: format!("kubectl {}", argv.join(" ")),
                exit_code: output.exit_code,
                output: output.combined,
            }
            .into());
        }

        serde_json::from_str(&output.stdout)
            .with_context(|| format!("Failed to decode output of 'kubectl {}'", argv.join(" ")))
    }

    /// `items` of a list response
    pub fn get_items(&self, args: &[&str]) -> Result<Vec<Value>> {
        let list = self.get_json(args)?;
        match list.get("items") {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn server_version(&self) -> Result<String> {
        let version = self.get_json(&["version"])?;
        Ok(version
            .pointer("/serverVersion/gitVersion")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{CommandOutput, MockCommandExecutor, MockCommandResult};

    #[test]
    fn test_server_version() {
        let executor = MockCommandExecutor::with_outputs(vec![MockCommandResult::new(
            "kubectl",
            "version",
            CommandOutput::ok(r#"{"serverVersion":{"gitVersion":"v1.29.2"}}"#),
        )]);

        let kubectl = Kubectl::new(&executor);
        assert_eq!(kubectl.server_version().unwrap(), "v1.29.2");
        assert_eq!(
            executor.invocations()[0],
            vec!["kubectl", "version", "-o", "json"]
        );
    }

    #[test]
    fn test_failure_carries_output() {
        let executor = MockCommandExecutor::with_outputs(vec![MockCommandResult::new(
            "kubectl",
            "get",
            CommandOutput::failed(1, "error: the server doesn't have a resource type"),
        )]);

        let err = Kubectl::new(&executor)
            .get_items(&["get", "widgets"])
            .unwrap_err();

        assert!(err.to_string().contains("doesn't have a resource type"));
    }

    #[test]
    fn test_get_items_on_non_list() {
        let executor = MockCommandExecutor::with_outputs(vec![MockCommandResult::new(
            "kubectl",
            "get",
            CommandOutput::ok(r#"{"kind":"Pod"}"#),
        )]);

        let items = Kubectl::new(&executor).get_items(&["get", "pod"]).unwrap();
        assert!(items.is_empty());
    }
}
