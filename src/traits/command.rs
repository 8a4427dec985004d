use anyhow::{Context, Result};
use std::process::Command;

/// Captured result of an external process
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// All of stdout, then all of stderr. The two streams are captured
    /// separately, so their relative interleaving is not preserved.
    pub combined: String,
    pub stdout: String,
}

#[cfg(test)]
impl CommandOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            combined: stdout.to_string(),
            stdout: stdout.to_string(),
        }
    }

    pub fn failed(exit_code: i32, combined: &str) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            combined: combined.to_string(),
            stdout: String::new(),
        }
    }
}

/// Trait for executing system commands, allowing for mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run a program with arguments and capture its output.
    ///
    /// A non-zero exit is reported through `CommandOutput::success`, not as
    /// an error; `Err` means the process could not be started at all.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Real command executor using std::process::Command
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute '{}'", program))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            combined: format!("{}{}", stdout, stderr),
            stdout,
        })
    }
}

/// Mock command executor for testing
#[cfg(test)]
pub struct MockCommandExecutor {
    /// Pre-configured outputs, matched on program name and the first argument
    outputs: std::sync::Mutex<Vec<MockCommandResult>>,
    invocations: std::sync::Mutex<Vec<Vec<String>>>,
}

#[cfg(test)]
#[derive(Clone, Debug)]
pub struct MockCommandResult {
    pub program: String,
    pub first_arg: String,
    pub output: CommandOutput,
}

#[cfg(test)]
impl MockCommandResult {
    pub fn new(program: &str, first_arg: &str, output: CommandOutput) -> Self {
        Self {
            program: program.to_string(),
            first_arg: first_arg.to_string(),
            output,
        }
    }
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self {
            outputs: std::sync::Mutex::new(Vec::new()),
            invocations: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_outputs(outputs: Vec<MockCommandResult>) -> Self {
        Self {
            outputs: std::sync::Mutex::new(outputs),
            invocations: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Every argv seen so far, program name first
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl CommandExecutor for MockCommandExecutor {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().cloned());
        self.invocations.lock().unwrap().push(argv);

        let first = args.first().map(String::as_str).unwrap_or("");
        let mut outputs = self.outputs.lock().unwrap();

        if let Some(pos) = outputs
            .iter()
            .position(|r| r.program == program && r.first_arg == first)
        {
            return Ok(outputs.remove(pos).output);
        }

        // Default: successful empty output
        Ok(CommandOutput::ok(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_returns_configured_output() {
        let executor = MockCommandExecutor::with_outputs(vec![MockCommandResult::new(
            "helm",
            "template",
            CommandOutput::ok("rendered"),
        )]);

        let output = executor
            .run("helm", &["template".to_string(), "chart".to_string()])
            .unwrap();
        assert_eq!(output.stdout, "rendered");
    }

    #[test]
    fn test_mock_executor_default_success() {
        let executor = MockCommandExecutor::new();
        let output = executor.run("unknown", &[]).unwrap();
        assert!(output.success);
    }

    #[test]
    fn test_mock_executor_records_invocations() {
        let executor = MockCommandExecutor::new();
        executor.run("kubectl", &["version".to_string()]).unwrap();

        assert_eq!(
            executor.invocations(),
            vec![vec!["kubectl".to_string(), "version".to_string()]]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_real_executor_combined_is_stdout_then_stderr() {
        let executor = RealCommandExecutor::new();
        let output = executor
            .run(
                "sh",
                &[
                    "-c".to_string(),
                    "echo first >&2; echo second; exit 2".to_string(),
                ],
            )
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(2));
        assert_eq!(output.stdout, "second\n");
        assert_eq!(output.combined, "second\nfirst\n");
    }

    #[test]
    fn test_real_executor_missing_binary_is_error() {
        let executor = RealCommandExecutor::new();
        let result = executor.run("definitely-not-a-real-binary-polaris", &[]);
        assert!(result.is_err());
    }
}
