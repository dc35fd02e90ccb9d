//! Launching external tools.

use std::future::Future;
use std::process::Stdio;

use super::command::CommandSpec;
use crate::error::SentinelError;

/// Result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts a non-zero exit into [`SentinelError::CommandFailed`].
    ///
    /// # Errors
    ///
    /// Returns the error when the process did not exit successfully.
    pub fn check(self, tool: &str) -> Result<Self, SentinelError> {
        if self.success() {
            Ok(self)
        } else {
            Err(SentinelError::CommandFailed {
                tool: tool.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs a [`CommandSpec`] to completion.
pub trait CommandRunner: Send + Sync {
    /// Runs the command and captures its output.
    ///
    /// A non-zero exit is not an error at this level.
    fn run(
        &self,
        spec: &CommandSpec,
    ) -> impl Future<Output = Result<CommandOutput, SentinelError>> + Send;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, SentinelError> {
        let output = tokio::process::Command::new(&spec.program)
            .args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SentinelError::Spawn {
                tool: spec.tool.clone(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec {
            tool: "sh".to_string(),
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            envs: vec![("PGPASSWORD".to_string(), "from-env".to_string())],
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let result = ProcessRunner
            .run(&sh("echo \"$PGPASSWORD\"; echo oops >&2; exit 3"))
            .await;
        let Ok(output) = result else {
            panic!("sh should launch");
        };
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "from-env");
        assert_eq!(output.stderr.trim(), "oops");
        assert!(!output.success());

        let Err(SentinelError::CommandFailed { tool, code, stderr }) = output.check("sh") else {
            panic!("non-zero exit should fail the check");
        };
        assert_eq!(tool, "sh");
        assert_eq!(code, Some(3));
        assert_eq!(stderr, "oops");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let spec = CommandSpec {
            tool: "pg_dump".to_string(),
            program: "/nonexistent/pg_dump-for-tests".to_string(),
            args: Vec::new(),
            envs: Vec::new(),
        };
        let result = ProcessRunner.run(&spec).await;
        assert!(matches!(result, Err(SentinelError::Spawn { tool, .. }) if tool == "pg_dump"));
    }
}
