use std::fmt;
use std::process::Command;

use crate::error::PipelineError;

/// One external command: a program plus its ordered argument vector.
/// Arguments are passed to the process spawn directly, never through a
/// shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    Success,
    Failure(Option<i32>),
}

impl ToolExit {
    pub fn success(self) -> bool {
        matches!(self, ToolExit::Success)
    }
}

/// Runs one external command synchronously and reports only the
/// success/failure signal. `Err` means the child could not be spawned at
/// all; a failing child is an `Ok(Failure)`.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolExit, PipelineError>;
}

/// Spawns the command on the host, inheriting stdio so tool output streams
/// into the batch log.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolExit, PipelineError> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|err| PipelineError::ToolLaunch {
                tool: invocation.program.clone(),
                message: err.to_string(),
            })?;
        if status.success() {
            Ok(ToolExit::Success)
        } else {
            Ok(ToolExit::Failure(status.code()))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn invocation_display() {
        let invocation = ToolInvocation::new("prefetch")
            .arg("SRR000001")
            .arg("--output-directory")
            .arg("/tmp");
        assert_eq!(
            invocation.to_string(),
            "prefetch SRR000001 --output-directory /tmp"
        );
    }

    #[test]
    fn launch_failure_is_an_error() {
        let runner = SystemToolRunner;
        let invocation = ToolInvocation::new("definitely-not-a-real-program-7f3a");
        let err = runner.run(&invocation).unwrap_err();
        assert_matches!(err, PipelineError::ToolLaunch { .. });
    }

    #[test]
    fn nonzero_exit_is_a_failure_not_an_error() {
        let runner = SystemToolRunner;
        let invocation = ToolInvocation::new("false");
        let exit = runner.run(&invocation).unwrap();
        assert_matches!(exit, ToolExit::Failure(_));
        assert!(!exit.success());
    }
}
