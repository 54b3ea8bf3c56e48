use crate::domain::model::Invocation;
use crate::domain::ports::CommandRunner;
use crate::utils::error::{BootstrapError, Result};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Runs invocations as real child processes with inherited stdio.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        tracing::debug!(
            "Spawning [{}]: {}",
            invocation.step,
            invocation.command_line()
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for name in &invocation.env_remove {
            cmd.env_remove(name);
        }
        cmd.envs(&invocation.env);

        let status = cmd
            .status()
            .await
            .map_err(|source| BootstrapError::SpawnFailed {
                program: invocation.program.clone(),
                source,
            })?;

        let code = exit_code(status);
        tracing::debug!("[{}] exited with code {}", invocation.step, code);
        Ok(code)
    }
}

/// 與 shell 相同：被信號終止時回傳 128 + 信號編號
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_child_exit_code() {
        let runner = SystemRunner::new();
        let invocation = Invocation::new("check", "sh").args(["-c", "exit 7"]);
        assert_eq!(runner.run(&invocation).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_passes_environment_and_removals() {
        let runner = SystemRunner::new();
        let mut invocation = Invocation::new("check", "sh")
            .args(["-c", "[ \"$VB_CHECK\" = yes ] && [ -z \"${VB_GONE+x}\" ]"]);
        invocation.env.insert("VB_CHECK".to_string(), "yes".to_string());
        invocation.env_remove.push("VB_GONE".to_string());

        assert_eq!(runner.run(&invocation).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let runner = SystemRunner::new();
        let invocation = Invocation::new("check", "/nonexistent/venv-bootstrap-missing");
        let err = runner.run(&invocation).await.unwrap_err();

        assert!(matches!(err, BootstrapError::SpawnFailed { .. }));
        assert_eq!(err.exit_code(), 127);
    }
}
