use async_trait::async_trait;
use std::time::Instant;
use tokio::process::Command;

use super::error::ExecutorError;
use super::traits::CommandExecutor;
use super::types::{CommandOutput, CommandResult};

pub struct LocalCommandExecutor;

impl Default for LocalCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for LocalCommandExecutor {
    async fn execute_command(&mut self, command: &str) -> Result<CommandResult, ExecutorError> {
        if command.trim().is_empty() {
            return Err(ExecutorError::LocalError("No command provided".to_string()));
        }

        let start_time = Instant::now();

        // Run through the shell: rich-rule arguments carry quoted, space-laden
        // values that naive whitespace splitting would mangle.
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| ExecutorError::LocalError(e.to_string()))?;

        let mut cmd_output = CommandOutput::new();
        cmd_output.stdout = output.stdout;
        cmd_output.stderr = output.stderr;
        cmd_output.exit_code = output.status.code().unwrap_or_default() as u32;
        cmd_output.duration = start_time.elapsed();

        Ok(CommandResult {
            command: command.to_string(),
            output: cmd_output,
        })
    }
}
