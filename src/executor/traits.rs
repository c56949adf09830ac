use async_trait::async_trait;

use super::{CommandResult, ExecutorError};

/// A trait for executing commands in a uniform way, so the firewall, label
/// and container managers can be driven by a scripted executor in tests.
#[async_trait]
pub trait CommandExecutor {
    /// Execute a command line and return a `CommandResult` containing
    /// stdout/stderr/exit code.
    async fn execute_command(&mut self, command: &str) -> Result<CommandResult, ExecutorError>;
}
