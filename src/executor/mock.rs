//! Scripted executor for unit tests: canned responses per command line,
//! plus a record of every command the code under test issued.

use async_trait::async_trait;
use std::collections::HashMap;

use super::traits::CommandExecutor;
use super::types::CommandResult;
use super::ExecutorError;

pub struct MockExecutor {
    // Store Result directly to simulate execution errors
    responses: HashMap<String, Result<CommandResult, ExecutorError>>,
    pub commands: Vec<String>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            commands: Vec::new(),
        }
    }

    pub fn add_response(&mut self, command: &str, result: Result<CommandResult, ExecutorError>) {
        self.responses.insert(command.to_string(), result);
    }

    pub fn add_success(&mut self, command: &str, stdout: &str) {
        self.add_response(command, Ok(success_result(command, stdout)));
    }

    pub fn add_failure(&mut self, command: &str, exit_code: u32, stderr: &str) {
        let mut result = CommandResult::new(command);
        result.output.exit_code = exit_code;
        result.output.stderr = stderr.as_bytes().to_vec();
        self.add_response(command, Ok(result));
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute_command(&mut self, command: &str) -> Result<CommandResult, ExecutorError> {
        self.commands.push(command.to_string());
        let response = self.responses.get(command).cloned().ok_or_else(|| {
            ExecutorError::Other(format!("Mock response not found for command: {}", command))
        })?;
        response
    }
}

pub fn success_result(command: &str, stdout: &str) -> CommandResult {
    let mut result = CommandResult::new(command);
    result.output.stdout = stdout.as_bytes().to_vec();
    result.output.exit_code = 0;
    result
}
