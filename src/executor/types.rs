use std::string::FromUtf8Error;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when processing or parsing command output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] FromUtf8Error),

    #[error("Output exceeds maximum size: {size} bytes")]
    OutputTooLarge { size: usize },
}

/// Contains the raw output (stdout/stderr), exit code, timing information, etc.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: u32,
    pub duration: Duration,
}

impl Default for CommandOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandOutput {
    const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024; // 10 MB

    pub fn new() -> Self {
        Self {
            stdout: vec![],
            stderr: vec![],
            exit_code: 0,
            duration: Duration::default(),
        }
    }

    /// Convert stdout bytes to UTF-8 string
    pub fn to_stdout_string(&self) -> Result<String, OutputError> {
        if self.stdout.len() > Self::MAX_OUTPUT_SIZE {
            return Err(OutputError::OutputTooLarge {
                size: self.stdout.len(),
            });
        }
        Ok(String::from_utf8(self.stdout.clone())?)
    }

    /// Convert stderr bytes to UTF-8 string
    pub fn to_stderr_string(&self) -> Result<String, OutputError> {
        if self.stderr.len() > Self::MAX_OUTPUT_SIZE {
            return Err(OutputError::OutputTooLarge {
                size: self.stderr.len(),
            });
        }
        Ok(String::from_utf8(self.stderr.clone())?)
    }

    /// Split stdout into lines (trim and filter out empty lines).
    pub fn stdout_lines(&self) -> Result<Vec<String>, OutputError> {
        Ok(self
            .to_stdout_string()?
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Check if stderr contains a given pattern (simple substring).
    pub fn stderr_contains(&self, pattern: &str) -> bool {
        self.to_stderr_string()
            .map(|s| s.contains(pattern))
            .unwrap_or(false)
    }
}

/// Wraps the command that was run plus its resulting output.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub command: String,
    pub output: CommandOutput,
}

impl CommandResult {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            output: CommandOutput::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.output.exit_code == 0
    }
}
