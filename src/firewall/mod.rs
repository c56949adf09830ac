mod rich_rule;

pub use rich_rule::{Family, RichRule};

use thiserror::Error;
use tracing::{debug, info};

use crate::executor::{CommandExecutor, ExecutorError, OutputError};
use crate::port::PortSpec;

#[derive(Debug, Error)]
pub enum FirewallError {
    #[error("firewall-cmd not found in PATH - is firewalld installed?")]
    MissingFirewallCmd,

    #[error("firewalld is not running (firewall-cmd --state reported: {0})")]
    ServiceNotRunning(String),

    #[error("firewall command failed: '{cmd}': {message}")]
    CommandFailed { cmd: String, message: String },

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

pub type FirewallResult<T> = Result<T, FirewallError>;

/// Drives firewalld through `firewall-cmd`. All mutations target the
/// permanent configuration and only take effect after `reload`.
pub struct FirewalldManager<'a> {
    executor: &'a mut (dyn CommandExecutor + Send),
    zone: Option<String>,
    dry_run: bool,
}

impl<'a> FirewalldManager<'a> {
    pub fn new(
        executor: &'a mut (dyn CommandExecutor + Send),
        zone: Option<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            executor,
            zone,
            dry_run,
        }
    }

    /// Verify firewall-cmd exists and firewalld is up. Must pass before any
    /// mutation is attempted.
    pub async fn ensure_running(&mut self) -> FirewallResult<()> {
        let result = self.executor.execute_command("which firewall-cmd").await?;
        if !result.is_success() {
            return Err(FirewallError::MissingFirewallCmd);
        }

        let result = self.executor.execute_command("firewall-cmd --state").await?;
        let state = result.output.to_stdout_string()?.trim().to_string();
        if !result.is_success() || state != "running" {
            return Err(FirewallError::ServiceNotRunning(if state.is_empty() {
                result.output.to_stderr_string()?.trim().to_string()
            } else {
                state
            }));
        }
        Ok(())
    }

    pub async fn add_port(&mut self, spec: &PortSpec) -> FirewallResult<()> {
        let cmd = format!(
            "firewall-cmd --permanent{} --add-port={}",
            self.zone_flag(),
            spec
        );
        self.mutate(&cmd).await
    }

    pub async fn remove_port(&mut self, spec: &PortSpec) -> FirewallResult<()> {
        let cmd = format!(
            "firewall-cmd --permanent{} --remove-port={}",
            self.zone_flag(),
            spec
        );
        self.mutate_tolerant(&cmd).await
    }

    pub async fn add_rich_rule(&mut self, rule: &RichRule) -> FirewallResult<()> {
        let cmd = format!(
            "firewall-cmd --permanent{} --add-rich-rule='{}'",
            self.zone_flag(),
            rule
        );
        self.mutate(&cmd).await
    }

    pub async fn remove_rich_rule(&mut self, rule: &RichRule) -> FirewallResult<()> {
        let cmd = format!(
            "firewall-cmd --permanent{} --remove-rich-rule='{}'",
            self.zone_flag(),
            rule
        );
        self.mutate_tolerant(&cmd).await
    }

    /// Permanent changes have no runtime effect until reloaded.
    pub async fn reload(&mut self) -> FirewallResult<()> {
        self.mutate("firewall-cmd --reload").await
    }

    /// Name of the zone firewalld falls back to when none is given.
    pub async fn default_zone(&mut self) -> FirewallResult<String> {
        let cmd = "firewall-cmd --get-default-zone";
        let result = self.executor.execute_command(cmd).await?;
        if !result.is_success() {
            return Err(FirewallError::CommandFailed {
                cmd: cmd.to_string(),
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(result.output.to_stdout_string()?.trim().to_string())
    }

    /// Currently open plain ports for the zone (runtime view).
    pub async fn list_ports(&mut self) -> FirewallResult<Vec<String>> {
        let cmd = format!("firewall-cmd{} --list-ports", self.zone_flag());
        let result = self.executor.execute_command(&cmd).await?;
        if !result.is_success() {
            return Err(FirewallError::CommandFailed {
                cmd,
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(result
            .output
            .to_stdout_string()?
            .split_whitespace()
            .map(|s| s.to_string())
            .collect())
    }

    /// Currently active rich rules for the zone, one per line.
    pub async fn list_rich_rules(&mut self) -> FirewallResult<Vec<String>> {
        let cmd = format!("firewall-cmd{} --list-rich-rules", self.zone_flag());
        let result = self.executor.execute_command(&cmd).await?;
        if !result.is_success() {
            return Err(FirewallError::CommandFailed {
                cmd,
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(result.output.stdout_lines()?)
    }

    fn zone_flag(&self) -> String {
        match &self.zone {
            Some(zone) => format!(" --zone={}", zone),
            None => String::new(),
        }
    }

    async fn mutate(&mut self, cmd: &str) -> FirewallResult<()> {
        if self.dry_run {
            info!("(dry-run) would execute '{}'", cmd);
            return Ok(());
        }

        let result = self.executor.execute_command(cmd).await?;
        if !result.is_success() {
            return Err(FirewallError::CommandFailed {
                cmd: cmd.to_string(),
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(())
    }

    /// Like `mutate`, but removing something that is not there is fine.
    async fn mutate_tolerant(&mut self, cmd: &str) -> FirewallResult<()> {
        if self.dry_run {
            info!("(dry-run) would execute '{}'", cmd);
            return Ok(());
        }

        let result = self.executor.execute_command(cmd).await?;
        if !result.is_success() {
            if result.output.stderr_contains("NOT_ENABLED") {
                debug!("Nothing to remove for '{}', treating as success", cmd);
                return Ok(());
            }
            return Err(FirewallError::CommandFailed {
                cmd: cmd.to_string(),
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(())
    }
}
