mod parser;

pub use parser::{parse_port_listing, PortLabelMapping, PortRange};

use thiserror::Error;
use tracing::{debug, info};

use crate::executor::{CommandExecutor, ExecutorError, OutputError};
use crate::port::PortSpec;

#[derive(Debug, Error)]
pub enum SelinuxError {
    #[error("semanage not found in PATH - install the policycoreutils python utilities")]
    MissingSemanage,

    #[error("semanage command failed: '{cmd}': {message}")]
    CommandFailed { cmd: String, message: String },

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

pub type SelinuxResult<T> = Result<T, SelinuxError>;

/// The action the reconciler decided on for a (type, protocol, port) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAction {
    /// Create a brand-new type association (`semanage port -a`).
    Add,
    /// Extend an existing type with another port (`semanage port -m`).
    Modify,
    /// Remove the port from the type (`semanage port -d`).
    Delete,
    /// State already matches the request.
    Noop,
}

/// Decide how to bring a port under `se_type`. The label store treats
/// creating a new type association and extending an existing one as different
/// operations, and errors when they are conflated, so existence is checked
/// before picking one.
pub fn plan_add(mappings: &[PortLabelMapping], se_type: &str, spec: &PortSpec) -> LabelAction {
    if pair_present(mappings, se_type, spec) {
        return LabelAction::Noop;
    }
    if mappings.iter().any(|m| m.se_type == se_type) {
        LabelAction::Modify
    } else {
        LabelAction::Add
    }
}

/// Decide how to take a port out from under `se_type`. Absent state is a
/// no-op, never an error, so removal is safe to repeat.
pub fn plan_remove(mappings: &[PortLabelMapping], se_type: &str, spec: &PortSpec) -> LabelAction {
    if pair_present(mappings, se_type, spec) {
        LabelAction::Delete
    } else {
        LabelAction::Noop
    }
}

fn pair_present(mappings: &[PortLabelMapping], se_type: &str, spec: &PortSpec) -> bool {
    mappings
        .iter()
        .any(|m| m.se_type == se_type && m.protocol == spec.protocol && m.covers(spec.number))
}

/// Reconciles SELinux port-type labels through `semanage port`.
pub struct SelinuxManager<'a> {
    executor: &'a mut (dyn CommandExecutor + Send),
    dry_run: bool,
}

impl<'a> SelinuxManager<'a> {
    pub fn new(executor: &'a mut (dyn CommandExecutor + Send), dry_run: bool) -> Self {
        Self { executor, dry_run }
    }

    /// Fail before any mutation if the label tooling is not installed.
    pub async fn ensure_tooling(&mut self) -> SelinuxResult<()> {
        let result = self.executor.execute_command("which semanage").await?;
        if !result.is_success() {
            return Err(SelinuxError::MissingSemanage);
        }
        Ok(())
    }

    /// Full port-label table, parsed from `semanage port -l`.
    pub async fn list_mappings(&mut self) -> SelinuxResult<Vec<PortLabelMapping>> {
        let cmd = "semanage port -l";
        let result = self.executor.execute_command(cmd).await?;
        if !result.is_success() {
            return Err(SelinuxError::CommandFailed {
                cmd: cmd.to_string(),
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(parse_port_listing(&result.output.to_stdout_string()?))
    }

    /// Idempotently associate `spec` with `se_type`. Returns the action taken.
    pub async fn reconcile_add(
        &mut self,
        se_type: &str,
        spec: &PortSpec,
    ) -> SelinuxResult<LabelAction> {
        let mappings = self.list_mappings().await?;
        let action = plan_add(&mappings, se_type, spec);

        match action {
            LabelAction::Add => {
                let cmd = format!(
                    "semanage port -a -t {} -p {} {}",
                    se_type, spec.protocol, spec.number
                );
                self.apply(&cmd).await?;
            }
            LabelAction::Modify => {
                let cmd = format!(
                    "semanage port -m -t {} -p {} {}",
                    se_type, spec.protocol, spec.number
                );
                self.apply(&cmd).await?;
            }
            LabelAction::Noop => {
                debug!("{} already labeled {}, nothing to do", spec, se_type);
            }
            LabelAction::Delete => unreachable!("plan_add never plans a delete"),
        }

        Ok(action)
    }

    /// Idempotently drop the `spec` -> `se_type` association if present.
    pub async fn reconcile_remove(
        &mut self,
        se_type: &str,
        spec: &PortSpec,
    ) -> SelinuxResult<LabelAction> {
        let mappings = self.list_mappings().await?;
        let action = plan_remove(&mappings, se_type, spec);

        match action {
            LabelAction::Delete => {
                let cmd = format!(
                    "semanage port -d -t {} -p {} {}",
                    se_type, spec.protocol, spec.number
                );
                self.apply_tolerant(&cmd).await?;
            }
            LabelAction::Noop => {
                debug!("{} not labeled {}, nothing to remove", spec, se_type);
            }
            _ => unreachable!("plan_remove only plans delete or noop"),
        }

        Ok(action)
    }

    async fn apply(&mut self, cmd: &str) -> SelinuxResult<()> {
        if self.dry_run {
            info!("(dry-run) would execute '{}'", cmd);
            return Ok(());
        }

        let result = self.executor.execute_command(cmd).await?;
        if !result.is_success() {
            return Err(SelinuxError::CommandFailed {
                cmd: cmd.to_string(),
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(())
    }

    /// Deleting a mapping that is gone (or only covered by a range the type
    /// owns) is not an error.
    async fn apply_tolerant(&mut self, cmd: &str) -> SelinuxResult<()> {
        if self.dry_run {
            info!("(dry-run) would execute '{}'", cmd);
            return Ok(());
        }

        let result = self.executor.execute_command(cmd).await?;
        if !result.is_success() {
            if result.output.stderr_contains("not defined") {
                debug!("Mapping already gone for '{}', treating as success", cmd);
                return Ok(());
            }
            return Err(SelinuxError::CommandFailed {
                cmd: cmd.to_string(),
                message: result.output.to_stderr_string()?,
            });
        }
        Ok(())
    }
}
