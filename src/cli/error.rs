use thiserror::Error;

use crate::orchestrator::OrchestrateError;
use crate::port::PortSpecError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    InvalidPortSpec(#[from] PortSpecError),

    #[error("{0}")]
    Operation(#[from] OrchestrateError),
}
