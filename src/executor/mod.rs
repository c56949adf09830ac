pub mod error;
pub mod local_executor;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use error::ExecutorError;
pub use local_executor::LocalCommandExecutor;
pub use traits::CommandExecutor;
pub use types::{CommandOutput, CommandResult, OutputError};
