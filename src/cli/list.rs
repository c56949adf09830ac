use super::common::print_list_report;
use super::error::CliError;
use super::parser::Cli;
use crate::executor::LocalCommandExecutor;
use crate::orchestrator::{Orchestrator, Request};
use clap::Args;
use tracing::instrument;

#[derive(Debug, Args)]
pub struct List {
    /// Firewalld zone to inspect (defaults to the default zone)
    #[arg(long)]
    zone: Option<String>,
}

impl List {
    #[instrument(name = "list", skip(self, _cli_args))]
    pub async fn run(&self, _cli_args: &Cli) -> Result<(), CliError> {
        let request = Request {
            ports: Vec::new(),
            zone: self.zone.clone(),
            source: None,
            se_type: None,
            keep_selinux: false,
            dry_run: false,
        };

        let mut executor = LocalCommandExecutor::new();
        let mut orchestrator = Orchestrator::new(&mut executor, request);
        let report = orchestrator.list().await?;

        print_list_report(&report);
        Ok(())
    }
}
