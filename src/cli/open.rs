use super::error::CliError;
use super::parser::Cli;
use super::ui;
use crate::executor::LocalCommandExecutor;
use crate::orchestrator::{Orchestrator, Request};
use crate::port::parse_port_tokens;
use clap::Args;
use tracing::{info, instrument};

#[derive(Debug, Args)]
pub struct Open {
    /// Ports to open, as <number>/<tcp|udp>
    #[arg(required = true, value_name = "PORT/PROTO")]
    ports: Vec<String>,

    /// SELinux port type to associate (e.g. ssh_port_t)
    #[arg(long = "type", value_name = "TYPE")]
    se_type: Option<String>,

    /// Firewalld zone (defaults to the default zone)
    #[arg(long)]
    zone: Option<String>,

    /// Restrict access to a source network (CIDR); applied as a rich rule
    #[arg(long, value_name = "CIDR")]
    source: Option<String>,

    /// Print what would be done without changing anything
    #[arg(long)]
    dry_run: bool,
}

impl Open {
    #[instrument(name = "open", skip(self, _cli_args), fields(ports = ?self.ports))]
    pub async fn run(&self, _cli_args: &Cli) -> Result<(), CliError> {
        let ports = parse_port_tokens(&self.ports)?;

        let request = Request {
            ports,
            zone: self.zone.clone(),
            source: self.source.clone(),
            se_type: self.se_type.clone(),
            keep_selinux: false,
            dry_run: self.dry_run,
        };

        let mut executor = LocalCommandExecutor::new();
        let mut orchestrator = Orchestrator::new(&mut executor, request);
        orchestrator.open().await?;

        if self.dry_run {
            info!("{}", ui::format_warning("Dry run - nothing was changed."));
        } else {
            info!("{}", ui::format_success("All requested ports are open."));
        }
        Ok(())
    }
}
