use super::{close, list, open};
use clap::{ArgAction, Parser, Subcommand};

const VERSION_INFO: &str = env!("PORTCTL_BUILD_VERSION");

#[derive(Parser, Debug)]
#[command(name = "portctl")]
#[command(
    about = "Open and close ports across firewalld and SELinux in one step",
    long_about = None,
    version = VERSION_INFO
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open ports in the firewall, optionally labeling them for SELinux
    Open(open::Open),

    /// Close ports and clean up their SELinux labels
    Close(close::Close),

    /// Show open ports, rich rules and well-known SELinux port labels
    List(list::List),
}
