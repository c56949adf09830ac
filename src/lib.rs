pub mod audit;
pub mod cli;
pub mod containers;
pub mod executor;
pub mod firewall;
pub mod orchestrator;
pub mod port;
pub mod selinux;
