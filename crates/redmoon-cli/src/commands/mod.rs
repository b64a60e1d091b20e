pub mod config;
pub mod monitor;
pub mod run;
pub mod schedule;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
