//! Library half of the `impact` command: configuration, logging and run
//! orchestration.

pub mod config;
pub mod logging;
pub mod runner;

pub use config::{RunConfig, RunSettings};
pub use runner::{ModifiedWindow, RunRequest, RunResult, execute_run};
