//! Voice booster command-line control surface
//!
//! Configuration loading and the line-command interpreter used by the
//! `booster` binary.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{execute, Command, Flow};
pub use config::BoosterConfig;
pub use error::{CliError, Result};
