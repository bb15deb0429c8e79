//! ToxGuard CLI
//!
//! The `toxguard` binary: training, batch inference, corpus preparation and
//! production replay.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
