//! CLI library components for the call-record pipeline.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
