//! Library surface of the batch binary, exposed for integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
