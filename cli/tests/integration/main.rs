//! Integration tests for ecsbase CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! Every test works inside its own temporary project directory.

mod cli_tests;
mod config_command;
mod exports_command;
mod project;
