//! Unit tests for ecsbase CLI
//!
//! These tests use in-memory ports and run fast without external I/O.

mod architecture;
mod config_service;
mod mocks;
mod property_tests;
