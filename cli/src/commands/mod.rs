//! Command implementations

pub mod config;
pub mod exports;
pub mod resources;
pub mod synth;
pub mod version;
