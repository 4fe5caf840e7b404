//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::process`.
//! All functions are synchronous and take data in, returning data out.

pub mod cidr;
pub mod compose;
pub mod config;
pub mod error;
pub mod iam;
pub mod mesh;
pub mod network;
pub mod stack;
pub mod task;
pub mod value;

#[allow(unused_imports)]
pub use compose::{BaseStack, compose_base_stack};
#[allow(unused_imports)]
pub use config::{StackConfig, apply_config_value, validate_config_key, validate_config_value};
#[allow(unused_imports)]
pub use error::{CidrError, ConfigError, SynthError};
#[allow(unused_imports)]
pub use stack::{DeployEnvironment, Stack, Template};
