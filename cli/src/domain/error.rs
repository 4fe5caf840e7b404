//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Synthesis errors ──────────────────────────────────────────────────────────

/// Violations of the construct-tree invariants, detected while declaring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("Construct ID must not be empty (under '{scope}')")]
    EmptyId { scope: String },

    #[error("Construct ID '{id}' must not contain '/'")]
    InvalidId { id: String },

    #[error("There is already a construct at path '{path}'")]
    DuplicatePath { path: String },

    #[error("Logical ID '{logical_id}' (from '{path}') is already used in this stack")]
    DuplicateLogicalId { logical_id: String, path: String },

    #[error(
        "'{from}' references '{target}', which is not declared earlier in this stack"
    )]
    UnresolvedReference { from: String, target: String },

    #[error("Export name '{0}' is already used by another output")]
    DuplicateExport(String),
}

// ── CIDR errors ───────────────────────────────────────────────────────────────

/// Errors from parsing and splitting IPv4 CIDR blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("Invalid CIDR '{0}': expected a.b.c.d/n")]
    Malformed(String),

    #[error("Invalid CIDR '{cidr}': prefix /{prefix} is outside /16../28")]
    PrefixOutOfRange { cidr: String, prefix: u8 },

    #[error("Invalid CIDR '{cidr}': host bits are set (did you mean {network}?)")]
    HostBitsSet { cidr: String, network: String },

    #[error(
        "CIDR '{cidr}' cannot hold {needed} subnets: they would be /{prefix}, smaller than /28"
    )]
    Exhausted { cidr: String, needed: usize, prefix: u8 },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
