//! Domain types and validators for the stack configuration.
//!
//! Pure functions only, no I/O, no filesystem access.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::cidr::Ipv4Cidr;
use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "stack.name",
    "network.cidr",
    "network.max_azs",
    "cluster.name",
    "mesh.enabled",
    "mesh.tracing",
    "bastion.instance_type",
    "bastion.user_data",
];
pub const VALID_BOOLS: &[&str] = &["true", "false"];
pub const MAX_AZS_RANGE: std::ops::RangeInclusive<u8> = 1..=6;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `ecsbase.yaml`.
///
/// Every section defaults to the values of the reference deployment, so an
/// empty file (or no file) synthesizes the full stack.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StackConfig {
    pub stack: StackSection,
    pub network: NetworkConfig,
    pub cluster: ClusterConfig,
    pub bastion: BastionConfig,
    pub mesh: MeshConfig,
    /// Top-level sections this version does not know, kept so that
    /// `config set` writes them back untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl StackConfig {
    /// Current value of a settable key, in the form `config set` accepts.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "stack.name" => self.stack.name.clone(),
            "network.cidr" => self.network.cidr.clone(),
            "network.max_azs" => self.network.max_azs.to_string(),
            "cluster.name" => self.cluster.name.clone(),
            "mesh.enabled" => self.mesh.enabled.to_string(),
            "mesh.tracing" => self.mesh.tracing.to_string(),
            "bastion.instance_type" => self.bastion.instance_type.clone(),
            "bastion.user_data" => self.bastion.user_data.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Run every settable key's value validator, so a hand-edited file is
    /// held to the same rules as `config set`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::InvalidValue`] for the first invalid key.
    pub fn validate(&self) -> Result<()> {
        for key in VALID_CONFIG_KEYS {
            if let Some(value) = self.get(key) {
                validate_config_value(key, &value)?;
            }
        }
        Ok(())
    }
}

/// Stack identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StackSection {
    /// Stack name; also prefixes the bastion's `Name` tag.
    pub name: String,
    /// Template description.
    pub description: String,
}

impl Default for StackSection {
    fn default() -> Self {
        Self {
            name: "ecsworkshop-base".to_string(),
            description: "VPC, ECS cluster and App Mesh gateway for the ECS workshop".to_string(),
        }
    }
}

/// VPC layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// VPC CIDR, split evenly into public and private subnets.
    pub cidr: String,
    /// Number of availability zones to spread subnets over.
    pub max_azs: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cidr: "10.0.0.0/24".to_string(),
            max_azs: 2,
        }
    }
}

/// ECS cluster and its Cloud Map namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClusterConfig {
    pub name: String,
    pub container_insights: bool,
    /// Private DNS namespace registered as the cluster default.
    pub namespace: String,
    /// Port services accept traffic on from each other.
    pub services_port: u16,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: "container-demo".to_string(),
            container_insights: true,
            namespace: "service.local".to_string(),
            services_port: 3000,
        }
    }
}

/// Stress-tool bastion host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BastionConfig {
    pub instance_type: String,
    /// Boot script, relative to the config file's directory.
    pub user_data: String,
}

impl Default for BastionConfig {
    fn default() -> Self {
        Self {
            instance_type: "t3.medium".to_string(),
            user_data: "stresstool_user_data.sh".to_string(),
        }
    }
}

/// App Mesh gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeshConfig {
    /// Declare the mesh gateway at all.
    pub enabled: bool,
    /// Run the X-Ray daemon side-car next to the proxy.
    pub tracing: bool,
    pub name: String,
    pub gateway_name: String,
    pub envoy_image: String,
    pub xray_image: String,
    pub desired_count: u32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tracing: true,
            name: "ecs-mesh".to_string(),
            gateway_name: "ecsworkshop-vgw".to_string(),
            envoy_image: "public.ecr.aws/appmesh/aws-appmesh-envoy:v1.23.1.0-prod".to_string(),
            xray_image: "amazon/aws-xray-daemon".to_string(),
            desired_count: 1,
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: valid.to_string(),
    };
    match key {
        "mesh.enabled" | "mesh.tracing" if !VALID_BOOLS.contains(&value) => {
            Err(invalid(&VALID_BOOLS.join(", ")).into())
        }
        "network.cidr" if value.parse::<Ipv4Cidr>().is_err() => {
            Err(invalid("an IPv4 CIDR between /16 and /28, e.g. 10.0.0.0/24").into())
        }
        "network.max_azs"
            if !value
                .parse::<u8>()
                .is_ok_and(|n| MAX_AZS_RANGE.contains(&n)) =>
        {
            Err(invalid("1..6").into())
        }
        "stack.name" if !is_valid_stack_name(value) => Err(invalid(
            "1-128 characters, a letter first, then letters, digits or '-'",
        )
        .into()),
        "cluster.name" | "bastion.instance_type" | "bastion.user_data"
            if value.trim().is_empty() =>
        {
            Err(invalid("a non-empty string").into())
        }
        _ => Ok(()),
    }
}

/// Apply one validated key/value pair to the config.
///
/// # Errors
///
/// Returns an error if the key is unknown or the value is invalid for it.
pub fn apply_config_value(config: &mut StackConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    match key {
        "stack.name" => config.stack.name = value.to_string(),
        "network.cidr" => config.network.cidr = value.to_string(),
        "network.max_azs" => config.network.max_azs = value.parse()?,
        "cluster.name" => config.cluster.name = value.to_string(),
        "mesh.enabled" => config.mesh.enabled = value == "true",
        "mesh.tracing" => config.mesh.tracing = value == "true",
        "bastion.instance_type" => config.bastion.instance_type = value.to_string(),
        "bastion.user_data" => config.bastion.user_data = value.to_string(),
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

/// CloudFormation stack names: a letter, then up to 127 letters, digits or hyphens.
#[must_use]
pub fn is_valid_stack_name(name: &str) -> bool {
    let mut chars = name.chars();
    name.len() <= 128
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// ── Unit tests ───────────────────────────────────────────────────────────────
