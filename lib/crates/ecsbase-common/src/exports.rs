//! Cross-stack export names.
//!
//! Every value a downstream stack may consume is published under one of these
//! names and imported with `Fn::ImportValue` using the exact same string. The
//! strings are a wire contract: renaming a variant is fine, changing its
//! `as_str()` breaks every importing stack.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a known export name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown export name '{0}'")]
pub struct UnknownExport(pub String);

/// Closed set of export names published by the base stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ExportName {
    /// ARN of the private DNS namespace.
    #[serde(rename = "NSARN")]
    #[cfg_attr(feature = "clap", value(name = "NSARN"))]
    NsArn,
    /// Name of the private DNS namespace.
    #[serde(rename = "NSNAME")]
    #[cfg_attr(feature = "clap", value(name = "NSNAME"))]
    NsName,
    /// ID of the private DNS namespace.
    #[serde(rename = "NSID")]
    #[cfg_attr(feature = "clap", value(name = "NSID"))]
    NsId,
    /// Security group allowing frontend-to-backend traffic on port 3000.
    #[serde(rename = "SecGrpId")]
    #[cfg_attr(feature = "clap", value(name = "SecGrpId"))]
    SecGrpId,
    /// ECS cluster name.
    #[serde(rename = "ECSClusterName")]
    #[cfg_attr(feature = "clap", value(name = "ECSClusterName"))]
    EcsClusterName,
    /// Same security group as `SecGrpId`, under the name service stacks use.
    #[serde(rename = "ServicesSecGrp")]
    #[cfg_attr(feature = "clap", value(name = "ServicesSecGrp"))]
    ServicesSecGrp,
    /// DNS name of the mesh gateway's network load balancer.
    #[serde(rename = "MeshGwNlbDns")]
    #[cfg_attr(feature = "clap", value(name = "MeshGwNlbDns"))]
    MeshGwNlbDns,
    /// ARN of the service mesh.
    #[serde(rename = "MeshArn")]
    #[cfg_attr(feature = "clap", value(name = "MeshArn"))]
    MeshArn,
    /// Name of the service mesh.
    #[serde(rename = "MeshName")]
    #[cfg_attr(feature = "clap", value(name = "MeshName"))]
    MeshName,
    /// ARN of the ECS service running the gateway proxy.
    #[serde(rename = "MeshEnvoyServiceArn")]
    #[cfg_attr(feature = "clap", value(name = "MeshEnvoyServiceArn"))]
    MeshEnvoyServiceArn,
    /// ARN of the virtual gateway.
    #[serde(rename = "MeshVGWArn")]
    #[cfg_attr(feature = "clap", value(name = "MeshVGWArn"))]
    MeshVgwArn,
    /// Name of the virtual gateway.
    #[serde(rename = "MeshVGWName")]
    #[cfg_attr(feature = "clap", value(name = "MeshVGWName"))]
    MeshVgwName,
}

impl ExportName {
    /// Every export name, in the order the base stack declares them.
    pub const ALL: [ExportName; 12] = [
        ExportName::NsArn,
        ExportName::NsName,
        ExportName::NsId,
        ExportName::SecGrpId,
        ExportName::EcsClusterName,
        ExportName::ServicesSecGrp,
        ExportName::MeshGwNlbDns,
        ExportName::MeshArn,
        ExportName::MeshName,
        ExportName::MeshEnvoyServiceArn,
        ExportName::MeshVgwArn,
        ExportName::MeshVgwName,
    ];

    /// The exact string published in the template's `Export.Name`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ExportName::NsArn => "NSARN",
            ExportName::NsName => "NSNAME",
            ExportName::NsId => "NSID",
            ExportName::SecGrpId => "SecGrpId",
            ExportName::EcsClusterName => "ECSClusterName",
            ExportName::ServicesSecGrp => "ServicesSecGrp",
            ExportName::MeshGwNlbDns => "MeshGwNlbDns",
            ExportName::MeshArn => "MeshArn",
            ExportName::MeshName => "MeshName",
            ExportName::MeshEnvoyServiceArn => "MeshEnvoyServiceArn",
            ExportName::MeshVgwArn => "MeshVGWArn",
            ExportName::MeshVgwName => "MeshVGWName",
        }
    }

    /// Whether the export is only published when the mesh gateway is enabled.
    #[must_use]
    pub const fn is_mesh(self) -> bool {
        matches!(
            self,
            ExportName::MeshGwNlbDns
                | ExportName::MeshArn
                | ExportName::MeshName
                | ExportName::MeshEnvoyServiceArn
                | ExportName::MeshVgwArn
                | ExportName::MeshVgwName
        )
    }

    /// The `Fn::ImportValue` fragment a consuming template embeds.
    #[must_use]
    pub fn import_value(self) -> serde_json::Value {
        serde_json::json!({ "Fn::ImportValue": self.as_str() })
    }
}

impl fmt::Display for ExportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportName {
    type Err = UnknownExport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownExport(s.to_string()))
    }
}
