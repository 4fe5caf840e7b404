//! The construct tree and its synthesis into a template.
//!
//! A [`Stack`] is the explicit context every composer receives. Composers
//! declare resources, parameters and outputs under a [`Scope`]; the stack
//! derives a stable logical ID from each construct path and checks the
//! declaration-order invariants as it goes:
//!
//! - construct paths and logical IDs are unique,
//! - a declaration may only reference resources and parameters declared
//!   before it,
//! - export names are unique.
//!
//! Dependency resolution at deploy time is the engine's job; nothing here
//! reorders declarations.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::error::SynthError;
use crate::domain::value::{LogicalId, Value};

/// Template format version emitted in every template.
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Metadata key recording the construct path of each resource.
pub const PATH_METADATA_KEY: &str = "ecsbase:path";

/// Template metadata key recording the deployment target.
pub const ENVIRONMENT_METADATA_KEY: &str = "ecsbase:environment";

/// Account and region the stack is synthesized for.
///
/// Both are optional; an unset field leaves the stack environment-agnostic.
/// Composers fall back to the `AWS::Region` pseudo parameter, and the
/// template's environment metadata names the unknown part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployEnvironment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl DeployEnvironment {
    /// `aws://<account>/<region>`, with `unknown-account` / `unknown-region`
    /// standing in for unset parts.
    #[must_use]
    pub fn target(&self) -> String {
        format!(
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.region.as_deref().unwrap_or("unknown-region")
        )
    }
}

/// A position in the construct tree. The root scope is the stack itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    path: Vec<String>,
}

impl Scope {
    /// The stack-level scope.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// A nested construct scope.
    #[must_use]
    pub fn child(&self, id: &str) -> Self {
        let mut path = self.path.clone();
        path.push(id.to_string());
        Self { path }
    }

    /// Path components below the stack.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.path
    }

    /// `/`-joined path, empty for the root scope.
    #[must_use]
    pub fn path(&self) -> String {
        self.path.join("/")
    }
}

/// Deletion behaviour when the resource leaves the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Retain,
}

/// A resource before it is placed in a stack.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    kind: &'static str,
    properties: Value,
    depends_on: Vec<LogicalId>,
    deletion_policy: Option<DeletionPolicy>,
}

impl ResourceSpec {
    /// A resource of the given type (`AWS::EC2::VPC`, ...) with no properties.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            properties: Value::Map(BTreeMap::new()),
            depends_on: Vec::new(),
            deletion_policy: None,
        }
    }

    /// Replace the property map.
    #[must_use]
    pub fn properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// Add an explicit ordering dependency.
    #[must_use]
    pub fn depends_on(mut self, id: &LogicalId) -> Self {
        if !self.depends_on.contains(id) {
            self.depends_on.push(id.clone());
        }
        self
    }

    /// Set both the deletion and the update-replace policy.
    #[must_use]
    pub fn deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }
}

/// A declared resource.
#[derive(Debug, Clone)]
pub struct Resource {
    pub logical_id: LogicalId,
    pub path: String,
    pub kind: &'static str,
    pub properties: Value,
    pub depends_on: Vec<LogicalId>,
    pub deletion_policy: Option<DeletionPolicy>,
}

/// A declared template parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub logical_id: LogicalId,
    pub kind: String,
    pub default: String,
    pub description: Option<String>,
}

/// A declared output, optionally exported for other stacks.
#[derive(Debug, Clone)]
pub struct Output {
    pub logical_id: LogicalId,
    pub path: String,
    pub value: Value,
    pub description: Option<String>,
    pub export_name: Option<String>,
}

/// The stack context: owns every declaration made during one synthesis pass.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    environment: DeployEnvironment,
    description: Option<String>,
    parameters: Vec<Parameter>,
    resources: Vec<Resource>,
    outputs: Vec<Output>,
    paths: BTreeSet<String>,
    logical_ids: BTreeSet<LogicalId>,
    referenceable: BTreeSet<LogicalId>,
    export_names: BTreeSet<String>,
}

impl Stack {
    /// Start an empty stack.
    #[must_use]
    pub fn new(name: &str, environment: DeployEnvironment) -> Self {
        Self {
            name: name.to_string(),
            environment,
            description: None,
            parameters: Vec::new(),
            resources: Vec::new(),
            outputs: Vec::new(),
            paths: BTreeSet::new(),
            logical_ids: BTreeSet::new(),
            referenceable: BTreeSet::new(),
            export_names: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn environment(&self) -> &DeployEnvironment {
        &self.environment
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    /// Resources in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Outputs in declaration order.
    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Look up a declared resource.
    #[must_use]
    pub fn resource(&self, id: &LogicalId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.logical_id == id)
    }

    /// All resources of one type, in declaration order.
    pub fn resources_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    /// Look up an output by its export name.
    #[must_use]
    pub fn export(&self, name: &str) -> Option<&Output> {
        self.outputs
            .iter()
            .find(|o| o.export_name.as_deref() == Some(name))
    }

    /// Declare a resource at `scope/id`.
    ///
    /// # Errors
    ///
    /// Returns a [`SynthError`] if the path or logical ID is taken, or if the
    /// properties or dependencies reference something not yet declared.
    pub fn add_resource(&mut self, scope: &Scope, id: &str, spec: ResourceSpec) -> Result<LogicalId> {
        let (path, logical_id) = self.claim(scope, id)?;
        self.check_references(&path, spec.properties.references())?;
        self.check_references(&path, spec.depends_on.iter().collect())?;

        tracing::debug!(%logical_id, kind = spec.kind, %path, "declared resource");
        self.logical_ids.insert(logical_id.clone());
        self.referenceable.insert(logical_id.clone());
        self.paths.insert(path.clone());
        self.resources.push(Resource {
            logical_id: logical_id.clone(),
            path,
            kind: spec.kind,
            properties: spec.properties,
            depends_on: spec.depends_on,
            deletion_policy: spec.deletion_policy,
        });
        Ok(logical_id)
    }

    /// Declare a template parameter at `scope/id`.
    ///
    /// # Errors
    ///
    /// Returns a [`SynthError`] if the path or logical ID is taken.
    pub fn add_parameter(
        &mut self,
        scope: &Scope,
        id: &str,
        kind: &str,
        default: &str,
        description: Option<&str>,
    ) -> Result<LogicalId> {
        let (path, logical_id) = self.claim(scope, id)?;
        self.logical_ids.insert(logical_id.clone());
        self.referenceable.insert(logical_id.clone());
        self.paths.insert(path);
        self.parameters.push(Parameter {
            logical_id: logical_id.clone(),
            kind: kind.to_string(),
            default: default.to_string(),
            description: description.map(str::to_string),
        });
        Ok(logical_id)
    }

    /// Declare an output at `scope/id`, optionally exported under `export_name`.
    ///
    /// # Errors
    ///
    /// Returns a [`SynthError`] if the path, logical ID or export name is
    /// taken, or if the value references something not yet declared.
    pub fn add_output(
        &mut self,
        scope: &Scope,
        id: &str,
        value: Value,
        export_name: Option<&str>,
        description: Option<&str>,
    ) -> Result<LogicalId> {
        let (path, logical_id) = self.claim(scope, id)?;
        self.check_references(&path, value.references())?;
        if let Some(name) = export_name {
            if self.export_names.contains(name) {
                return Err(SynthError::DuplicateExport(name.to_string()).into());
            }
            self.export_names.insert(name.to_string());
        }

        tracing::debug!(%logical_id, export = export_name, "declared output");
        self.logical_ids.insert(logical_id.clone());
        self.paths.insert(path.clone());
        self.outputs.push(Output {
            logical_id: logical_id.clone(),
            path,
            value,
            description: description.map(str::to_string),
            export_name: export_name.map(str::to_string),
        });
        Ok(logical_id)
    }

    fn claim(&self, scope: &Scope, id: &str) -> Result<(String, LogicalId), SynthError> {
        if id.is_empty() {
            return Err(SynthError::EmptyId {
                scope: scope.path(),
            });
        }
        if id.contains('/') {
            return Err(SynthError::InvalidId { id: id.to_string() });
        }
        let leaf = scope.child(id);
        let path = leaf.path();
        if self.paths.contains(&path) {
            return Err(SynthError::DuplicatePath { path });
        }
        let logical_id = allocate_logical_id(leaf.components());
        if self.logical_ids.contains(&logical_id) {
            return Err(SynthError::DuplicateLogicalId {
                logical_id: logical_id.to_string(),
                path,
            });
        }
        Ok((path, logical_id))
    }

    fn check_references(&self, path: &str, refs: Vec<&LogicalId>) -> Result<(), SynthError> {
        match refs.into_iter().find(|id| !self.referenceable.contains(*id)) {
            Some(missing) => Err(SynthError::UnresolvedReference {
                from: path.to_string(),
                target: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Render the declarations as a template document.
    #[must_use]
    pub fn to_template(&self) -> Template {
        let parameters = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.logical_id.to_string(),
                    TemplateParameter {
                        kind: p.kind.clone(),
                        default: p.default.clone(),
                        description: p.description.clone(),
                    },
                )
            })
            .collect();
        let resources = self
            .resources
            .iter()
            .map(|r| {
                (
                    r.logical_id.to_string(),
                    TemplateResource {
                        kind: r.kind,
                        properties: match &r.properties {
                            Value::Map(m) if m.is_empty() => None,
                            props => Some(props.clone()),
                        },
                        depends_on: r.depends_on.clone(),
                        deletion_policy: r.deletion_policy,
                        update_replace_policy: r.deletion_policy,
                        metadata: BTreeMap::from([(PATH_METADATA_KEY, format!("{}/{}", self.name, r.path))]),
                    },
                )
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|o| {
                (
                    o.logical_id.to_string(),
                    TemplateOutput {
                        description: o.description.clone(),
                        value: o.value.clone(),
                        export: o.export_name.clone().map(|name| TemplateExport { name }),
                    },
                )
            })
            .collect();
        Template {
            format_version: TEMPLATE_FORMAT_VERSION,
            description: self.description.clone(),
            metadata: BTreeMap::from([(ENVIRONMENT_METADATA_KEY, self.environment.target())]),
            parameters,
            resources,
            outputs,
        }
    }
}

/// Derive a logical ID from a construct path.
///
/// A top-level construct keeps its (alphanumeric-only) ID. Nested constructs
/// get the concatenated alphanumeric path plus an 8-hex-digit digest of the
/// full path, so two paths that sanitize to the same text still differ.
/// A trailing `Resource` component is dropped from the readable part.
#[must_use]
pub fn allocate_logical_id(components: &[String]) -> LogicalId {
    let sanitize = |s: &str| s.chars().filter(char::is_ascii_alphanumeric).collect::<String>();
    if let [only] = components {
        return LogicalId::new(sanitize(only));
    }
    let readable: Vec<&str> = match components.split_last() {
        Some((last, rest)) if last == "Resource" => rest.iter().map(String::as_str).collect(),
        _ => components.iter().map(String::as_str).collect(),
    };
    let human: String = readable.iter().map(|c| sanitize(c)).collect();
    let digest = Sha256::digest(components.join("/").as_bytes());
    let hash = hex_encode(&digest[..4]).to_uppercase();
    LogicalId::new(format!("{human}{hash}"))
}

/// Encode bytes as lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}

// ── Template document ─────────────────────────────────────────────────────────

/// The synthesized template. Maps are `BTreeMap`s so output is byte-stable.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: &'static str,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Metadata")]
    pub metadata: BTreeMap<&'static str, String>,
    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, TemplateParameter>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, TemplateResource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, TemplateOutput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateParameter {
    #[serde(rename = "Type")]
    pub kind: String,
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<LogicalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<DeletionPolicy>,
    pub metadata: BTreeMap<&'static str, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<TemplateExport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateExport {
    pub name: String,
}
