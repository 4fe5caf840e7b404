//! IAM roles, managed policies and inline policy documents.

use anyhow::Result;

use crate::domain::stack::{ResourceSpec, Scope, Stack};
use crate::domain::value::{LogicalId, Pseudo, Value};

pub const POLICY_VERSION: &str = "2012-10-17";

/// One `Allow` statement of a policy document.
#[derive(Debug, Clone)]
pub struct PolicyStatement {
    pub actions: Vec<&'static str>,
    pub resources: Vec<Value>,
}

impl PolicyStatement {
    #[must_use]
    pub fn allow(actions: &[&'static str], resources: Vec<Value>) -> Self {
        Self {
            actions: actions.to_vec(),
            resources,
        }
    }

    fn to_value(&self) -> Value {
        let action = match self.actions.as_slice() {
            [single] => Value::from(*single),
            many => Value::list(many.iter().map(|a| Value::from(*a))),
        };
        let resource = match self.resources.as_slice() {
            [single] => single.clone(),
            many => Value::list(many.iter().cloned()),
        };
        Value::map([
            ("Action", action),
            ("Effect", "Allow".into()),
            ("Resource", resource),
        ])
    }
}

/// A policy document from statements.
#[must_use]
pub fn policy_document(statements: &[PolicyStatement]) -> Value {
    Value::map([
        (
            "Statement",
            Value::list(statements.iter().map(PolicyStatement::to_value)),
        ),
        ("Version", POLICY_VERSION.into()),
    ])
}

/// Trust policy letting a service principal (`ec2.amazonaws.com`, ...) assume a role.
#[must_use]
pub fn assume_role_policy(service: &str) -> Value {
    Value::map([
        (
            "Statement",
            Value::list([Value::map([
                ("Action", "sts:AssumeRole".into()),
                ("Effect", "Allow".into()),
                ("Principal", Value::map([("Service", service.into())])),
            ])]),
        ),
        ("Version", POLICY_VERSION.into()),
    ])
}

/// ARN of an AWS-managed policy, e.g. `service-role/AmazonEC2RoleforSSM`.
#[must_use]
pub fn managed_policy_arn(name: &str) -> Value {
    Value::partition_arn(&format!("iam::aws:policy/{name}"))
}

/// Role under construction. Managed policies and statements accumulate until
/// [`RoleBuilder::declare`] places the role (and its default policy, if any)
/// in the stack.
#[derive(Debug, Clone)]
pub struct RoleBuilder {
    service: String,
    managed_policies: Vec<String>,
    statements: Vec<PolicyStatement>,
}

/// A declared role and its optional default policy.
#[derive(Debug, Clone)]
pub struct DeclaredRole {
    pub role: LogicalId,
    pub default_policy: Option<LogicalId>,
}

impl DeclaredRole {
    /// `Fn::GetAtt Role.Arn`.
    #[must_use]
    pub fn arn(&self) -> Value {
        Value::get_att(&self.role, "Arn")
    }
}

impl RoleBuilder {
    #[must_use]
    pub fn assumed_by(service: &str) -> Self {
        Self {
            service: service.to_string(),
            managed_policies: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Attach an AWS-managed policy by name.
    #[must_use]
    pub fn managed_policy(mut self, name: &str) -> Self {
        if !self.managed_policies.iter().any(|p| p == name) {
            self.managed_policies.push(name.to_string());
        }
        self
    }

    /// Add a statement to the role's default inline policy.
    #[must_use]
    pub fn statement(mut self, statement: PolicyStatement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Names of the attached managed policies, in attachment order.
    #[must_use]
    pub fn managed_policies(&self) -> &[String] {
        &self.managed_policies
    }

    /// Declare the role at `scope/Resource`, plus `scope/DefaultPolicy/Resource`
    /// when any statements were added.
    ///
    /// # Errors
    ///
    /// Propagates declaration errors from the stack.
    pub fn declare(self, stack: &mut Stack, scope: &Scope) -> Result<DeclaredRole> {
        let mut props = Value::map([(
            "AssumeRolePolicyDocument",
            assume_role_policy(&self.service),
        )]);
        if !self.managed_policies.is_empty() {
            props.insert(
                "ManagedPolicyArns",
                Value::list(self.managed_policies.iter().map(|p| managed_policy_arn(p))),
            );
        }
        let role = stack.add_resource(
            scope,
            "Resource",
            ResourceSpec::new("AWS::IAM::Role").properties(props),
        )?;

        let default_policy = if self.statements.is_empty() {
            None
        } else {
            let policy_name = format!("{role}DefaultPolicy");
            Some(stack.add_resource(
                &scope.child("DefaultPolicy"),
                "Resource",
                ResourceSpec::new("AWS::IAM::Policy").properties(Value::map([
                    ("PolicyDocument", policy_document(&self.statements)),
                    ("PolicyName", policy_name.into()),
                    ("Roles", Value::list([Value::reference(&role)])),
                ])),
            )?)
        };
        Ok(DeclaredRole {
            role,
            default_policy,
        })
    }
}

/// `AWS::Region` pseudo parameter, or the configured region when known.
#[must_use]
pub fn region_or_pseudo(region: Option<&str>) -> Value {
    region.map_or(Value::Pseudo(Pseudo::Region), Value::from)
}
