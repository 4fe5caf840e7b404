//! Deployment environment from process environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::EnvironmentSource;
use crate::domain::stack::DeployEnvironment;

/// `AWS_*` variables, read with `envy`.
#[derive(Debug, Default, Deserialize)]
struct AwsVars {
    account_id: Option<String>,
    default_region: Option<String>,
}

/// Reads `AWS_ACCOUNT_ID` and `AWS_DEFAULT_REGION`. Empty values count as unset.
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn deploy_environment(&self) -> Result<DeployEnvironment> {
        let vars: AwsVars = envy::prefixed("AWS_")
            .from_env()
            .context("cannot read AWS environment variables")?;
        Ok(to_environment(vars))
    }
}

fn to_environment(vars: AwsVars) -> DeployEnvironment {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    DeployEnvironment {
        account: non_empty(vars.account_id),
        region: non_empty(vars.default_region),
    }
}
