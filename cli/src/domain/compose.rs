//! Top-level stack definition.
//!
//! Builds the network and cluster, the services security group and the
//! bastion, optionally the mesh gateway, and finally the base outputs.

use anyhow::Result;
use ecsbase_common::{ExportName, STRESS_TOOL_INSTANCE_ID, STRESS_TOOL_PRIVATE_IP};

use crate::domain::config::StackConfig;
use crate::domain::mesh::{MeshGateway, declare_mesh_gateway};
use crate::domain::network::{
    Bastion, Cluster, SecurityGroup, declare_bastion, declare_cluster, declare_network,
    declare_services_security_group,
};
use crate::domain::stack::{DeployEnvironment, Scope, Stack};
use crate::domain::value::Value;

/// Everything one synthesis pass declared.
#[derive(Debug)]
pub struct BaseStack {
    pub stack: Stack,
    pub cluster: Cluster,
    pub services_security_group: SecurityGroup,
    pub bastion: Bastion,
    pub mesh: Option<MeshGateway>,
}

/// Declare the whole base stack.
///
/// `user_data` is the bastion's boot script, already read from disk.
///
/// # Errors
///
/// Returns a [`crate::domain::error::ConfigError`] for an out-of-range
/// setting, a [`crate::domain::error::CidrError`] for an unusable network
/// CIDR, or a [`crate::domain::error::SynthError`] if a declaration breaks
/// a construct-tree invariant.
pub fn compose_base_stack(
    config: &StackConfig,
    environment: DeployEnvironment,
    user_data: &str,
) -> Result<BaseStack> {
    config.validate()?;
    let mut stack = Stack::new(&config.stack.name, environment);
    if !config.stack.description.is_empty() {
        stack.set_description(&config.stack.description);
    }
    let root = Scope::root();

    let network = declare_network(&mut stack, &root.child("BaseVPC"), &config.network)?;
    let cluster = declare_cluster(&mut stack, &root.child("ECSCluster"), &config.cluster, &network)?;
    let services_security_group =
        declare_services_security_group(&mut stack, &network, config.cluster.services_port)?;
    let bastion = declare_bastion(
        &mut stack,
        &config.bastion,
        &network,
        &services_security_group,
        user_data,
    )?;

    let mesh = if config.mesh.enabled {
        Some(declare_mesh_gateway(
            &mut stack,
            &root.child("AppMesh"),
            &config.mesh,
            &cluster,
        )?)
    } else {
        tracing::info!("mesh gateway disabled");
        None
    };

    let exported = [
        ("NSArn", ExportName::NsArn, cluster.namespace_arn()),
        (
            "NSName",
            ExportName::NsName,
            cluster.namespace_name.as_str().into(),
        ),
        ("NSId", ExportName::NsId, cluster.namespace_id()),
        (
            "FE2BESecGrp",
            ExportName::SecGrpId,
            services_security_group.group_id(),
        ),
        ("ECSClusterName", ExportName::EcsClusterName, cluster.name()),
        (
            "ServicesSecGrp",
            ExportName::ServicesSecGrp,
            services_security_group.group_id(),
        ),
    ];
    for (id, name, value) in exported {
        stack.add_output(&root, id, value, Some(name.as_str()), None)?;
    }
    stack.add_output(
        &root,
        STRESS_TOOL_INSTANCE_ID,
        Value::reference(&bastion.instance),
        None,
        Some("Instance ID of the stress-tool host"),
    )?;
    stack.add_output(
        &root,
        STRESS_TOOL_PRIVATE_IP,
        Value::get_att(&bastion.instance, "PrivateIp"),
        None,
        Some("Private IP of the stress-tool host"),
    )?;

    tracing::info!(
        stack = stack.name(),
        resources = stack.resources().len(),
        outputs = stack.outputs().len(),
        "stack composed"
    );
    Ok(BaseStack {
        stack,
        cluster,
        services_security_group,
        bastion,
        mesh,
    })
}
