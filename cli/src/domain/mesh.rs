//! Mesh gateway composer.
//!
//! Declares a service mesh with one HTTP virtual gateway, a Fargate task
//! running the gateway proxy (optionally with a tracing side-car), and a
//! service fronted by an internet-facing network load balancer. Exports the
//! identifiers downstream service stacks join the mesh with.

use anyhow::Result;
use ecsbase_common::ExportName;

use crate::domain::config::MeshConfig;
use crate::domain::iam::{PolicyStatement, RoleBuilder, region_or_pseudo};
use crate::domain::network::{ANY_IPV4, Cluster, SubnetTier};
use crate::domain::stack::{DeletionPolicy, ResourceSpec, Scope, Stack};
use crate::domain::task::{AwsLogs, ContainerSpec, HealthCheck, TaskLayout, Ulimit};
use crate::domain::value::{LogicalId, Value};

/// Port the virtual gateway and the proxy container listen on.
pub const GATEWAY_PORT: u16 = 3000;
/// Port the load balancer listens on.
pub const LISTENER_PORT: u16 = 80;

pub const TASK_FAMILY: &str = "mesh-gw-proxy-taskdef";
pub const TASK_CPU: &str = "256";
pub const TASK_MEMORY_MIB: &str = "512";
pub const CONTAINER_MEMORY_RESERVATION_MIB: u32 = 256;
pub const LOG_RETENTION_DAYS: i64 = 7;
pub const SERVICE_NAME: &str = "mesh-gw-proxy";
pub const PROXY_CONTAINER: &str = "envoy";
pub const TRACING_CONTAINER: &str = "xray";
pub const TRACING_USER: &str = "1337";
pub const NOFILE_LIMIT: u32 = 15000;

/// Liveness check against the proxy's admin interface.
pub const PROXY_HEALTH_CHECK: &str =
    "curl -s http://localhost:9901/server_info | grep state | grep -q LIVE";

/// Declared mesh gateway resources.
#[derive(Debug, Clone)]
pub struct MeshGateway {
    pub mesh: LogicalId,
    pub virtual_gateway: LogicalId,
    pub task_definition: LogicalId,
    pub task_role: LogicalId,
    pub execution_role: LogicalId,
    pub log_group: LogicalId,
    pub load_balancer: LogicalId,
    pub target_group: LogicalId,
    pub listener: LogicalId,
    pub security_group: LogicalId,
    pub discovery_service: LogicalId,
    pub service: LogicalId,
    pub layout: TaskLayout,
}

/// Build the container layout of the gateway task.
///
/// The proxy announces itself to the mesh as the virtual gateway
/// (`APPMESH_RESOURCE_ARN`).
#[must_use]
pub fn gateway_layout(
    config: &MeshConfig,
    log_group: &LogicalId,
    virtual_gateway_arn: Value,
    region: &Value,
) -> TaskLayout {
    let mut proxy = ContainerSpec::new(
        PROXY_CONTAINER,
        &config.envoy_image,
        CONTAINER_MEMORY_RESERVATION_MIB,
    );
    proxy.environment.insert("REGION".into(), region.clone());
    proxy.environment.insert("ENVOY_LOG_LEVEL".into(), "info".into());
    proxy
        .environment
        .insert("ENABLE_ENVOY_STATS_TAGS".into(), "1".into());
    proxy
        .environment
        .insert("APPMESH_RESOURCE_ARN".into(), virtual_gateway_arn);
    proxy.logging = Some(AwsLogs {
        group: log_group.clone(),
        stream_prefix: "/mesh-gateway".into(),
        region: region.clone(),
    });
    proxy.health_check = Some(HealthCheck::shell(PROXY_HEALTH_CHECK));
    proxy.port_mappings.push(GATEWAY_PORT);
    proxy.ulimits.push(Ulimit {
        name: "nofile",
        soft: NOFILE_LIMIT,
        hard: NOFILE_LIMIT,
    });

    if !config.tracing {
        return TaskLayout::without_tracing(proxy);
    }
    let mut xray = ContainerSpec::new(
        TRACING_CONTAINER,
        &config.xray_image,
        CONTAINER_MEMORY_RESERVATION_MIB,
    );
    xray.user = Some(TRACING_USER.into());
    xray.logging = Some(AwsLogs {
        group: log_group.clone(),
        stream_prefix: "/xray-container".into(),
        region: region.clone(),
    });
    TaskLayout::with_tracing(proxy, xray)
}

/// Declare the mesh gateway under `scope` (normally `AppMesh`) on `cluster`.
///
/// Declaration order follows the reference graph: mesh, virtual gateway,
/// roles and log group, task definition, load balancer pieces, service,
/// then the exports.
///
/// # Errors
///
/// Propagates declaration errors from the stack.
pub fn declare_mesh_gateway(
    stack: &mut Stack,
    scope: &Scope,
    config: &MeshConfig,
    cluster: &Cluster,
) -> Result<MeshGateway> {
    let region = region_or_pseudo(stack.environment().region.as_deref());

    let mesh = stack.add_resource(
        &scope.child("EcsWorkShop-AppMesh"),
        "Resource",
        ResourceSpec::new("AWS::AppMesh::Mesh")
            .properties(Value::map([("MeshName", config.name.as_str().into())])),
    )?;
    let virtual_gateway = stack.add_resource(
        &scope.child("Mesh-VGW"),
        "Resource",
        ResourceSpec::new("AWS::AppMesh::VirtualGateway").properties(Value::map([
            ("MeshName", Value::get_att(&mesh, "MeshName")),
            (
                "Spec",
                Value::map([(
                    "Listeners",
                    Value::list([Value::map([(
                        "PortMapping",
                        Value::map([
                            ("Port", Value::from(GATEWAY_PORT)),
                            ("Protocol", "http".into()),
                        ]),
                    )])]),
                )]),
            ),
            ("VirtualGatewayName", config.gateway_name.as_str().into()),
        ])),
    )?;

    let task_scope = scope.child(TASK_FAMILY);
    let mut task_role = RoleBuilder::assumed_by("ecs-tasks.amazonaws.com")
        .managed_policy("CloudWatchFullAccess")
        .managed_policy("AWSAppMeshEnvoyAccess");
    if config.tracing {
        task_role = task_role.managed_policy("AWSXRayDaemonWriteAccess");
    }
    let task_role = task_role.declare(stack, &task_scope.child("TaskRole"))?;

    let log_group = stack.add_resource(
        &scope.child("ecsworkshopMeshGateway"),
        "Resource",
        ResourceSpec::new("AWS::Logs::LogGroup")
            .properties(Value::map([(
                "RetentionInDays",
                Value::from(LOG_RETENTION_DAYS),
            )]))
            .deletion_policy(DeletionPolicy::Retain),
    )?;

    let execution_role = RoleBuilder::assumed_by("ecs-tasks.amazonaws.com")
        .managed_policy("AmazonEC2ContainerRegistryReadOnly")
        .managed_policy("CloudWatchLogsFullAccess")
        .statement(PolicyStatement::allow(
            &["logs:CreateLogStream", "logs:PutLogEvents"],
            vec![Value::get_att(&log_group, "Arn")],
        ))
        .statement(PolicyStatement::allow(
            &["ec2:DescribeSubnets"],
            vec!["*".into()],
        ))
        .declare(stack, &task_scope.child("ExecutionRole"))?;

    let layout = gateway_layout(
        config,
        &log_group,
        Value::reference(&virtual_gateway),
        &region,
    );
    let mut task_spec = ResourceSpec::new("AWS::ECS::TaskDefinition").properties(Value::map([
        ("ContainerDefinitions", layout.container_definitions()),
        ("Cpu", TASK_CPU.into()),
        ("ExecutionRoleArn", execution_role.arn()),
        ("Family", TASK_FAMILY.into()),
        ("Memory", TASK_MEMORY_MIB.into()),
        ("NetworkMode", "awsvpc".into()),
        ("RequiresCompatibilities", Value::list(["FARGATE".into()])),
        ("TaskRoleArn", task_role.arn()),
    ]));
    if let Some(policy) = &execution_role.default_policy {
        task_spec = task_spec.depends_on(policy);
    }
    let task_definition = stack.add_resource(&task_scope, "Resource", task_spec)?;

    let network = &cluster.network;
    let service_scope = scope.child("MeshGW-Proxy-Fargate-Service");
    let lb_scope = service_scope.child("LB");
    let load_balancer = stack.add_resource(
        &lb_scope,
        "Resource",
        ResourceSpec::new("AWS::ElasticLoadBalancingV2::LoadBalancer").properties(Value::map([
            ("Scheme", "internet-facing".into()),
            ("Subnets", network.subnet_refs(SubnetTier::Public)),
            ("Type", "network".into()),
        ])),
    )?;
    let listener_scope = lb_scope.child("PublicListener");
    let target_group = stack.add_resource(
        &listener_scope.child("ECSGroup"),
        "Resource",
        ResourceSpec::new("AWS::ElasticLoadBalancingV2::TargetGroup").properties(Value::map([
            ("Port", Value::from(LISTENER_PORT)),
            ("Protocol", "TCP".into()),
            ("TargetType", "ip".into()),
            ("VpcId", Value::reference(&network.vpc)),
        ])),
    )?;
    let listener = stack.add_resource(
        &listener_scope,
        "Resource",
        ResourceSpec::new("AWS::ElasticLoadBalancingV2::Listener").properties(Value::map([
            (
                "DefaultActions",
                Value::list([Value::map([
                    ("TargetGroupArn", Value::reference(&target_group)),
                    ("Type", "forward".into()),
                ])]),
            ),
            ("LoadBalancerArn", Value::reference(&load_balancer)),
            ("Port", Value::from(LISTENER_PORT)),
            ("Protocol", "TCP".into()),
        ])),
    )?;

    let ecs_scope = service_scope.child("Service");
    let sg_scope = ecs_scope.child("SecurityGroup");
    let sg_description = format!("{}/{}", stack.name(), sg_scope.path());
    let security_group = stack.add_resource(
        &sg_scope,
        "Resource",
        ResourceSpec::new("AWS::EC2::SecurityGroup").properties(Value::map([
            ("GroupDescription", sg_description.into()),
            (
                "SecurityGroupEgress",
                Value::list([Value::map([
                    ("CidrIp", ANY_IPV4.into()),
                    ("Description", "Allow all outbound traffic by default".into()),
                    ("IpProtocol", "-1".into()),
                ])]),
            ),
            (
                "SecurityGroupIngress",
                Value::list([Value::map([
                    ("CidrIp", ANY_IPV4.into()),
                    ("Description", "Allow NLB connections on port 3000".into()),
                    ("FromPort", Value::from(GATEWAY_PORT)),
                    ("IpProtocol", "tcp".into()),
                    ("ToPort", Value::from(GATEWAY_PORT)),
                ])]),
            ),
            ("VpcId", Value::reference(&network.vpc)),
        ])),
    )?;
    let discovery_service = stack.add_resource(
        &ecs_scope.child("CloudmapService"),
        "Resource",
        ResourceSpec::new("AWS::ServiceDiscovery::Service").properties(Value::map([
            (
                "DnsConfig",
                Value::map([
                    (
                        "DnsRecords",
                        Value::list([Value::map([
                            ("TTL", Value::from(60i64)),
                            ("Type", "A".into()),
                        ])]),
                    ),
                    ("NamespaceId", cluster.namespace_id()),
                    ("RoutingPolicy", "MULTIVALUE".into()),
                ]),
            ),
            (
                "HealthCheckCustomConfig",
                Value::map([("FailureThreshold", Value::from(1i64))]),
            ),
            ("Name", SERVICE_NAME.into()),
            ("NamespaceId", cluster.namespace_id()),
        ])),
    )?;

    let service = stack.add_resource(
        &ecs_scope,
        "Service",
        ResourceSpec::new("AWS::ECS::Service")
            .properties(Value::map([
                ("Cluster", cluster.name()),
                (
                    "DeploymentConfiguration",
                    Value::map([
                        ("MaximumPercent", Value::from(200i64)),
                        ("MinimumHealthyPercent", Value::from(50i64)),
                    ]),
                ),
                ("DesiredCount", Value::from(config.desired_count)),
                ("EnableECSManagedTags", false.into()),
                ("HealthCheckGracePeriodSeconds", Value::from(60i64)),
                ("LaunchType", "FARGATE".into()),
                (
                    "LoadBalancers",
                    Value::list([Value::map([
                        ("ContainerName", layout.proxy().name.as_str().into()),
                        ("ContainerPort", Value::from(GATEWAY_PORT)),
                        ("TargetGroupArn", Value::reference(&target_group)),
                    ])]),
                ),
                (
                    "NetworkConfiguration",
                    Value::map([(
                        "AwsvpcConfiguration",
                        Value::map([
                            ("AssignPublicIp", "ENABLED".into()),
                            (
                                "SecurityGroups",
                                Value::list([Value::get_att(&security_group, "GroupId")]),
                            ),
                            ("Subnets", network.subnet_refs(SubnetTier::Public)),
                        ]),
                    )]),
                ),
                ("ServiceName", SERVICE_NAME.into()),
                (
                    "ServiceRegistries",
                    Value::list([Value::map([(
                        "RegistryArn",
                        Value::get_att(&discovery_service, "Arn"),
                    )])]),
                ),
                ("TaskDefinition", Value::reference(&task_definition)),
            ]))
            .depends_on(&listener)
            .depends_on(&target_group),
    )?;

    let exports = [
        (
            ExportName::MeshGwNlbDns,
            Value::get_att(&load_balancer, "DNSName"),
        ),
        (ExportName::MeshArn, Value::reference(&mesh)),
        (ExportName::MeshName, Value::get_att(&mesh, "MeshName")),
        (ExportName::MeshEnvoyServiceArn, Value::reference(&service)),
        (ExportName::MeshVgwArn, Value::reference(&virtual_gateway)),
        (
            ExportName::MeshVgwName,
            Value::get_att(&virtual_gateway, "VirtualGatewayName"),
        ),
    ];
    for (name, value) in exports {
        stack.add_output(scope, name.as_str(), value, Some(name.as_str()), None)?;
    }

    tracing::info!(
        mesh = %config.name,
        gateway = %config.gateway_name,
        containers = layout.containers().len(),
        "declared mesh gateway"
    );
    Ok(MeshGateway {
        mesh,
        virtual_gateway,
        task_definition,
        task_role: task_role.role,
        execution_role: execution_role.role,
        log_group,
        load_balancer,
        target_group,
        listener,
        security_group,
        discovery_service,
        service,
        layout,
    })
}
