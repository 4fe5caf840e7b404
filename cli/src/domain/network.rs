//! Network & cluster composer.
//!
//! Declares the VPC (public and private subnet tiers across AZs), the ECS
//! cluster bound to it with its default Cloud Map namespace, the
//! service-to-service security group, and the stress-tool bastion.

use anyhow::Result;

use crate::domain::cidr::Ipv4Cidr;
use crate::domain::config::{BastionConfig, ClusterConfig, MAX_AZS_RANGE, NetworkConfig};
use crate::domain::error::ConfigError;
use crate::domain::iam::RoleBuilder;
use crate::domain::stack::{ResourceSpec, Scope, Stack};
use crate::domain::value::{LogicalId, Value};

pub const ANY_IPV4: &str = "0.0.0.0/0";

/// SSM path of the latest Amazon Linux 2 AMI (HVM, x86_64, gp2).
pub const AMAZON_LINUX_2_AMI_PARAMETER: &str =
    "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2";

/// Which subnet tier a subnet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetTier {
    Public,
    Private,
}

impl SubnetTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SubnetTier::Public => "Public",
            SubnetTier::Private => "Private",
        }
    }
}

/// A declared subnet with its route table and default route.
#[derive(Debug, Clone)]
pub struct Subnet {
    pub id: LogicalId,
    pub tier: SubnetTier,
    pub cidr: Ipv4Cidr,
    pub az_index: usize,
    pub route_table: LogicalId,
    pub default_route: LogicalId,
    /// NAT gateway hosted in this subnet (public tier only).
    pub nat_gateway: Option<LogicalId>,
}

impl Subnet {
    /// `Fn::Select [i, Fn::GetAZs ""]`.
    #[must_use]
    pub fn availability_zone(&self) -> Value {
        availability_zone(self.az_index)
    }
}

/// The declared VPC.
#[derive(Debug, Clone)]
pub struct Network {
    pub vpc: LogicalId,
    pub cidr: Ipv4Cidr,
    pub internet_gateway: LogicalId,
    pub gateway_attachment: LogicalId,
    pub public_subnets: Vec<Subnet>,
    pub private_subnets: Vec<Subnet>,
}

impl Network {
    /// `Ref` list of the subnets of one tier.
    #[must_use]
    pub fn subnet_refs(&self, tier: SubnetTier) -> Value {
        let subnets = match tier {
            SubnetTier::Public => &self.public_subnets,
            SubnetTier::Private => &self.private_subnets,
        };
        Value::list(subnets.iter().map(|s| Value::reference(&s.id)))
    }
}

/// The declared ECS cluster with its network and default namespace.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub cluster: LogicalId,
    pub namespace: LogicalId,
    pub namespace_name: String,
    pub network: Network,
}

impl Cluster {
    /// Cluster name (`Ref` on the cluster).
    #[must_use]
    pub fn name(&self) -> Value {
        Value::reference(&self.cluster)
    }

    #[must_use]
    pub fn namespace_arn(&self) -> Value {
        Value::get_att(&self.namespace, "Arn")
    }

    #[must_use]
    pub fn namespace_id(&self) -> Value {
        Value::get_att(&self.namespace, "Id")
    }
}

/// A declared security group.
#[derive(Debug, Clone)]
pub struct SecurityGroup {
    pub group: LogicalId,
}

impl SecurityGroup {
    /// `Fn::GetAtt Group.GroupId`.
    #[must_use]
    pub fn group_id(&self) -> Value {
        Value::get_att(&self.group, "GroupId")
    }
}

/// The declared bastion host.
#[derive(Debug, Clone)]
pub struct Bastion {
    pub instance: LogicalId,
    pub role: LogicalId,
    pub instance_profile: LogicalId,
    pub image_parameter: LogicalId,
}

/// `Fn::Select [i, Fn::GetAZs ""]`.
#[must_use]
pub fn availability_zone(index: usize) -> Value {
    Value::Select(index, Box::new(Value::GetAzs))
}

fn name_tag(name: Value) -> Value {
    Value::list([Value::map([("Key", "Name".into()), ("Value", name)])])
}

fn allow_all_outbound() -> Value {
    Value::list([Value::map([
        ("CidrIp", ANY_IPV4.into()),
        ("Description", "Allow all outbound traffic by default".into()),
        ("IpProtocol", "-1".into()),
    ])])
}

/// Declare the VPC under `scope` (normally `BaseVPC`).
///
/// The CIDR is split into `2 * max_azs` equal blocks: the first `max_azs`
/// become public subnets, the rest private subnets. Each public subnet hosts
/// a NAT gateway used by the private subnet in the same AZ.
///
/// # Errors
///
/// Returns a [`crate::domain::error::CidrError`] for a malformed or exhausted
/// CIDR, or a declaration error from the stack.
pub fn declare_network(stack: &mut Stack, scope: &Scope, config: &NetworkConfig) -> Result<Network> {
    if !MAX_AZS_RANGE.contains(&config.max_azs) {
        return Err(ConfigError::InvalidValue {
            key: "network.max_azs".to_string(),
            value: config.max_azs.to_string(),
            valid: "1..6".to_string(),
        }
        .into());
    }
    let cidr: Ipv4Cidr = config.cidr.parse()?;
    let azs = usize::from(config.max_azs);
    let blocks = cidr.split(azs * 2)?;
    let tag_prefix = format!("{}/{}", stack.name(), scope.path());

    let vpc = stack.add_resource(
        scope,
        "Resource",
        ResourceSpec::new("AWS::EC2::VPC").properties(Value::map([
            ("CidrBlock", cidr.to_string().into()),
            ("EnableDnsHostnames", true.into()),
            ("EnableDnsSupport", true.into()),
            ("InstanceTenancy", "default".into()),
            ("Tags", name_tag(tag_prefix.as_str().into())),
        ])),
    )?;

    let internet_gateway = stack.add_resource(
        scope,
        "IGW",
        ResourceSpec::new("AWS::EC2::InternetGateway")
            .properties(Value::map([("Tags", name_tag(tag_prefix.as_str().into()))])),
    )?;
    let gateway_attachment = stack.add_resource(
        scope,
        "VPCGW",
        ResourceSpec::new("AWS::EC2::VPCGatewayAttachment").properties(Value::map([
            ("InternetGatewayId", Value::reference(&internet_gateway)),
            ("VpcId", Value::reference(&vpc)),
        ])),
    )?;

    let mut network = Network {
        vpc,
        cidr,
        internet_gateway,
        gateway_attachment,
        public_subnets: Vec::with_capacity(azs),
        private_subnets: Vec::with_capacity(azs),
    };

    for (az, block) in blocks[..azs].iter().enumerate() {
        let subnet = declare_subnet(stack, scope, &network, SubnetTier::Public, az, *block)?;
        network.public_subnets.push(subnet);
    }
    for (az, block) in blocks[azs..].iter().enumerate() {
        let subnet = declare_subnet(stack, scope, &network, SubnetTier::Private, az, *block)?;
        network.private_subnets.push(subnet);
    }

    tracing::info!(
        cidr = %network.cidr,
        azs,
        subnets = network.public_subnets.len() + network.private_subnets.len(),
        "declared network"
    );
    Ok(network)
}

fn declare_subnet(
    stack: &mut Stack,
    vpc_scope: &Scope,
    network: &Network,
    tier: SubnetTier,
    az: usize,
    cidr: Ipv4Cidr,
) -> Result<Subnet> {
    let subnet_scope = vpc_scope.child(&format!("{}Subnet{}", tier.as_str(), az + 1));
    let tag = format!("{}/{}", stack.name(), subnet_scope.path());
    let tags = Value::list([
        Value::map([("Key", "Name".into()), ("Value", tag.as_str().into())]),
        Value::map([
            ("Key", "ecsbase:subnet-type".into()),
            ("Value", tier.as_str().into()),
        ]),
    ]);

    let id = stack.add_resource(
        &subnet_scope,
        "Subnet",
        ResourceSpec::new("AWS::EC2::Subnet").properties(Value::map([
            ("AvailabilityZone", availability_zone(az)),
            ("CidrBlock", cidr.to_string().into()),
            ("MapPublicIpOnLaunch", (tier == SubnetTier::Public).into()),
            ("Tags", tags),
            ("VpcId", Value::reference(&network.vpc)),
        ])),
    )?;
    let route_table = stack.add_resource(
        &subnet_scope,
        "RouteTable",
        ResourceSpec::new("AWS::EC2::RouteTable").properties(Value::map([
            ("Tags", name_tag(tag.as_str().into())),
            ("VpcId", Value::reference(&network.vpc)),
        ])),
    )?;
    let association = stack.add_resource(
        &subnet_scope,
        "RouteTableAssociation",
        ResourceSpec::new("AWS::EC2::SubnetRouteTableAssociation").properties(Value::map([
            ("RouteTableId", Value::reference(&route_table)),
            ("SubnetId", Value::reference(&id)),
        ])),
    )?;

    let (default_route, nat_gateway) = match tier {
        SubnetTier::Public => {
            let route = stack.add_resource(
                &subnet_scope,
                "DefaultRoute",
                ResourceSpec::new("AWS::EC2::Route")
                    .properties(Value::map([
                        ("DestinationCidrBlock", ANY_IPV4.into()),
                        ("GatewayId", Value::reference(&network.internet_gateway)),
                        ("RouteTableId", Value::reference(&route_table)),
                    ]))
                    .depends_on(&network.gateway_attachment),
            )?;
            let eip = stack.add_resource(
                &subnet_scope,
                "EIP",
                ResourceSpec::new("AWS::EC2::EIP").properties(Value::map([
                    ("Domain", "vpc".into()),
                    ("Tags", name_tag(tag.as_str().into())),
                ])),
            )?;
            let nat = stack.add_resource(
                &subnet_scope,
                "NATGateway",
                ResourceSpec::new("AWS::EC2::NatGateway")
                    .properties(Value::map([
                        ("AllocationId", Value::get_att(&eip, "AllocationId")),
                        ("SubnetId", Value::reference(&id)),
                        ("Tags", name_tag(tag.as_str().into())),
                    ]))
                    .depends_on(&route)
                    .depends_on(&association),
            )?;
            (route, Some(nat))
        }
        SubnetTier::Private => {
            let nat = network
                .public_subnets
                .get(az)
                .and_then(|s| s.nat_gateway.as_ref())
                .ok_or_else(|| anyhow::anyhow!("no NAT gateway declared for AZ {}", az + 1))?;
            let route = stack.add_resource(
                &subnet_scope,
                "DefaultRoute",
                ResourceSpec::new("AWS::EC2::Route").properties(Value::map([
                    ("DestinationCidrBlock", ANY_IPV4.into()),
                    ("NatGatewayId", Value::reference(nat)),
                    ("RouteTableId", Value::reference(&route_table)),
                ])),
            )?;
            (route, None)
        }
    };

    Ok(Subnet {
        id,
        tier,
        cidr,
        az_index: az,
        route_table,
        default_route,
        nat_gateway,
    })
}

/// Declare the ECS cluster under `scope` (normally `ECSCluster`) and its
/// default private DNS namespace.
///
/// # Errors
///
/// Propagates declaration errors from the stack.
pub fn declare_cluster(
    stack: &mut Stack,
    scope: &Scope,
    config: &ClusterConfig,
    network: &Network,
) -> Result<Cluster> {
    let insights = if config.container_insights {
        "enabled"
    } else {
        "disabled"
    };
    let cluster = stack.add_resource(
        scope,
        "Resource",
        ResourceSpec::new("AWS::ECS::Cluster").properties(Value::map([
            ("ClusterName", config.name.as_str().into()),
            (
                "ClusterSettings",
                Value::list([Value::map([
                    ("Name", "containerInsights".into()),
                    ("Value", insights.into()),
                ])]),
            ),
        ])),
    )?;
    let namespace = stack.add_resource(
        &scope.child("DefaultServiceDiscoveryNamespace"),
        "Resource",
        ResourceSpec::new("AWS::ServiceDiscovery::PrivateDnsNamespace").properties(Value::map([
            ("Name", config.namespace.as_str().into()),
            ("Vpc", Value::reference(&network.vpc)),
        ])),
    )?;

    tracing::info!(cluster = %config.name, namespace = %config.namespace, "declared cluster");
    Ok(Cluster {
        cluster,
        namespace,
        namespace_name: config.namespace.clone(),
        network: network.clone(),
    })
}

/// Declare the security group services use to talk to each other, and the
/// self-referencing ingress rule opening `port` to members of the group.
///
/// # Errors
///
/// Propagates declaration errors from the stack.
pub fn declare_services_security_group(
    stack: &mut Stack,
    network: &Network,
    port: u16,
) -> Result<SecurityGroup> {
    let root = Scope::root();
    let group = stack.add_resource(
        &root.child("FrontendToBackendSecurityGroup"),
        "Resource",
        ResourceSpec::new("AWS::EC2::SecurityGroup").properties(Value::map([
            (
                "GroupDescription",
                "Security group for frontend service to talk to backend services".into(),
            ),
            ("SecurityGroupEgress", allow_all_outbound()),
            ("VpcId", Value::reference(&network.vpc)),
        ])),
    )?;
    let sg = SecurityGroup { group };
    stack.add_resource(
        &root,
        &format!("InboundSecGrp{port}"),
        ResourceSpec::new("AWS::EC2::SecurityGroupIngress").properties(Value::map([
            ("FromPort", port.into()),
            ("GroupId", sg.group_id()),
            ("IpProtocol", "TCP".into()),
            ("SourceSecurityGroupId", sg.group_id()),
            ("ToPort", port.into()),
        ])),
    )?;
    Ok(sg)
}

/// Declare the stress-tool bastion in the first private subnet.
///
/// `user_data` is the boot script, embedded verbatim.
///
/// # Errors
///
/// Propagates declaration errors from the stack.
pub fn declare_bastion(
    stack: &mut Stack,
    config: &BastionConfig,
    network: &Network,
    security_group: &SecurityGroup,
    user_data: &str,
) -> Result<Bastion> {
    let root = Scope::root();
    let subnet = network
        .private_subnets
        .first()
        .ok_or_else(|| anyhow::anyhow!("network has no private subnet for the bastion"))?;

    let image_parameter = stack.add_parameter(
        &root,
        "LatestAmazonLinux2Ami",
        "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>",
        AMAZON_LINUX_2_AMI_PARAMETER,
        Some("Latest Amazon Linux 2 AMI for the stress-tool instance"),
    )?;

    let role = RoleBuilder::assumed_by("ec2.amazonaws.com")
        .managed_policy("service-role/AmazonEC2RoleforSSM")
        .declare(stack, &root.child("InstanceSSM"))?
        .role;

    let instance_scope = root.child("Instance");
    let instance_profile = stack.add_resource(
        &instance_scope,
        "InstanceProfile",
        ResourceSpec::new("AWS::IAM::InstanceProfile")
            .properties(Value::map([("Roles", Value::list([Value::reference(&role)]))])),
    )?;
    let instance_name = format!("{}-stresstool", stack.name());
    let instance = stack.add_resource(
        &instance_scope,
        "Resource",
        ResourceSpec::new("AWS::EC2::Instance")
            .properties(Value::map([
                ("AvailabilityZone", subnet.availability_zone()),
                ("IamInstanceProfile", Value::reference(&instance_profile)),
                ("ImageId", Value::reference(&image_parameter)),
                ("InstanceType", config.instance_type.as_str().into()),
                ("SecurityGroupIds", Value::list([security_group.group_id()])),
                ("SubnetId", Value::reference(&subnet.id)),
                ("Tags", name_tag(instance_name.into())),
                ("UserData", Value::Base64(Box::new(user_data.into()))),
            ]))
            .depends_on(&role),
    )?;

    Ok(Bastion {
        instance,
        role,
        instance_profile,
        image_parameter,
    })
}
