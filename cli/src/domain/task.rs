//! Container definitions and the gateway task layout.

use std::collections::BTreeMap;

use crate::domain::value::{LogicalId, Value};

/// When a dependent container may start relative to its dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyCondition {
    Start,
}

impl DependencyCondition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DependencyCondition::Start => "START",
        }
    }
}

/// `awslogs` driver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsLogs {
    pub group: LogicalId,
    pub stream_prefix: String,
    pub region: Value,
}

/// Container health check. Intervals are in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub command: Vec<String>,
    pub interval: u32,
    pub retries: u32,
    pub timeout: u32,
}

impl HealthCheck {
    /// `CMD-SHELL <script>` with the provider defaults (30s / 3 / 5s).
    #[must_use]
    pub fn shell(script: &str) -> Self {
        Self {
            command: vec!["CMD-SHELL".to_string(), script.to_string()],
            interval: 30,
            retries: 3,
            timeout: 5,
        }
    }
}

/// Per-container resource limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ulimit {
    pub name: &'static str,
    pub soft: u32,
    pub hard: u32,
}

/// One container definition of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub memory_reservation_mib: u32,
    pub essential: bool,
    pub environment: BTreeMap<String, Value>,
    pub logging: Option<AwsLogs>,
    pub health_check: Option<HealthCheck>,
    pub port_mappings: Vec<u16>,
    pub ulimits: Vec<Ulimit>,
    pub user: Option<String>,
    depends_on: Vec<(String, DependencyCondition)>,
}

impl ContainerSpec {
    /// An essential container with no environment, ports or logging.
    #[must_use]
    pub fn new(name: &str, image: &str, memory_reservation_mib: u32) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            memory_reservation_mib,
            essential: true,
            environment: BTreeMap::new(),
            logging: None,
            health_check: None,
            port_mappings: Vec::new(),
            ulimits: Vec::new(),
            user: None,
            depends_on: Vec::new(),
        }
    }

    /// Containers this one waits for, with the condition.
    #[must_use]
    pub fn depends_on(&self) -> &[(String, DependencyCondition)] {
        &self.depends_on
    }

    /// The `ContainerDefinitions` entry.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut def = Value::map([
            ("Essential", Value::from(self.essential)),
            ("Image", self.image.as_str().into()),
            ("MemoryReservation", self.memory_reservation_mib.into()),
            ("Name", self.name.as_str().into()),
        ]);
        if !self.environment.is_empty() {
            def.insert(
                "Environment",
                Value::list(self.environment.iter().map(|(name, value)| {
                    Value::map([("Name", name.as_str().into()), ("Value", value.clone())])
                })),
            );
        }
        if let Some(logs) = &self.logging {
            def.insert(
                "LogConfiguration",
                Value::map([
                    ("LogDriver", "awslogs".into()),
                    (
                        "Options",
                        Value::map([
                            ("awslogs-group", Value::reference(&logs.group)),
                            ("awslogs-region", logs.region.clone()),
                            ("awslogs-stream-prefix", logs.stream_prefix.as_str().into()),
                        ]),
                    ),
                ]),
            );
        }
        if let Some(hc) = &self.health_check {
            def.insert(
                "HealthCheck",
                Value::map([
                    (
                        "Command",
                        Value::list(hc.command.iter().map(|c| c.as_str().into())),
                    ),
                    ("Interval", hc.interval.into()),
                    ("Retries", hc.retries.into()),
                    ("Timeout", hc.timeout.into()),
                ]),
            );
        }
        if !self.port_mappings.is_empty() {
            def.insert(
                "PortMappings",
                Value::list(self.port_mappings.iter().map(|port| {
                    Value::map([
                        ("ContainerPort", Value::from(*port)),
                        ("Protocol", "tcp".into()),
                    ])
                })),
            );
        }
        if !self.ulimits.is_empty() {
            def.insert(
                "Ulimits",
                Value::list(self.ulimits.iter().map(|u| {
                    Value::map([
                        ("HardLimit", u.hard.into()),
                        ("Name", u.name.into()),
                        ("SoftLimit", u.soft.into()),
                    ])
                })),
            );
        }
        if let Some(user) = &self.user {
            def.insert("User", user.as_str().into());
        }
        if !self.depends_on.is_empty() {
            def.insert(
                "DependsOn",
                Value::list(self.depends_on.iter().map(|(container, condition)| {
                    Value::map([
                        ("Condition", condition.as_str().into()),
                        ("ContainerName", container.as_str().into()),
                    ])
                })),
            );
        }
        def
    }
}

/// Shape of the gateway task, fixed at construction.
///
/// With tracing, the proxy waits for the tracing side-car to have started so
/// the proxy's health check never runs against a missing daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLayout {
    WithoutTracing {
        proxy: ContainerSpec,
    },
    WithTracing {
        proxy: ContainerSpec,
        tracing: ContainerSpec,
    },
}

impl TaskLayout {
    /// Proxy only.
    #[must_use]
    pub fn without_tracing(proxy: ContainerSpec) -> Self {
        TaskLayout::WithoutTracing { proxy }
    }

    /// Proxy plus tracing side-car; the proxy gets a `START` dependency on it.
    #[must_use]
    pub fn with_tracing(mut proxy: ContainerSpec, tracing: ContainerSpec) -> Self {
        proxy
            .depends_on
            .push((tracing.name.clone(), DependencyCondition::Start));
        TaskLayout::WithTracing { proxy, tracing }
    }

    /// The proxy container; it is the task's default (load-balanced) container.
    #[must_use]
    pub fn proxy(&self) -> &ContainerSpec {
        match self {
            TaskLayout::WithoutTracing { proxy } | TaskLayout::WithTracing { proxy, .. } => proxy,
        }
    }

    /// The tracing side-car, if any.
    #[must_use]
    pub fn tracing(&self) -> Option<&ContainerSpec> {
        match self {
            TaskLayout::WithoutTracing { .. } => None,
            TaskLayout::WithTracing { tracing, .. } => Some(tracing),
        }
    }

    /// Containers in definition order.
    #[must_use]
    pub fn containers(&self) -> Vec<&ContainerSpec> {
        match self {
            TaskLayout::WithoutTracing { proxy } => vec![proxy],
            TaskLayout::WithTracing { proxy, tracing } => vec![proxy, tracing],
        }
    }

    /// `ContainerDefinitions` value.
    #[must_use]
    pub fn container_definitions(&self) -> Value {
        Value::list(self.containers().into_iter().map(ContainerSpec::to_value))
    }
}
