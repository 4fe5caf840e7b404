//! Unexported output keys of the base stack.
//!
//! These are read from the stack's own `Outputs` (for example with
//! `describe-stacks`) rather than imported, so they carry no `ExportName`.

/// Instance ID of the stress-tool bastion.
pub const STRESS_TOOL_INSTANCE_ID: &str = "StressToolEc2Id";

/// Private IP of the stress-tool bastion.
pub const STRESS_TOOL_PRIVATE_IP: &str = "StressToolEc2Ip";
