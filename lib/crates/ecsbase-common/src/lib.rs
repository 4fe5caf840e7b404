pub mod exports;
pub mod outputs;

pub use exports::{ExportName, UnknownExport};
pub use outputs::{STRESS_TOOL_INSTANCE_ID, STRESS_TOOL_PRIVATE_IP};
