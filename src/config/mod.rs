//! Configuration: per-case module inputs and the suite config file.

mod file;
mod module;

pub use file::{
    BasicCase, CasesSection, ModuleSection, PlanCase, ProbeSection, SuiteConfig, ToolSection,
    DEFAULT_CONFIG_FILE,
};
pub use module::{parse_var, ModuleConfig, VarValue};
