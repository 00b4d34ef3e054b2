//! chega-check - structural audit and liveness checks for the Leidy Cleaner project
//! This library exposes the audit checks, the report writer and the liveness
//! probes so they can be driven programmatically or from tests.

pub mod checks;
pub mod config;
pub mod error;
pub mod live;
pub mod output;
pub mod report;
pub mod utils;

// Re-export main types for convenience
pub use checks::{
    run_audit, success_rate, AuditRun, CheckContext, CheckGroup, CheckResult, CheckStatus,
    Section, SectionLine,
};
pub use config::ChegaConfig;
pub use error::ChegaError;
pub use live::{run_liveness, LivenessReport, ProbeGroup, ProbeStatus, Reachability};
pub use output::{ChegaOutput, OutputFormat, Palette};
pub use report::{render_report, save_report};
pub use utils::{CommandResult, CommandRunner, SystemRunner};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
