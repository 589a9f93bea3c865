//! E2E Suite Runner
//!
//! Reads YAML test suites and runs them against the booking service,
//! asserting on status codes and structured JSON bodies.

mod assertions;
mod config;
mod runner;
mod state;

pub use assertions::{check_body, check_response, deep_includes, lookup, values_match, Mismatch};
pub use config::*;
pub use runner::{
    collect_suite_files, load_suite, run_loaded_suite, run_suite, run_suites, StepOutcome,
    StepStatus, TestResult,
};
pub use state::{StateKey, SuiteState};
