//! cubeseg-test - Regression test framework for the cubeseg workspace
//!
//! This crate provides the pieces the regression tests of every cubeseg
//! crate share:
//!
//! - [`RegParams`] - Numbered checks with a single pass/fail report
//! - [`MemoryHost`] - In-memory dataset, skeleton and viewport
//! - [`fixtures`] - Synthetic membrane predictions
//! - [`init_logging`] - `tracing` output routed to the test harness
//!
//! # Usage
//!
//! ```ignore
//! use cubeseg_test::{RegParams, MemoryHost};
//!
//! let mut rp = RegParams::new("split");
//! rp.compare_values(125000.0, size as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" or "display"
//! - `RUST_LOG`: Log filter for [`init_logging`], `warn` when unset

mod error;
pub mod fixtures;
mod host;
mod params;

pub use error::{TestError, TestResult};
pub use host::{AnnotationLock, LoaderSwitch, MemoryHost, MemoryNode, Tag};
pub use params::{RegParams, RegTestMode};

use tracing_subscriber::EnvFilter;

/// Route `tracing` events to the test output
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
