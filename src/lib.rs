pub mod config;
pub mod error;
pub mod host;
pub mod report;

pub use config::ReporterConfig;
pub use error::{Error, Result};
pub use report::JunitXrayReporter;
