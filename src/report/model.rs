use serde::{Deserialize, Serialize};

/// One browser (or other environment) under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Context {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// Result of a single test as reported by the host runner.
///
/// Every field is optional on the wire; absent values fall back to
/// an empty description, no suite path, failure, zero time and no log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outcome {
    pub description: String,
    pub suite: Vec<String>,
    pub success: bool,
    /// Elapsed time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    pub log: Vec<String>,
}

impl Outcome {
    pub fn time_secs(&self) -> f64 {
        self.time.unwrap_or(0.0) / 1000.0
    }
}

/// Aggregate the host runner reports when a context completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextResult {
    pub total: u32,
    pub failed: u32,
    pub error: bool,
    pub disconnected: bool,
    /// Net execution time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_time: Option<f64>,
}

impl ContextResult {
    pub fn net_time_secs(&self) -> f64 {
        self.net_time.unwrap_or(0.0) / 1000.0
    }

    pub fn errored(&self) -> bool {
        self.error || self.disconnected
    }
}
