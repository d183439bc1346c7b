use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Read-only view over environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables, for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Build metadata consumed by the traceability import.
///
/// Unset variables serialize as `null` so every requested key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub jira_project_key: String,
    pub env_properties: BTreeMap<String, Option<String>>,
}

impl Metadata {
    /// Snapshot `keys` from `env`.
    pub fn capture(project_key: impl Into<String>, keys: &[String], env: &dyn EnvSource) -> Self {
        let env_properties = keys.iter().map(|key| (key.clone(), env.var(key))).collect();
        Self { jira_project_key: project_key.into(), env_properties }
    }

    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
