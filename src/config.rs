use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::report::metadata::EnvSource;

pub const DEFAULT_OUTPUT_FILE: &str = "test-results.xml";
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";
pub const DEFAULT_TAGGING_MARKER: &str = "XRAY";

/// Environment variable that overrides `projectKey` when set and non-empty.
pub const PROJECT_KEY_ENV: &str = "JIRA_PROJECT_KEY";

const SETTINGS_DIR: &str = ".junit-xray";
const SETTINGS_FILE: &str = "settings.json";

/// Static reporter configuration handed to the reporter at construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReporterConfig {
    pub base_path: PathBuf,
    pub output_file: PathBuf,
    pub timestamp_output_file: bool,
    pub metadata_file: PathBuf,
    /// Package label written on every `testsuite`.
    pub suite: String,
    pub project_key: String,
    /// Skip outcomes whose description carries no tag instead of defaulting them.
    pub xray_id_only: bool,
    pub tagging_marker: String,
    pub env_properties: Vec<String>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            timestamp_output_file: false,
            metadata_file: PathBuf::from(DEFAULT_METADATA_FILE),
            suite: String::new(),
            project_key: String::new(),
            xray_id_only: false,
            tagging_marker: DEFAULT_TAGGING_MARKER.to_string(),
            env_properties: vec![
                "buildVersion".to_string(),
                "BUILD_NUMBER".to_string(),
                "GIT_BRANCH".to_string(),
                "GIT_COMMIT".to_string(),
            ],
        }
    }
}

impl ReporterConfig {
    /// Parse a full config from JSON. Missing keys keep their defaults.
    pub fn from_json(content: &str) -> crate::Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| crate::Error::Config(format!("invalid reporter config: {}", e)))
    }

    /// Absolute location of the XML report.
    ///
    /// With `timestampOutputFile` the stem gets a `-YYYYMMDDTHHMMSS` suffix taken from `now`.
    pub fn output_path(&self, now: chrono::DateTime<chrono::Utc>) -> PathBuf {
        let resolved = self.resolve(&self.output_file);
        if !self.timestamp_output_file {
            return resolved;
        }
        let stamp = now.format("%Y%m%dT%H%M%S");
        let stem = resolved
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "test-results".to_string());
        let name = match resolved.extension() {
            Some(ext) => format!("{}-{}.{}", stem, stamp, ext.to_string_lossy()),
            None => format!("{}-{}", stem, stamp),
        };
        resolved.with_file_name(name)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.resolve(&self.metadata_file)
    }

    /// Project key after applying the `JIRA_PROJECT_KEY` override.
    pub fn effective_project_key(&self, env: &dyn EnvSource) -> String {
        match env.var(PROJECT_KEY_ENV) {
            Some(key) if !key.is_empty() => key,
            _ => self.project_key.clone(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

/// Raw JSON representation — all fields optional for partial overrides.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    base_path: Option<PathBuf>,
    output_file: Option<PathBuf>,
    timestamp_output_file: Option<bool>,
    metadata_file: Option<PathBuf>,
    suite: Option<String>,
    project_key: Option<String>,
    xray_id_only: Option<bool>,
    tagging_marker: Option<String>,
    env_properties: Option<Vec<String>>,
}

/// Resolve settings: defaults → user global → project-local.
pub fn resolve(project_root: Option<&Path>) -> ReporterConfig {
    let global_path = dirs::home_dir().map(|h| h.join(SETTINGS_DIR).join(SETTINGS_FILE));
    let project_path = project_root.map(|r| r.join(SETTINGS_DIR).join(SETTINGS_FILE));
    resolve_with_paths(global_path.as_deref(), project_path.as_deref())
}

/// Testable resolver that accepts explicit file paths (no home dir dependency).
fn resolve_with_paths(global_path: Option<&Path>, project_path: Option<&Path>) -> ReporterConfig {
    let mut config = ReporterConfig::default();

    if let Some(path) = global_path {
        apply_file(&mut config, path);
    }
    if let Some(path) = project_path {
        apply_file(&mut config, path);
    }

    config
}

fn apply_file(config: &mut ReporterConfig, path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else { return };
    let Ok(file) = serde_json::from_str::<SettingsFile>(&content) else {
        tracing::warn!("Invalid settings file, ignoring: {}", path.display());
        return;
    };
    merge(config, file);
}

/// Layer an explicitly requested settings file on top of `config`.
///
/// Unlike the implicit layers, a missing or malformed file is an error.
pub fn apply_explicit(config: &mut ReporterConfig, path: &Path) -> crate::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| crate::Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let file = serde_json::from_str::<SettingsFile>(&content)
        .map_err(|e| crate::Error::Config(format!("invalid settings file {}: {}", path.display(), e)))?;
    merge(config, file);
    Ok(())
}

fn merge(config: &mut ReporterConfig, file: SettingsFile) {
    if let Some(v) = file.base_path {
        config.base_path = v;
    }
    if let Some(v) = file.output_file {
        config.output_file = v;
    }
    if let Some(v) = file.timestamp_output_file {
        config.timestamp_output_file = v;
    }
    if let Some(v) = file.metadata_file {
        config.metadata_file = v;
    }
    if let Some(v) = file.suite {
        config.suite = v;
    }
    if let Some(v) = file.project_key {
        config.project_key = v;
    }
    if let Some(v) = file.xray_id_only {
        config.xray_id_only = v;
    }
    if let Some(v) = file.tagging_marker {
        if v.trim().is_empty() {
            tracing::warn!("taggingMarker is empty, keeping '{}'", config.tagging_marker);
        } else {
            config.tagging_marker = v;
        }
    }
    if let Some(v) = file.env_properties {
        config.env_properties = v;
    }
}
