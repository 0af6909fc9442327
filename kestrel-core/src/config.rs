//! Layered configuration loading: built-in defaults, an optional
//! `.kestrel/config.toml` in the project root, then a handful of
//! environment-variable overrides, in that order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig as LoopConfig;
use crate::context::DEFAULT_COMPRESSION_THRESHOLD;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSection {
    pub name: String,
    pub context_window_size: u64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self { name: "local".to_string(), context_window_size: 8192 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_tool_calls: usize,
    pub auto_apply: bool,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self { max_tool_calls: 20, auto_apply: false }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContextSection {
    pub compression_threshold: f64,
}

impl Default for ContextSection {
    fn default() -> Self {
        Self { compression_threshold: DEFAULT_COMPRESSION_THRESHOLD }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSection {
    /// Relative to the project root; `None` uses an in-memory store.
    pub path: Option<PathBuf>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self { path: Some(PathBuf::from(".kestrel/state.json")) }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KestrelConfig {
    pub model: ModelSection,
    pub agent: AgentSection,
    pub context: ContextSection,
    pub storage: StorageSection,
}

impl KestrelConfig {
    /// Loads configuration from `<workspace>/.kestrel/config.toml` if it
    /// exists, then applies `KESTREL_*` environment overrides.
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        let workspace = workspace.as_ref();
        let config_path = workspace.join(".kestrel").join("config.toml");

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)
                .with_context(|| format!("failed to load {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.as_ref().display()))?;
        Ok(config)
    }

    /// Resolves the default project root from `$KESTREL_WORKSPACE` or the
    /// current directory, then loads as [`Self::load_from_workspace`] would.
    pub fn load() -> Result<Self> {
        if let Ok(workspace) = std::env::var("KESTREL_WORKSPACE") {
            let trimmed = workspace.trim();
            if !trimmed.is_empty() {
                return Self::load_from_workspace(trimmed);
            }
        }
        Self::load_from_workspace(std::env::current_dir()?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("KESTREL_MODEL") {
            if !model.trim().is_empty() {
                self.model.name = model;
            }
        }
        if let Ok(auto_apply) = std::env::var("KESTREL_AUTO_APPLY") {
            if let Ok(value) = auto_apply.trim().parse::<bool>() {
                self.agent.auto_apply = value;
            }
        }
        if let Ok(max_calls) = std::env::var("KESTREL_MAX_TOOL_CALLS") {
            if let Ok(value) = max_calls.trim().parse::<usize>() {
                self.agent.max_tool_calls = value;
            }
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig { max_tool_calls: self.agent.max_tool_calls, auto_apply: self.agent.auto_apply }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_sane() {
        let config = KestrelConfig::default();
        assert_eq!(config.agent.max_tool_calls, 20);
        assert!((config.context.compression_threshold - 0.8).abs() < 1e-9);
    }

    #[test]
    fn loads_project_config_file_when_present() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join(".kestrel")).unwrap();
        fs::write(
            dir.path().join(".kestrel/config.toml"),
            "[model]\nname = \"custom-model\"\n\n[agent]\nmax_tool_calls = 5\n",
        )
        .unwrap();

        let config = KestrelConfig::load_from_workspace(dir.path()).unwrap();
        assert_eq!(config.model.name, "custom-model");
        assert_eq!(config.agent.max_tool_calls, 5);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let config = KestrelConfig::load_from_workspace(dir.path()).unwrap();
        assert_eq!(config.model.name, "local");
    }
}
