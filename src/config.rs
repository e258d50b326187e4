//! Gate configuration.
//!
//! Everything the original read from ambient process globals arrives here as
//! an explicit input instead: the catalog directory, the version source, the
//! channel under guard. Configuration is a YAML file (`stile.yml`), loaded
//! once at startup; environment-variable fallbacks are resolved at load
//! time, so the rest of the crate sees plain values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::env::{CommandRuntime, EnvVarRuntime, RuntimeEnvironment, StaticRuntime};
use crate::error::{Result, StileError};
use crate::version::MajorVersion;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "stile.yml";

/// Environment variable consulted when `catalog_dir` is not configured.
pub const CATALOG_DIR_VAR: &str = "STILE_CATALOG_DIR";

/// Environment variable the default version source reads.
pub const HOST_VERSION_VAR: &str = "STILE_HOST_VERSION";

/// Where the running environment's version string comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// Read a named environment variable.
    EnvVar { var: String },
    /// Run a probe command and extract the version token from its output.
    Command { command: String },
    /// A fixed version string.
    Literal { value: String },
}

impl Default for VersionSource {
    fn default() -> Self {
        VersionSource::EnvVar {
            var: HOST_VERSION_VAR.to_string(),
        }
    }
}

impl VersionSource {
    /// Build the accessor for this source.
    pub fn runtime(&self) -> Box<dyn RuntimeEnvironment> {
        match self {
            VersionSource::EnvVar { var } => Box::new(EnvVarRuntime::new(var)),
            VersionSource::Command { command } => Box::new(CommandRuntime::from_string(command)),
            VersionSource::Literal { value } => Box::new(StaticRuntime::version(value)),
        }
    }
}

/// Informational links shown alongside the upgrade warning.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Links {
    /// Release notes of the guarded component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,

    /// Where to download a compatible host installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<String>,

    /// Community support channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<String>,
}

/// Top-level gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum major version the guarded component requires.
    pub required_version: u32,

    /// Display name of the guarded component.
    pub component: String,

    /// Name of the update channel that delivers the component.
    pub channel: String,

    /// Directory holding the channel catalog. Falls back to
    /// [`CATALOG_DIR_VAR`] when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_dir: Option<PathBuf>,

    /// Where the running environment's version comes from.
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub version_source: VersionSource,

    /// One-shot delay before the interactive prompt, in milliseconds.
    #[serde(default = "default_prompt_delay_ms")]
    pub prompt_delay_ms: u64,

    /// Command line of the external change reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_command: Option<String>,

    /// Informational links for the warning messages.
    #[serde(default)]
    pub links: Links,
}

fn default_prompt_delay_ms() -> u64 {
    2500
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            required_version: 0,
            component: "this component".to_string(),
            channel: String::new(),
            catalog_dir: None,
            version_source: VersionSource::default(),
            prompt_delay_ms: default_prompt_delay_ms(),
            reviewer_command: None,
            links: Links::default(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StileError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| StileError::ConfigParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(config)
    }

    /// The catalog directory: the configured value, else the
    /// [`CATALOG_DIR_VAR`] environment variable, else `None`, which the
    /// negotiation layer reports as an undeterminable location.
    pub fn resolve_catalog_dir(&self) -> Option<PathBuf> {
        self.resolve_catalog_dir_with(|key| std::env::var(key))
    }

    /// Like [`resolve_catalog_dir`](Self::resolve_catalog_dir), with a
    /// custom env var lookup. This allows testing without modifying actual
    /// environment variables.
    pub fn resolve_catalog_dir_with<F>(&self, env_fn: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        self.catalog_dir.clone().or_else(|| {
            env_fn(CATALOG_DIR_VAR)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    /// The required version as a comparable ordinal.
    pub fn required(&self) -> MajorVersion {
        MajorVersion::from(self.required_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_fails_when_file_missing() {
        let temp = TempDir::new().unwrap();
        let result = GateConfig::load(&temp.path().join(CONFIG_FILE_NAME));
        assert!(matches!(result, Err(StileError::ConfigNotFound { .. })));
    }

    #[test]
    fn load_fails_on_malformed_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "required_version: [not an int").unwrap();
        assert!(matches!(
            GateConfig::load(&path),
            Err(StileError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn load_minimal_config_applies_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "required_version: 21\ncomponent: neuro-tools\nchannel: neuro-channel\n",
        )
        .unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.required().get(), 21);
        assert_eq!(config.channel, "neuro-channel");
        assert_eq!(config.prompt_delay_ms, 2500);
        assert_eq!(
            config.version_source,
            VersionSource::EnvVar {
                var: HOST_VERSION_VAR.to_string()
            }
        );
        assert!(config.reviewer_command.is_none());
    }

    #[test]
    fn load_full_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            concat!(
                "required_version: 21\n",
                "component: neuro-tools\n",
                "channel: neuro-channel\n",
                "catalog_dir: /opt/host\n",
                "version_source:\n",
                "  literal:\n",
                "    value: 1.8.0_392\n",
                "prompt_delay_ms: 0\n",
                "reviewer_command: update-reviewer\n",
                "links:\n",
                "  release_notes: https://example.org/releases\n",
            ),
        )
        .unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.catalog_dir.as_deref(), Some(Path::new("/opt/host")));
        assert_eq!(config.prompt_delay_ms, 0);
        assert_eq!(
            config.links.release_notes.as_deref(),
            Some("https://example.org/releases")
        );
        let runtime = config.version_source.runtime();
        assert_eq!(runtime.current_major_version().get(), 8);
    }

    #[test]
    fn resolve_catalog_dir_prefers_configured_value() {
        let config = GateConfig {
            catalog_dir: Some(PathBuf::from("/from/config")),
            ..GateConfig::default()
        };
        let resolved = config.resolve_catalog_dir_with(|_| Ok("/from/env".to_string()));
        assert_eq!(resolved, Some(PathBuf::from("/from/config")));
    }

    #[test]
    fn resolve_catalog_dir_falls_back_to_env_var() {
        let config = GateConfig::default();
        let resolved = config.resolve_catalog_dir_with(|key| {
            if key == CATALOG_DIR_VAR {
                Ok("/from/env".to_string())
            } else {
                Err(std::env::VarError::NotPresent)
            }
        });
        assert_eq!(resolved, Some(PathBuf::from("/from/env")));
    }

    #[test]
    fn resolve_catalog_dir_unset_is_none() {
        let config = GateConfig::default();
        let resolved = config.resolve_catalog_dir_with(|_| Err(std::env::VarError::NotPresent));
        assert_eq!(resolved, None);
    }

    #[test]
    fn version_source_literal_round_trip() {
        let source = VersionSource::Literal {
            value: "22-ea".to_string(),
        };
        assert_eq!(source.runtime().current_major_version().get(), 22);
    }
}
