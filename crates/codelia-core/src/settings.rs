//! Persisted settings: selected provider, per-provider credentials and the
//! project context used when rewriting.
//!
//! Stored as TOML at `<config_dir>/codelia/config.toml` unless overridden.

use std::io;
use std::path::{Path, PathBuf};

use codelia_llm::{ProviderConfig, ProviderError, ProviderKind};
use codelia_scoring::ProjectContext;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the settings file location
pub const CONFIG_ENV_VAR: &str = "CODELIA_CONFIG";

pub const CONFIG_DIR_NAME: &str = "codelia";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Credentials and overrides for one provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_provider() -> String {
    ProviderKind::OpenAi.as_str().to_string()
}

/// Everything stored in the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Selected provider name; parsed when a provider is built
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<ProviderSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude: Option<ProviderSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_gateway: Option<ProviderSettings>,
    #[serde(default)]
    pub project: ProjectContext,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai: None,
            gemini: None,
            claude: None,
            enterprise_gateway: None,
            project: ProjectContext::default(),
        }
    }
}

/// Partial settings; every field present replaces the stored one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub provider: Option<String>,
    pub openai: Option<ProviderSettings>,
    pub gemini: Option<ProviderSettings>,
    pub claude: Option<ProviderSettings>,
    pub enterprise_gateway: Option<ProviderSettings>,
    pub project: Option<ProjectContext>,
}

impl Settings {
    pub fn section(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        match kind {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::Claude => self.claude.as_ref(),
            ProviderKind::EnterpriseGateway => self.enterprise_gateway.as_ref(),
        }
    }

    /// The section for `kind`, created empty if missing
    pub fn section_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        let slot = match kind {
            ProviderKind::OpenAi => &mut self.openai,
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::Claude => &mut self.claude,
            ProviderKind::EnterpriseGateway => &mut self.enterprise_gateway,
        };
        slot.get_or_insert_with(ProviderSettings::default)
    }

    /// Apply a partial update
    pub fn merge(&mut self, update: SettingsUpdate) {
        if let Some(provider) = update.provider {
            self.provider = provider;
        }
        if let Some(section) = update.openai {
            self.openai = Some(section);
        }
        if let Some(section) = update.gemini {
            self.gemini = Some(section);
        }
        if let Some(section) = update.claude {
            self.claude = Some(section);
        }
        if let Some(section) = update.enterprise_gateway {
            self.enterprise_gateway = Some(section);
        }
        if let Some(project) = update.project {
            self.project = project;
        }
    }

    /// The selected provider, parsed
    pub fn provider_kind(&self) -> Result<ProviderKind, ProviderError> {
        self.provider.parse()
    }

    /// Provider configuration for the selected provider.
    ///
    /// A missing section yields an empty key, which the factory rejects as a
    /// missing credential.
    pub fn provider_config(&self) -> Result<ProviderConfig, ProviderError> {
        let kind = self.provider_kind()?;
        let mut config = ProviderConfig::new(kind, "");

        if let Some(section) = self.section(kind) {
            config.api_key = section.key.clone();
            config.base_url = section.url.clone();
            config.model = section.model.clone();
        }
        Ok(config)
    }

    pub fn project_context(&self) -> &ProjectContext {
        &self.project
    }
}

/// Loads and saves [`Settings`] at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$CODELIA_CONFIG`, or the default location
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Ok(Self::new(path)),
            _ => Self::default_path().map(Self::new),
        }
    }

    /// `<config_dir>/codelia/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields defaults
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write settings, creating parent directories as needed
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(settings)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(&self.path, content).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }

    /// Load, apply `update`, save and return the merged settings
    pub fn update(&self, update: SettingsUpdate) -> Result<Settings, ConfigError> {
        let mut settings = self.load()?;
        settings.merge(update);
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("nested").join(CONFIG_FILE_NAME))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = store_in(&dir).load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.provider, "openai");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut settings = Settings {
            provider: "gemini".to_string(),
            ..Default::default()
        };
        settings.section_mut(ProviderKind::Gemini).key = "g-key".to_string();
        settings.section_mut(ProviderKind::Gemini).url =
            Some("https://generativelanguage.googleapis.com/v1beta".to_string());
        settings.project = ProjectContext::new("ACME", "Braking Controller", "Railway Co");

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_parses_hand_written_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
provider = "claude"

[claude]
key = "ak-1"
model = "claude-3-opus"

[project]
developer = "ACME"
"#,
        )
        .unwrap();

        let settings = SettingsStore::new(&path).load().unwrap();
        let config = settings.provider_config().unwrap();
        assert_eq!(config.provider, ProviderKind::Claude);
        assert_eq!(config.api_key, "ak-1");
        assert_eq!(config.model(), Some("claude-3-opus"));
        assert_eq!(config.base_url(), None);
        assert_eq!(settings.project_context().developer, "ACME");
        assert_eq!(settings.project_context().client, "");
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "provider = [unterminated").unwrap();

        let err = SettingsStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_merge_replaces_top_level_sections() {
        let mut settings = Settings::default();
        settings.section_mut(ProviderKind::OpenAi).key = "old".to_string();
        settings.section_mut(ProviderKind::OpenAi).model = Some("gpt-4o".to_string());
        settings.section_mut(ProviderKind::Claude).key = "ak".to_string();

        settings.merge(SettingsUpdate {
            provider: Some("claude".to_string()),
            openai: Some(ProviderSettings {
                key: "new".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });

        assert_eq!(settings.provider, "claude");
        let openai = settings.section(ProviderKind::OpenAi).unwrap();
        assert_eq!(openai.key, "new");
        assert_eq!(openai.model, None);
        assert_eq!(settings.section(ProviderKind::Claude).unwrap().key, "ak");
    }

    #[test]
    fn test_update_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .update(SettingsUpdate {
                project: Some(ProjectContext::new("", "Pump", "")),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(store.load().unwrap().project.system, "Pump");
    }

    #[test]
    fn test_provider_config_without_section_has_empty_key() {
        let settings = Settings {
            provider: "enterprise_gateway".to_string(),
            ..Default::default()
        };
        let config = settings.provider_config().unwrap();
        assert_eq!(config.provider, ProviderKind::EnterpriseGateway);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_unknown_provider_is_unsupported() {
        let settings = Settings {
            provider: "mistral".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            settings.provider_config(),
            Err(ProviderError::UnsupportedProvider(_))
        ));
    }
}
