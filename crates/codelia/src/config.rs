//! `codelia config` subcommands.
//!
//! Settings live in a TOML file managed by [`SettingsStore`]; these commands
//! load it, change one thing, and write it back.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use codelia_core::{Settings, SettingsStore};
use codelia_llm::ProviderKind;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current settings with API keys masked
    Show,

    /// Select the provider used for evaluate and improve
    SetProvider {
        /// openai, gemini, claude or enterprise_gateway
        provider: String,
    },

    /// Store the API key for a provider
    SetKey { provider: String, key: String },

    /// Store the base URL for a provider (empty string clears it)
    SetUrl { provider: String, url: String },

    /// Store the model for a provider (empty string clears it)
    SetModel { provider: String, model: String },

    /// Set the project context used when rewriting requirements
    SetProject {
        #[arg(long)]
        developer: Option<String>,

        #[arg(long)]
        system: Option<String>,

        #[arg(long)]
        client: Option<String>,
    },
}

pub fn handle_config_command(store: &SettingsStore, action: ConfigAction, json: bool) -> Result<()> {
    if let ConfigAction::Show = action {
        let settings = masked(store.load()?);
        if json {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        } else {
            println!("{} {}", "#".dimmed(), store.path().display().to_string().dimmed());
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        return Ok(());
    }

    let mut settings = store.load()?;
    apply(&mut settings, action)?;
    store.save(&settings)?;

    if !json {
        println!("{} {}", "Saved".green(), store.path().display());
    }
    Ok(())
}

fn apply(settings: &mut Settings, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {}
        ConfigAction::SetProvider { provider } => {
            let kind: ProviderKind = provider.parse()?;
            settings.provider = kind.as_str().to_string();
        }
        ConfigAction::SetKey { provider, key } => {
            settings.section_mut(provider.parse()?).key = key.trim().to_string();
        }
        ConfigAction::SetUrl { provider, url } => {
            settings.section_mut(provider.parse()?).url = non_blank(url);
        }
        ConfigAction::SetModel { provider, model } => {
            settings.section_mut(provider.parse()?).model = non_blank(model);
        }
        ConfigAction::SetProject {
            developer,
            system,
            client,
        } => {
            if let Some(developer) = developer {
                settings.project.developer = developer;
            }
            if let Some(system) = system {
                settings.project.system = system;
            }
            if let Some(client) = client {
                settings.project.client = client;
            }
        }
    }
    Ok(())
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `sk-abcdef123456` -> `********3456`
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}

fn masked(mut settings: Settings) -> Settings {
    for kind in ProviderKind::ALL {
        if settings.section(kind).is_some() {
            let section = settings.section_mut(kind);
            section.key = mask_key(&section.key);
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("codelia").join("config.toml"));
        (dir, store)
    }

    #[test]
    fn test_set_provider_normalizes_alias() {
        let (_dir, store) = store();
        handle_config_command(
            &store,
            ConfigAction::SetProvider {
                provider: "Anthropic".to_string(),
            },
            true,
        )
        .unwrap();

        assert_eq!(store.load().unwrap().provider, "claude");
    }

    #[test]
    fn test_set_provider_rejects_unknown() {
        let (_dir, store) = store();
        let result = handle_config_command(
            &store,
            ConfigAction::SetProvider {
                provider: "mistral".to_string(),
            },
            true,
        );
        assert!(result.is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_key_url_and_project() {
        let (_dir, store) = store();
        let actions = vec![
            ConfigAction::SetKey {
                provider: "gemini".to_string(),
                key: " g-key ".to_string(),
            },
            ConfigAction::SetUrl {
                provider: "gemini".to_string(),
                url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            },
            ConfigAction::SetModel {
                provider: "gemini".to_string(),
                model: "  ".to_string(),
            },
            ConfigAction::SetProject {
                developer: Some("ACME".to_string()),
                system: None,
                client: Some("Railway Co".to_string()),
            },
        ];
        for action in actions {
            handle_config_command(&store, action, true).unwrap();
        }

        let settings = store.load().unwrap();
        let gemini = settings.section(ProviderKind::Gemini).unwrap();
        assert_eq!(gemini.key, "g-key");
        assert_eq!(
            gemini.url.as_deref(),
            Some("https://generativelanguage.googleapis.com/v1beta")
        );
        assert_eq!(gemini.model, None);
        assert_eq!(settings.project.developer, "ACME");
        assert_eq!(settings.project.system, "");
        assert_eq!(settings.project.client, "Railway Co");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdef123456"), "********3456");
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn test_masked_leaves_missing_sections_alone() {
        let mut settings = Settings::default();
        settings.section_mut(ProviderKind::OpenAi).key = "sk-secret-9876".to_string();

        let masked = masked(settings);
        assert_eq!(masked.openai.unwrap().key, "********9876");
        assert!(masked.claude.is_none());
    }
}
