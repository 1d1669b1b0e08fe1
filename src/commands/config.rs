//! `ai-chat config`: interactive settings menu plus scriptable `get`/`set`.

use anyhow::{Result, bail};
use clap::Subcommand;
use crossterm::style::Stylize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing::debug;

use crate::config::{ConfigKey, ConfigStore, EffectiveConfig};
use crate::i18n::{Language, MessageKey, t};

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print effective settings (all of them when no key is given).
    Get { keys: Vec<String> },
    /// Store one or more settings, e.g. `OPENAI_KEY=sk-... LANGUAGE=fr`.
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,
    },
}

pub fn run(store: &ConfigStore, action: Option<ConfigAction>) -> Result<()> {
    match action {
        None => show_menu(store),
        Some(ConfigAction::Get { keys }) => get(store, &keys),
        Some(ConfigAction::Set { pairs }) => set(store, &pairs),
    }
}

fn get(store: &ConfigStore, keys: &[String]) -> Result<()> {
    let keys = if keys.is_empty() {
        ConfigKey::ALL.to_vec()
    } else {
        keys.iter()
            .map(|key| key.parse::<ConfigKey>())
            .collect::<Result<Vec<_>, _>>()?
    };

    let config = store.read()?;
    for key in keys {
        println!("{key}={}", display_value(&config, key));
    }
    Ok(())
}

fn set(store: &ConfigStore, pairs: &[String]) -> Result<()> {
    let mut entries = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE, got {pair:?}");
        };
        entries.push((key.trim(), value.trim()));
    }
    store.write(&entries)?;
    Ok(())
}

fn display_value(config: &EffectiveConfig, key: ConfigKey) -> String {
    let value = config.get(key);
    match key {
        ConfigKey::OpenAiKey => mask_key(value).unwrap_or_default(),
        _ => value.to_string(),
    }
}

/// `sk-...` plus the last three characters, or `None` for an empty key.
fn mask_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    let tail: String = key
        .chars()
        .rev()
        .take(3)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    Some(format!("sk-...{tail}"))
}

fn label(key: ConfigKey) -> MessageKey {
    match key {
        ConfigKey::OpenAiKey => MessageKey::OpenAiKey,
        ConfigKey::OpenAiApiEndpoint => MessageKey::OpenAiApiEndpoint,
        ConfigKey::AzureOpenAiDeployment => MessageKey::AzureDeployment,
        ConfigKey::Language => MessageKey::LanguageSetting,
    }
}

fn menu_items(config: &EffectiveConfig, lang: &Language) -> Vec<String> {
    let mut items: Vec<String> = ConfigKey::ALL
        .iter()
        .map(|&key| {
            let hint = match key {
                ConfigKey::OpenAiKey => mask_key(config.get(key))
                    .unwrap_or_else(|| t(lang, MessageKey::NotSet).to_string()),
                _ => config.get(key).to_string(),
            };
            format!("{} {}", t(lang, label(key)), format!("({hint})").dim())
        })
        .collect();
    items.push(t(lang, MessageKey::Cancel).to_string());
    items
}

/// Re-reads the config each round so a language change applies immediately.
fn show_menu(store: &ConfigStore) -> Result<()> {
    let theme = ColorfulTheme::default();
    loop {
        let config = store.read()?;
        let lang = config.language();
        let items = menu_items(&config, &lang);

        let choice = Select::with_theme(&theme)
            .with_prompt(format!("{}:", t(&lang, MessageKey::SetConfig)))
            .items(&items)
            .default(0)
            .interact_opt()?;

        let key = match choice {
            Some(idx) if idx < ConfigKey::ALL.len() => ConfigKey::ALL[idx],
            _ => return Ok(()),
        };
        debug!(%key, "editing setting");

        let Some(value) = prompt_value(&theme, key, lang)? else {
            return Ok(());
        };
        store.write(&[(key.name(), value.as_str())])?;
    }
}

fn prompt_value(theme: &ColorfulTheme, key: ConfigKey, lang: Language) -> Result<Option<String>> {
    let value = match key {
        ConfigKey::OpenAiKey => Input::<String>::with_theme(theme)
            .with_prompt(t(&lang, MessageKey::EnterApiKey))
            .validate_with(move |input: &String| -> Result<(), &'static str> {
                if input.is_empty() {
                    Err(t(&lang, MessageKey::PleaseEnterKey))
                } else {
                    Ok(())
                }
            })
            .interact_text()?,
        ConfigKey::OpenAiApiEndpoint => Input::<String>::with_theme(theme)
            .with_prompt(t(&lang, MessageKey::EnterApiEndpoint))
            .allow_empty(true)
            .interact_text()?,
        ConfigKey::AzureOpenAiDeployment => Input::<String>::with_theme(theme)
            .with_prompt(t(&lang, MessageKey::EnterDeployment))
            .allow_empty(true)
            .interact_text()?,
        ConfigKey::Language => {
            let labels: Vec<&str> = Language::ALL.iter().map(|l| l.label()).collect();
            let current = Language::ALL.iter().position(|l| *l == lang).unwrap_or(0);
            let Some(idx) = Select::with_theme(theme)
                .with_prompt(t(&lang, MessageKey::EnterLanguage))
                .items(&labels)
                .default(current)
                .interact_opt()?
            else {
                return Ok(None);
            };
            Language::ALL[idx].code().to_string()
        }
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effective() -> EffectiveConfig {
        EffectiveConfig {
            api_key: "sk-abcdef123".to_string(),
            deployment_name: "gpt-4o".to_string(),
            api_endpoint: "https://api.openai.com/v1".to_string(),
            language: "fr".to_string(),
        }
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdef123").as_deref(), Some("sk-...123"));
        assert_eq!(mask_key("ab").as_deref(), Some("sk-...ab"));
        assert_eq!(mask_key(""), None);
    }

    #[test]
    fn test_display_value_masks_only_the_key() {
        let config = effective();
        assert_eq!(display_value(&config, ConfigKey::OpenAiKey), "sk-...123");
        assert_eq!(display_value(&config, ConfigKey::AzureOpenAiDeployment), "gpt-4o");
    }

    #[test]
    fn test_menu_items_end_with_cancel() {
        let mut config = effective();
        config.api_key.clear();
        let items = menu_items(&config, &Language::En);
        assert_eq!(items.len(), ConfigKey::ALL.len() + 1);
        assert!(items[0].starts_with("OpenAI Key"));
        assert!(items[0].contains("(not set)"));
        assert_eq!(items[4], "Cancel (exit the program)");
    }

    #[test]
    fn test_set_writes_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join(".ai-chat"));
        set(&store, &["LANGUAGE=fr".to_string(), "OPENAI_KEY = sk-1".to_string()]).unwrap();
        let config = store.read().unwrap();
        assert_eq!(config.language, "fr");
        assert_eq!(config.api_key, "sk-1");
    }

    #[test]
    fn test_set_rejects_missing_separator() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join(".ai-chat"));
        assert!(set(&store, &["LANGUAGE".to_string()]).is_err());
        assert!(!store.path().exists());
    }
}
