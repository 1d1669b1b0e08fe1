use std::env;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::i18n::Language;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_DEPLOYMENT: &str = "gpt-35-turbo";
pub const DEFAULT_LANGUAGE: &str = "en";

const CONFIG_ENV: &str = "AI_CHAT_CONFIG";
const CONFIG_FILE_NAME: &str = ".ai-chat";

const AZURE_HOST_SUFFIXES: [&str; 2] = [".openai.azure.com", ".cognitiveservices.azure.com"];

/// The closed set of settings the config file may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    OpenAiKey,
    AzureOpenAiDeployment,
    OpenAiApiEndpoint,
    Language,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::OpenAiKey,
        ConfigKey::OpenAiApiEndpoint,
        ConfigKey::AzureOpenAiDeployment,
        ConfigKey::Language,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::OpenAiKey => "OPENAI_KEY",
            ConfigKey::AzureOpenAiDeployment => "AZURE_OPENAI_DEPLOYMENT",
            ConfigKey::OpenAiApiEndpoint => "OPENAI_API_ENDPOINT",
            ConfigKey::Language => "LANGUAGE",
        }
    }

    /// Applies the key's default to an absent or empty value.
    pub fn normalize(&self, value: Option<&str>) -> String {
        let value = value.filter(|v| !v.is_empty());
        match self {
            ConfigKey::OpenAiKey => value.unwrap_or_default().to_string(),
            ConfigKey::AzureOpenAiDeployment => value.unwrap_or(DEFAULT_DEPLOYMENT).to_string(),
            ConfigKey::OpenAiApiEndpoint => value.unwrap_or(DEFAULT_API_ENDPOINT).to_string(),
            ConfigKey::Language => value.unwrap_or(DEFAULT_LANGUAGE).to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| Error::InvalidConfigKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully defaulted settings, recomputed from disk on every [`ConfigStore::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub api_key: String,
    pub deployment_name: String,
    pub api_endpoint: String,
    pub language: String,
}

impl EffectiveConfig {
    pub fn get(&self, key: ConfigKey) -> &str {
        match key {
            ConfigKey::OpenAiKey => &self.api_key,
            ConfigKey::AzureOpenAiDeployment => &self.deployment_name,
            ConfigKey::OpenAiApiEndpoint => &self.api_endpoint,
            ConfigKey::Language => &self.language,
        }
    }

    pub fn language(&self) -> Language {
        Language::from_code(&self.language)
    }

    /// Resolves the backend to talk to, failing if any required setting is empty.
    pub fn credentials(&self) -> Result<Credentials> {
        let missing: Vec<&'static str> = [
            ConfigKey::OpenAiKey,
            ConfigKey::AzureOpenAiDeployment,
            ConfigKey::OpenAiApiEndpoint,
        ]
        .into_iter()
        .filter(|key| self.get(*key).trim().is_empty())
        .map(|key| key.name())
        .collect();
        if !missing.is_empty() {
            return Err(Error::MissingCredentials { missing });
        }

        let api_key = self.api_key.clone();
        let endpoint = self.api_endpoint.trim_end_matches('/').to_string();
        if is_azure_endpoint(&endpoint) {
            Ok(Credentials::AzureDeployment {
                api_key,
                endpoint,
                deployment: self.deployment_name.clone(),
            })
        } else {
            Ok(Credentials::OpenAi {
                api_key,
                base_url: endpoint,
                model: self.deployment_name.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OpenAI-compatible `/chat/completions`, model picked per request.
    OpenAi {
        api_key: String,
        base_url: String,
        model: String,
    },
    /// Azure-style endpoint where the deployment selects the model.
    AzureDeployment {
        api_key: String,
        endpoint: String,
        deployment: String,
    },
}

fn is_azure_endpoint(endpoint: &str) -> bool {
    reqwest::Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| AZURE_HOST_SUFFIXES.iter().any(|suffix| host.ends_with(suffix)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Setting {
        key: String,
        value: String,
        raw: Option<String>,
    },
    Section(String),
    Other(String),
}

/// The on-disk `key=value` file. Lines that are not top-level settings are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedConfig {
    lines: Vec<Line>,
}

impl PersistedConfig {
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut lines = Vec::new();
        let mut in_section = false;

        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                lines.push(Line::Other(line.to_string()));
            } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                in_section = true;
                lines.push(Line::Section(line.to_string()));
            } else if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(malformed(path, idx, line));
                }
                if in_section {
                    lines.push(Line::Other(line.to_string()));
                } else {
                    lines.push(Line::Setting {
                        key: key.to_string(),
                        value: unquote(value.trim()).to_string(),
                        raw: Some(line.to_string()),
                    });
                }
            } else {
                return Err(malformed(path, idx, line));
            }
        }

        Ok(Self { lines })
    }

    /// Value of a top-level setting; the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Setting { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn set(&mut self, key: &str, value: String) {
        let existing = self.lines.iter_mut().rev().find_map(|line| match line {
            Line::Setting { key: k, value, raw } if k == key => Some((value, raw)),
            _ => None,
        });
        if let Some((slot, raw)) = existing {
            *slot = value;
            *raw = None;
            return;
        }

        // New settings must land before any section header to stay top-level.
        let at = self
            .lines
            .iter()
            .position(|line| matches!(line, Line::Section(_)))
            .unwrap_or(self.lines.len());
        self.lines.insert(
            at,
            Line::Setting {
                key: key.to_string(),
                value,
                raw: None,
            },
        );
    }

    pub fn to_ini(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Setting {
                    raw: Some(raw), ..
                } => out.push_str(raw),
                Line::Setting { key, value, .. } => {
                    out.push_str(key);
                    out.push('=');
                    if needs_quotes(value) {
                        out.push('"');
                        out.push_str(value);
                        out.push('"');
                    } else {
                        out.push_str(value);
                    }
                }
                Line::Section(raw) | Line::Other(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }
}

fn malformed(path: &Path, idx: usize, line: &str) -> Error {
    Error::ConfigParse {
        path: path.to_path_buf(),
        line: idx + 1,
        content: line.to_string(),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Values that `parse` would otherwise trim or unquote are wrapped so they read back as written.
fn needs_quotes(value: &str) -> bool {
    unquote(value) != value || value.trim() != value
}

/// Reads and writes the per-user config file. There is no locking; concurrent
/// writers race and the last one wins.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$AI_CHAT_CONFIG` if set, otherwise `~/.ai-chat`.
    pub fn locate() -> Self {
        if let Ok(path) = env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Self::new(path);
            }
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<EffectiveConfig> {
        let persisted = self.load()?;
        let value = |key: ConfigKey| key.normalize(persisted.get(key.name()));
        Ok(EffectiveConfig {
            api_key: value(ConfigKey::OpenAiKey),
            deployment_name: value(ConfigKey::AzureOpenAiDeployment),
            api_endpoint: value(ConfigKey::OpenAiApiEndpoint),
            language: value(ConfigKey::Language),
        })
    }

    /// Validates every entry before touching the file; one bad key or value rejects the batch.
    pub fn write(&self, entries: &[(&str, &str)]) -> Result<()> {
        let entries = entries
            .iter()
            .map(|(key, value)| {
                let key = key.parse::<ConfigKey>()?;
                if value.contains(['\n', '\r']) {
                    return Err(Error::InvalidConfigValue {
                        key: key.name(),
                        reason: "line breaks are not allowed",
                    });
                }
                Ok((key, *value))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut persisted = self.load()?;
        for (key, value) in &entries {
            persisted.set(key.name(), key.normalize(Some(*value)));
        }
        self.save(&persisted)?;

        let keys: Vec<&str> = entries.iter().map(|(key, _)| key.name()).collect();
        info!(path = %self.path.display(), ?keys, "config updated");
        Ok(())
    }

    pub fn load(&self) -> Result<PersistedConfig> {
        match fs::read_to_string(&self.path) {
            Ok(content) => PersistedConfig::parse(&self.path, &content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config file not found, using defaults");
                Ok(PersistedConfig::default())
            }
            Err(err) => Err(Error::config_io(&self.path, err)),
        }
    }

    fn save(&self, persisted: &PersistedConfig) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::config_io(dir, e))?;
        tmp.write_all(persisted.to_ini().as_bytes())
            .map_err(|e| Error::config_io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| Error::config_io(&self.path, e.error))?;
        Ok(())
    }
}
