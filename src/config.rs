use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV_PREFIX: &str = "MASTO";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub mastodon: MastodonConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MastodonConfig {
    /// Base URL of the instance, e.g. `https://mastodon.social`.
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            instance: String::new(),
            access_token: String::new(),
            user_agent: default_user_agent(),
            page_size: default_page_size(),
        }
    }
}

fn default_user_agent() -> String {
    "masto-cli/0.1 (+https://github.com/masto-cli/masto-cli)".to_string()
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    cfg = merge_config(cfg, load_env(prefix)?);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.mastodon.instance.is_empty() {
        base.mastodon.instance = other.mastodon.instance;
    }
    if !other.mastodon.access_token.is_empty() {
        base.mastodon.access_token = other.mastodon.access_token;
    }
    if !other.mastodon.user_agent.is_empty() {
        base.mastodon.user_agent = other.mastodon.user_agent;
    }
    if other.mastodon.page_size != 0 {
        base.mastodon.page_size = other.mastodon.page_size;
    }
    base
}

fn load_env(prefix: &str) -> Result<Config> {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    if map.is_empty() {
        return Ok(Config::default());
    }

    let mut cfg = Config::default();

    for (key, value) in map {
        apply_env_value(&mut cfg, &key, value);
    }

    Ok(cfg)
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "mastodon.instance" | "instance" => cfg.mastodon.instance = value,
        "mastodon.access_token" | "access_token" => cfg.mastodon.access_token = value,
        "mastodon.user_agent" | "user_agent" => cfg.mastodon.user_agent = value,
        "mastodon.page_size" | "page_size" => {
            if let Ok(parsed) = value.parse::<u32>() {
                cfg.mastodon.page_size = parsed;
            }
        }
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("masto-cli").join("config.yaml"))
}
