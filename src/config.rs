use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const DEFAULT_USER_ID: &str = "me";
pub const DEFAULT_MAX_RESULTS: u32 = 50;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base: Option<String>,
    pub user_id: Option<String>,
    pub max_results: Option<u32>,
    pub tokens_path: Option<String>,
}

pub(crate) fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("mailview"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn default_tokens_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("tokens.json");
    Ok(p)
}

/// Loads the config, writing a template with the defaults on first run.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config {
            api_base: Some(DEFAULT_API_BASE.to_string()),
            user_id: Some(DEFAULT_USER_ID.to_string()),
            max_results: Some(DEFAULT_MAX_RESULTS),
            tokens_path: None,
        };
        fs::write(path, toml::to_string_pretty(&sample)?)
            .with_context(|| format!("writing template config to {}", path.display()))?;
        info!("created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn resolve_api_base(cfg: &Config) -> Result<Url> {
    let raw = cfg.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
    Url::parse(raw).with_context(|| format!("invalid api_base '{raw}'"))
}

pub fn resolve_user_id(cfg: &Config) -> String {
    cfg.user_id
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}

/// Listing page size; zero is treated as unset.
pub fn resolve_max_results(cfg: &Config) -> u32 {
    cfg.max_results
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_RESULTS)
}

pub fn resolve_tokens_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.tokens_path {
        Ok(PathBuf::from(p))
    } else {
        default_tokens_path()
    }
}
