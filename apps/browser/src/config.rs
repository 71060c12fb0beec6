use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::{FetchMode, DEFAULT_COLLECTION_URL};

pub const DEFAULT_CONFIG_FILE: &str = "browser.toml";

/// Environment variables and the setting each one overrides. Later entries
/// win when several are set.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("BROWSER_API_URL", "api_url"),
    ("APP__API_URL", "api_url"),
    ("APP__FETCH_MODE", "fetch_mode"),
    ("APP__PAGE_SIZE", "page_size"),
    ("APP__REQUEST_TIMEOUT_SECS", "request_timeout_secs"),
    ("APP__FETCH_TIMEOUT_SECS", "fetch_timeout_secs"),
    ("APP__LOG_FILTER", "log_filter"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub fetch_mode: FetchMode,
    /// Cards per page when paging through an eagerly fetched collection.
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub fetch_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_COLLECTION_URL.into(),
            fetch_mode: FetchMode::Eager,
            page_size: 20,
            request_timeout_secs: 10,
            fetch_timeout_secs: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Defaults, then the config file, then the environment. An explicitly named
/// file must exist; the default `browser.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match config_path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        let source = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", source.display()))?;
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let table: HashMap<String, toml::Value> = toml::from_str(raw)?;
    for (key, value) in table {
        let value = match value {
            toml::Value::String(text) => text,
            other => other.to_string(),
        };
        apply_value(settings, &key, &value);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for (name, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(name) {
            apply_value(settings, key, &value);
        }
    }
}

/// Unparseable values leave the current setting in place.
fn apply_value(settings: &mut Settings, key: &str, value: &str) {
    let value = value.trim();
    match key {
        "api_url" if !value.is_empty() => settings.api_url = value.to_string(),
        "fetch_mode" => {
            if let Ok(mode) = value.parse() {
                settings.fetch_mode = mode;
            }
        }
        "page_size" => {
            if let Some(size) = value.parse::<usize>().ok().filter(|size| *size > 0) {
                settings.page_size = size;
            }
        }
        "request_timeout_secs" => {
            if let Ok(secs) = value.parse() {
                settings.request_timeout_secs = secs;
            }
        }
        "fetch_timeout_secs" => {
            if let Ok(secs) = value.parse() {
                settings.fetch_timeout_secs = Some(secs);
            }
        }
        "log_filter" if !value.is_empty() => settings.log_filter = value.to_string(),
        _ => {}
    }
}
