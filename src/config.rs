use crate::embed::{MAX_AMOUNT, MAX_REFRESH_SECS};
use crate::github::client::DEFAULT_API_BASE;
use crate::ui::theme::Theme;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Refresh intervals offered by the dashboard, in seconds.
pub const REFRESH_CHOICES: &[u64] = &[10, 30, 60, 300];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    /// Public origin the embeddable views are served from.
    pub embed_base_url: String,
    pub refresh_secs: u64,
    pub auto_refresh: bool,
    pub page_size: usize,
    pub theme: Theme,
    pub storage_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            embed_base_url: "http://localhost:3000".to_string(),
            refresh_secs: 30,
            auto_refresh: true,
            page_size: 10,
            theme: Theme::Light,
            storage_path: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(config_dir().join("repolens").join("config.toml"))
    }

    pub fn load_from(config_file: PathBuf) -> Self {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if config_file.exists() {
            figment = figment.merge(Toml::file(&config_file));
        }

        figment = figment.merge(Env::prefixed("REPOLENS_"));

        match figment.extract::<Config>() {
            Ok(config) => config.sanitized(),
            Err(e) => {
                eprintln!("warning: config parse error, using defaults: {e}");
                Config::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        if self.page_size == 0 {
            self.page_size = Config::default().page_size;
        }
        self.page_size = self.page_size.min(MAX_AMOUNT);
        self.refresh_secs = self.refresh_secs.min(MAX_REFRESH_SECS);
        if self.refresh_secs == 0 {
            self.auto_refresh = false;
            self.refresh_secs = Config::default().refresh_secs;
        }
        self
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| config_dir().join("repolens").join("storage.toml"))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| config_dir().join("repolens").join("repolens.log"))
    }

    /// Interval the dashboard pollers run with; 0 disables the timer.
    pub fn effective_refresh(&self) -> u64 {
        if self.auto_refresh {
            self.refresh_secs
        } else {
            0
        }
    }
}

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}
