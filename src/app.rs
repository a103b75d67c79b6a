use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::{ApiClient, ApiError};
use crate::utils::normalize_url;

/// Overrides the stored endpoint when set.
pub const ENDPOINT_ENV: &str = "NEXILE_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub endpoint: String,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("nexile-admin.toml"))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Settings = toml::from_str(text)?;
        settings.endpoint = normalize_url(&settings.endpoint);
        Ok(settings)
    }

    /// Stored settings, then the environment override. Unreadable files count as empty.
    pub fn load() -> Self {
        let stored = Self::toml_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|text| match Self::from_toml(&text) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("Ignoring malformed settings file: {e}");
                    None
                }
            })
            .unwrap_or_default();
        stored.with_env_override(std::env::var(ENDPOINT_ENV).ok())
    }

    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        if let Some(endpoint) = value.map(|v| normalize_url(&v)).filter(|v| !v.is_empty()) {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn save(&self) -> std::io::Result<()> {
        if let Some(path) = Self::toml_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let toml = toml::to_string_pretty(self)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            fs::write(path, toml)
        } else {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "No config dir"))
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }

    pub fn client(&self) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.endpoint)
    }
}

#[cfg(feature = "gui")]
pub fn build_ui(app: &adw::Application) {
    let settings = Settings::load();
    if settings.is_configured() {
        log::info!("Using endpoint {}", settings.endpoint);
        crate::ui::main_window::show_main_window(app, settings);
    } else {
        crate::ui::setup::show_setup_window(app);
    }
}
