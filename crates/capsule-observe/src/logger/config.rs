use std::io::IsTerminal;

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Filter directive, e.g. `info` or `capsule.exec=debug,warn`.
pub const LEVEL_ENV: &str = "CAPSULE_LOG";
/// One of `text`, `json`, `journald`.
pub const FORMAT_ENV: &str = "CAPSULE_LOG_FORMAT";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or blank values keep the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(level) = get(LEVEL_ENV) {
            cfg.level = level.trim().to_string();
        }
        if let Some(format) = get(FORMAT_ENV) {
            cfg.format = format.parse()?;
        }
        if cfg.format != LoggerFormat::Text {
            cfg.use_color = false;
        }
        Ok(cfg)
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn format(mut self, format: LoggerFormat) -> Self {
        self.format = format;
        self
    }
}
