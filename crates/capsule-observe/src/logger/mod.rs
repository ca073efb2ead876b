mod config;
mod error;
mod format;
mod log;

pub use config::{FORMAT_ENV, LEVEL_ENV, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global subscriber described by `cfg`. Fails if one is already set.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => log::Logger::text(cfg),
        LoggerFormat::Json => log::Logger::json(cfg),
        LoggerFormat::Journald => log::Logger::journald(cfg),
    }
}

/// [`LoggerConfig::from_env`] followed by [`logger_init`].
pub fn logger_init_from_env() -> Result<(), LoggerError> {
    logger_init(&LoggerConfig::from_env()?)
}
