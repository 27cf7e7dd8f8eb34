pub mod config;

pub use config::{
    AppConfig, ButtonConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig,
    ServerConfig, SlackConfig,
};
