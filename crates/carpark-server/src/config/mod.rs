//! Configuration loading and types

pub mod settings;
pub mod types;

pub use settings::{
    build_resolver, load_config, load_config_from, locate_config, validate, write_default_config,
    CONFIG_ENV_VAR, CONFIG_FILENAME,
};
pub use types::{
    CommandEntry, Config, LoggingSettings, RunnerSettings, SensorPolicyKind, SensorSettings,
    ServerSettings, DEFAULT_SENSOR_IDS,
};
