//! Configuration types for carpark
//!
//! Defines:
//! - `Config` - The whole `carpark.toml` file
//! - One settings struct per `[section]`
//! - `CommandEntry` - A single `[commands]` mapping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Sensor ids reported by default, in selection order
pub const DEFAULT_SENSOR_IDS: [&str; 3] = [
    "550e8400-e29b-41d4-a716-446655440001",
    "550e8400-e29b-41d4-a716-446655440002",
    "550e8400-e29b-41d4-a716-446655440003",
];

/// Application configuration (carpark.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub runner: RunnerSettings,

    /// Command name to script or program
    #[serde(default = "default_commands")]
    pub commands: BTreeMap<String, CommandEntry>,

    #[serde(default)]
    pub sensors: SensorSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            runner: RunnerSettings::default(),
            commands: default_commands(),
            sensors: SensorSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_commands() -> BTreeMap<String, CommandEntry> {
    BTreeMap::from([
        (
            "start".to_string(),
            CommandEntry::Script(PathBuf::from("part1.py")),
        ),
        (
            "read".to_string(),
            CommandEntry::Script(PathBuf::from("part2.py")),
        ),
    ])
}

/// What a command name maps to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandEntry {
    /// A script path, run through `runner.interpreter`
    Script(PathBuf),
    /// An explicit program with arguments
    Program {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// gRPC server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Size of the worker pool serving RPCs
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Messages buffered per log stream between the hub and the transport
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,

    /// Maximum concurrent requests per client connection
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            worker_threads: default_worker_threads(),
            stream_buffer: default_stream_buffer(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 50051))
}

fn default_worker_threads() -> usize {
    10
}

fn default_stream_buffer() -> usize {
    64
}

fn default_concurrency_limit() -> usize {
    32
}

/// How scripts are launched
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerSettings {
    /// Command line prefix for script entries
    #[serde(default = "default_interpreter")]
    pub interpreter: Vec<String>,

    /// Directory scripts run in (defaults to the server's cwd)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            working_dir: None,
        }
    }
}

fn default_interpreter() -> Vec<String> {
    vec!["python3".to_string(), "-u".to_string()]
}

/// Sensor id selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorSettings {
    #[serde(default = "default_sensor_ids")]
    pub ids: Vec<String>,

    #[serde(default)]
    pub policy: SensorPolicyKind,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            ids: default_sensor_ids(),
            policy: SensorPolicyKind::default(),
        }
    }
}

fn default_sensor_ids() -> Vec<String> {
    DEFAULT_SENSOR_IDS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorPolicyKind {
    #[default]
    First,
    RoundRobin,
}

/// Logging settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Default filter directive when `CARPARK_LOG` is unset
    #[serde(default)]
    pub filter: Option<String>,

    /// Also write a daily-rotated log file
    #[serde(default)]
    pub to_file: bool,

    /// Log file directory (defaults to the platform data dir)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}
