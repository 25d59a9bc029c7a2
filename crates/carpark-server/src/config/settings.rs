//! Loader for carpark.toml

use std::path::{Path, PathBuf};

use super::types::{CommandEntry, Config};
use carpark_core::prelude::*;
use carpark_runner::{LaunchSpec, ScriptResolver};

pub const CONFIG_FILENAME: &str = "carpark.toml";
/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CARPARK_CONFIG";

// ─────────────────────────────────────────────────────────────────────────────
// Locating & Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Find the config file to use.
///
/// Lookup order:
/// 1. `explicit` (the `--config` flag)
/// 2. `$CARPARK_CONFIG`
/// 3. `./carpark.toml`
/// 4. `<config_dir>/carpark/config.toml`
///
/// The first two are returned even when the file does not exist, so that the
/// caller reports a missing file instead of silently using defaults.
pub fn locate_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("carpark").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load and validate the configuration.
///
/// Falls back to defaults when no config file is found.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match locate_config(explicit) {
        Some(path) => load_config_from(&path),
        None => {
            debug!("No config file found, using defaults");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Load and validate the configuration at `path`
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::config_invalid(format!("{}: {}", path.display(), e)))?;

    validate(&config)?;
    info!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Reject configurations the server cannot run with
pub fn validate(config: &Config) -> Result<()> {
    if config.server.worker_threads == 0 {
        return Err(Error::config_invalid("server.worker_threads must be >= 1"));
    }
    if config.server.stream_buffer == 0 {
        return Err(Error::config_invalid("server.stream_buffer must be >= 1"));
    }
    if config.server.concurrency_limit == 0 {
        return Err(Error::config_invalid(
            "server.concurrency_limit must be >= 1",
        ));
    }
    if config.sensors.ids.is_empty() {
        return Err(Error::config_invalid("sensors.ids must not be empty"));
    }

    let has_scripts = config
        .commands
        .values()
        .any(|entry| matches!(entry, CommandEntry::Script(_)));
    if has_scripts && config.runner.interpreter.is_empty() {
        return Err(Error::config_invalid(
            "runner.interpreter must not be empty when commands use scripts",
        ));
    }

    for (name, entry) in &config.commands {
        if let CommandEntry::Program { program, .. } = entry {
            if program.is_empty() {
                return Err(Error::config_invalid(format!(
                    "commands.{}.program must not be empty",
                    name
                )));
            }
        }
    }

    Ok(())
}

/// Build the command table from `[commands]` and `[runner]`
pub fn build_resolver(config: &Config) -> Result<ScriptResolver> {
    let mut resolver = ScriptResolver::new();

    for (name, entry) in &config.commands {
        let spec = match entry {
            CommandEntry::Script(script) => {
                LaunchSpec::script(&config.runner.interpreter, script).ok_or_else(|| {
                    Error::config_invalid("runner.interpreter must not be empty")
                })?
            }
            CommandEntry::Program { program, args } => {
                LaunchSpec::new(program.clone(), args.clone())
            }
        };
        let spec = match &config.runner.working_dir {
            Some(dir) => spec.with_working_dir(dir),
            None => spec,
        };
        debug!("Command {:?} -> {}", name, spec.display());
        resolver.insert(name.clone(), spec);
    }

    Ok(resolver)
}

// ─────────────────────────────────────────────────────────────────────────────
// Writing
// ─────────────────────────────────────────────────────────────────────────────

/// Write a commented default config file to `path`.
///
/// Refuses to overwrite an existing file.
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::config(format!(
            "{} already exists, not overwriting",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::config(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    std::fs::write(path, generate_default_config())
        .map_err(|e| Error::config(format!("Failed to write {}: {}", path.display(), e)))?;

    info!("Wrote default configuration to {:?}", path);
    Ok(())
}

fn generate_default_config() -> String {
    r#"# carpark configuration

[server]
listen = "0.0.0.0:50051"
worker_threads = 10     # RPC worker pool size
stream_buffer = 64      # messages buffered per log stream
concurrency_limit = 32  # concurrent requests per connection

[runner]
# Script entries are run as: <interpreter...> <script>
interpreter = ["python3", "-u"]
# working_dir = "/opt/carpark/scripts"

[commands]
start = "part1.py"
read = "part2.py"
# Programs can be given explicitly:
# status = { program = "/usr/local/bin/park-status", args = ["--json"] }

[sensors]
ids = [
    "550e8400-e29b-41d4-a716-446655440001",
    "550e8400-e29b-41d4-a716-446655440002",
    "550e8400-e29b-41d4-a716-446655440003",
]
policy = "first"        # "first" or "round_robin"

[logging]
# filter = "carpark=debug,info"   # used when CARPARK_LOG is unset
to_file = false
# directory = "/var/log/carpark"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{SensorPolicyKind, DEFAULT_SENSOR_IDS};
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        validate(&config).unwrap();

        assert_eq!(config.server.listen.port(), 50051);
        assert_eq!(config.server.worker_threads, 10);
        assert_eq!(config.sensors.ids[0], DEFAULT_SENSOR_IDS[0]);
        assert_eq!(config.sensors.policy, SensorPolicyKind::First);
        assert!(config.commands.contains_key("start"));
        assert!(config.commands.contains_key("read"));
    }

    #[test]
    fn test_generated_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        validate(&config).unwrap();
        assert_eq!(
            config.commands.get("start"),
            Some(&CommandEntry::Script(PathBuf::from("part1.py")))
        );
    }

    #[test]
    fn test_load_custom_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[server]
listen = "127.0.0.1:6000"
worker_threads = 2

[commands]
start = "run.py"
status = { program = "echo", args = ["ok"] }

[sensors]
ids = ["s1", "s2"]
policy = "round_robin"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.server.listen.port(), 6000);
        assert_eq!(config.server.worker_threads, 2);
        assert_eq!(config.server.stream_buffer, 64);
        assert_eq!(config.commands.len(), 2);
        assert_eq!(
            config.commands.get("status"),
            Some(&CommandEntry::Program {
                program: "echo".to_string(),
                args: vec!["ok".to_string()],
            })
        );
        assert_eq!(config.sensors.policy, SensorPolicyKind::RoundRobin);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = tempdir().unwrap();
        let err = load_config(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "not valid toml {{{{").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.server.worker_threads = 0;
        assert!(matches!(
            validate(&config),
            Err(Error::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_scripts_need_interpreter() {
        let mut config = Config::default();
        config.runner.interpreter.clear();
        assert!(validate(&config).is_err());

        config.commands.clear();
        config.commands.insert(
            "status".to_string(),
            CommandEntry::Program {
                program: "true".to_string(),
                args: vec![],
            },
        );
        validate(&config).unwrap();
    }

    #[test]
    fn test_build_resolver_from_config() {
        let mut config = Config::default();
        config.runner.working_dir = Some(PathBuf::from("/opt/scripts"));
        config.commands.insert(
            "status".to_string(),
            CommandEntry::Program {
                program: "echo".to_string(),
                args: vec!["ok".to_string()],
            },
        );

        let resolver = build_resolver(&config).unwrap();

        let start = resolver.resolve("start").unwrap();
        assert_eq!(start.program, "python3");
        assert_eq!(start.args, vec!["-u", "part1.py"]);
        assert_eq!(start.working_dir, Some(PathBuf::from("/opt/scripts")));

        let status = resolver.resolve("status").unwrap();
        assert_eq!(status.display(), "echo ok");

        assert!(matches!(
            resolver.resolve("bogus"),
            Err(Error::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILENAME);

        write_default_config(&path).unwrap();
        assert!(path.exists());
        load_config_from(&path).unwrap();

        assert!(write_default_config(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_env_var_selects_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("from-env.toml");
        std::fs::write(&path, "[server]\nworker_threads = 3\n").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, &path);
        let located = locate_config(None);
        let config = load_config(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(located, Some(path));
        assert_eq!(config.unwrap().server.worker_threads, 3);
    }

    #[test]
    #[serial]
    fn test_explicit_path_wins_over_env_var() {
        std::env::set_var(CONFIG_ENV_VAR, "/nonexistent/env.toml");
        let located = locate_config(Some(Path::new("/explicit.toml")));
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(located, Some(PathBuf::from("/explicit.toml")));
    }
}
