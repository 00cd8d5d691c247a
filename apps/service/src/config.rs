use std::{env, fmt, fs, io, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[source] io::Error),
    #[error("Failed to write config file: {0}")]
    WriteFailed(#[source] io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("No config directory available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub scheduler: Scheduler,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub path: String,
    pub pool_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub interval_seconds: u64,
    pub timeout_ms: u64,
    pub concurrency: usize,
    pub run_on_startup: bool,
}

impl Default for Database {
    fn default() -> Self {
        Self { path: "pulsewatch.db".into(), pool_size: 8 }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            interval_seconds: pulsewatch::DEFAULT_SWEEP_INTERVAL_SECS,
            timeout_ms: pulsewatch::DEFAULT_PROBE_TIMEOUT_MS,
            concurrency: pulsewatch::DEFAULT_SWEEP_CONCURRENCY,
            run_on_startup: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { database: Database::default(), scheduler: Scheduler::default() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/pulsewatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("pulsewatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path)?;
        write_1(f, "Pool Size", &self.database.pool_size)?;
        write_title_1(f, "Scheduler")?;
        write_1(f, "Interval (s)", &self.scheduler.interval_seconds)?;
        write_1(f, "Probe Timeout (ms)", &self.scheduler.timeout_ms)?;
        write_1(f, "Concurrency", &self.scheduler.concurrency)?;
        write_1(f, "Run On Startup", &self.scheduler.run_on_startup)?;

        Ok(())
    }
}

impl Config {
    /// Load the config from file
    ///
    /// Writes a default config to $XDG_CONFIG_HOME/pulsewatch/config.toml,
    /// or to the given path, when none exists yet. Missing keys fall back
    /// to their defaults.
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(Error::ReadFailed)?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::WriteFailed)?;
        }

        fs::write(path, config_str).map_err(Error::WriteFailed)
    }
}
