use crate::{muted_error, weak_error};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, read from a toml file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Debugger executable, `gdb` from `PATH` if not set.
    pub gdb_path: Option<PathBuf>,
    /// Arguments that switch the debugger into machine interface mode.
    pub gdb_args: Vec<String>,
    /// Maximum time to wait for a command result, wait forever if not set.
    pub command_timeout_ms: Option<u64>,
    /// First reference number given to a variable object with children.
    pub reference_base: u32,
    /// Log every raw protocol line.
    pub trace_protocol: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gdb_path: None,
            gdb_args: vec!["--interpreter=mi2".to_string(), "-q".to_string()],
            command_timeout_ms: None,
            reference_base: 1000,
            trace_protocol: false,
        }
    }
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/mib/config.toml";

    /// Load config from file. Return [`None`] on errors.
    pub fn from_file(path: Option<&str>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => weak_error!(read_to_string(path), "read config file:")?,
        };
        weak_error!(Self::from_toml(&data), "parse config file:")
    }

    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    /// Load config from file or fall back to defaults.
    pub fn load(path: Option<&str>) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    /// Debugger executable to spawn.
    pub fn gdb_executable(&self) -> Result<PathBuf, which::Error> {
        match &self.gdb_path {
            Some(path) => Ok(path.clone()),
            None => which::which("gdb"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            r#"
            command_timeout_ms = 2500
            trace_protocol = true
            "#,
        )
        .unwrap();

        assert_eq!(config.command_timeout(), Some(Duration::from_millis(2500)));
        assert!(config.trace_protocol);
        assert_eq!(config.reference_base, 1000);
        assert_eq!(config.gdb_args, vec!["--interpreter=mi2", "-q"]);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            gdb_path = "/opt/arm/bin/arm-none-eabi-gdb"
            gdb_args = ["--interpreter=mi3"]
            reference_base = 1
            "#,
        )
        .unwrap();

        assert_eq!(
            config.gdb_executable().unwrap(),
            PathBuf::from("/opt/arm/bin/arm-none-eabi-gdb")
        );
        assert_eq!(config.gdb_args, vec!["--interpreter=mi3"]);
        assert_eq!(config.reference_base, 1);
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_toml("reference_base = \"many\"").is_err());
        assert!(Config::from_file(Some("/definitely/not/here.toml")).is_none());
    }
}
