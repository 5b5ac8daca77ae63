//! Server configuration: a line-oriented `key = value` file.
//!
//! Recognized keys: `logdirectory` (default `logfiles`), `usernamefile`
//! (required), `port_mode` / `pasv_mode` (`YES`/`NO`, at least one `YES`),
//! `numlogfiles` (positive int, enables log rotation). `#` starts a
//! comment, unknown keys are ignored, a repeated key keeps its last value.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("bad config line {line}: expected `key = value`")]
    BadLine { line: usize },

    #[error("config key \"usernamefile\" not found")]
    MissingUsernameFile,

    #[error("at least one of port_mode / pasv_mode must be YES")]
    NoTransferMode,

    #[error("numlogfiles must be a positive integer, got {0:?}")]
    BadNumLogFiles(String),

    #[error("log directory {0:?} does not exist")]
    MissingLogDirectory(PathBuf),

    #[error("log directory {0:?} is not writable")]
    UnwritableLogDirectory(PathBuf),

    #[error("username file {0:?} does not exist")]
    MissingAccountsFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_directory: PathBuf,
    pub username_file: PathBuf,
    pub port_mode: bool,
    pub pasv_mode: bool,
    pub num_log_files: Option<usize>,
}

impl Config {
    /// Loads and validates the configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&text)?;
        config.validate_paths()?;
        Ok(config)
    }

    /// Parses the `key = value` body without touching the filesystem.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut log_directory: Option<String> = None;
        let mut username_file: Option<String> = None;
        let mut port_mode = false;
        let mut pasv_mode = false;
        let mut num_log_files: Option<usize> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or(ConfigError::BadLine { line: idx + 1 })?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            match key.as_str() {
                "logdirectory" => log_directory = Some(value.to_string()),
                "usernamefile" => username_file = Some(value.to_string()),
                "port_mode" => port_mode = value.eq_ignore_ascii_case("yes"),
                "pasv_mode" => pasv_mode = value.eq_ignore_ascii_case("yes"),
                "numlogfiles" => match value.parse::<usize>() {
                    Ok(n) if n >= 1 => num_log_files = Some(n),
                    _ => return Err(ConfigError::BadNumLogFiles(value.to_string())),
                },
                _ => {} // unknown keys are ignored
            }
        }

        let username_file = username_file.ok_or(ConfigError::MissingUsernameFile)?;
        if !port_mode && !pasv_mode {
            return Err(ConfigError::NoTransferMode);
        }

        Ok(Config {
            log_directory: PathBuf::from(log_directory.unwrap_or_else(|| "logfiles".to_string())),
            username_file: PathBuf::from(username_file),
            port_mode,
            pasv_mode,
            num_log_files,
        })
    }

    /// Startup checks: the log directory must exist and be writable, the
    /// account file must exist. Runs before any socket is opened.
    fn validate_paths(&self) -> Result<(), ConfigError> {
        if !self.log_directory.is_dir() {
            return Err(ConfigError::MissingLogDirectory(self.log_directory.clone()));
        }
        // Probe with a throwaway file; metadata permission bits are not
        // enough to know whether we can actually create files here.
        let probe = self.log_directory.join(".ftpserverd-probe");
        match fs::write(&probe, b"") {
            Ok(()) => {
                let _ = fs::remove_file(&probe);
            }
            Err(_) => {
                return Err(ConfigError::UnwritableLogDirectory(
                    self.log_directory.clone(),
                ));
            }
        }
        if !self.username_file.is_file() {
            return Err(ConfigError::MissingAccountsFile(self.username_file.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            "# ftpserverd configuration\n\
             logdirectory = logs\n\
             usernamefile = users.db\n\
             port_mode = YES\n\
             pasv_mode = no\n\
             numlogfiles = 5\n",
        )
        .unwrap();
        assert_eq!(config.log_directory, PathBuf::from("logs"));
        assert_eq!(config.username_file, PathBuf::from("users.db"));
        assert!(config.port_mode);
        assert!(!config.pasv_mode);
        assert_eq!(config.num_log_files, Some(5));
    }

    #[test]
    fn log_directory_defaults_to_logfiles() {
        let config = Config::parse("usernamefile = users.db\npasv_mode = YES\n").unwrap();
        assert_eq!(config.log_directory, PathBuf::from("logfiles"));
        assert_eq!(config.num_log_files, None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config =
            Config::parse("usernamefile = u\npasv_mode = YES\nbanner = hello world\n").unwrap();
        assert!(config.pasv_mode);
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let config =
            Config::parse("usernamefile = first\nusernamefile = second\npasv_mode = YES\n")
                .unwrap();
        assert_eq!(config.username_file, PathBuf::from("second"));
    }

    #[test]
    fn missing_usernamefile_is_an_error() {
        assert!(matches!(
            Config::parse("pasv_mode = YES\n"),
            Err(ConfigError::MissingUsernameFile)
        ));
    }

    #[test]
    fn both_modes_disabled_is_an_error() {
        assert!(matches!(
            Config::parse("usernamefile = u\nport_mode = NO\npasv_mode = NO\n"),
            Err(ConfigError::NoTransferMode)
        ));
    }

    #[test]
    fn modes_default_to_disabled() {
        assert!(matches!(
            Config::parse("usernamefile = u\n"),
            Err(ConfigError::NoTransferMode)
        ));
    }

    #[test]
    fn bad_numlogfiles_is_an_error() {
        assert!(matches!(
            Config::parse("usernamefile = u\npasv_mode = YES\nnumlogfiles = 0\n"),
            Err(ConfigError::BadNumLogFiles(_))
        ));
        assert!(matches!(
            Config::parse("usernamefile = u\npasv_mode = YES\nnumlogfiles = many\n"),
            Err(ConfigError::BadNumLogFiles(_))
        ));
    }

    #[test]
    fn line_without_equals_is_an_error() {
        assert!(matches!(
            Config::parse("usernamefile = u\njust some words\n"),
            Err(ConfigError::BadLine { line: 2 })
        ));
    }

    #[test]
    fn mode_values_are_case_insensitive() {
        let config = Config::parse("usernamefile = u\npasv_mode = yes\n").unwrap();
        assert!(config.pasv_mode);
    }

    #[test]
    fn load_validates_paths() {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join("users.db");
        std::fs::write(&users, "alice secret\n").unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir(&logs).unwrap();
        let conf = dir.path().join("ftpserverd.conf");
        std::fs::write(
            &conf,
            format!(
                "logdirectory = {}\nusernamefile = {}\npasv_mode = YES\n",
                logs.display(),
                users.display()
            ),
        )
        .unwrap();
        assert!(Config::load(&conf).is_ok());

        std::fs::remove_dir(&logs).unwrap();
        assert!(matches!(
            Config::load(&conf),
            Err(ConfigError::MissingLogDirectory(_))
        ));
    }
}
