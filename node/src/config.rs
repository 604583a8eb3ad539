//! Configuration of the evidence subsystem, loaded from a TOML file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    components::{evidence_gossiper, storage},
    logging::LoggingConfig,
};

/// An error loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {}: {error}", path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        error: io::Error,
    },
    /// The file is not a valid configuration.
    #[error("could not parse config file {}: {error}", path.display())]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        error: toml::de::Error,
    },
}

/// Root configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Evidence store configuration.
    pub storage: storage::Config,
    /// Evidence broadcast configuration.
    #[serde(default)]
    pub gossip: evidence_gossiper::Config,
}

impl Config {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        let config = toml::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use evidence_types::TimeDiff;

    use crate::logging::LoggingFormat;

    use super::*;

    #[test]
    fn should_load_config_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [logging]
            format = 'json'
            abbreviate_modules = false

            [storage]
            path = '/var/lib/evidence'
            max_evidence_store_size = 104857600

            [gossip]
            broadcast_interval = '5sec'
            retry_interval = '50ms'
            max_retry_interval = '2sec'
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.logging.format, LoggingFormat::Json);
        assert_eq!(config.storage.path, PathBuf::from("/var/lib/evidence"));
        assert_eq!(config.storage.max_evidence_store_size, 100 * 1024 * 1024);
        assert_eq!(
            config.gossip,
            evidence_gossiper::Config::new_for_tests(
                TimeDiff::from_seconds(5),
                TimeDiff::from_millis(50),
                TimeDiff::from_seconds(2),
            )
        );
    }

    #[test]
    fn should_default_optional_sections() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("config.toml");
        fs::write(
            &path,
            "[storage]\npath = 'evidence'\nmax_evidence_store_size = 1073741824\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.gossip, evidence_gossiper::Config::default());
    }

    #[test]
    fn should_report_bad_config_files() {
        let tempdir = tempfile::tempdir().unwrap();

        let missing = tempdir.path().join("missing.toml");
        assert!(matches!(
            Config::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let unknown_section = tempdir.path().join("unknown.toml");
        fs::write(
            &unknown_section,
            "[storage]\npath = 'evidence'\nmax_evidence_store_size = 1\n[consensus]\n",
        )
        .unwrap();
        assert!(matches!(
            Config::from_file(&unknown_section),
            Err(ConfigError::Parse { .. })
        ));
    }
}
