//! Configuration for a stresstest run.
//!
//! There are two layers of configuration:
//!
//! - [`RunConfig`] describes *what* to run: the database to connect to and the number of workers.
//!   It is built from the command line arguments, see [`crate::cli`].
//! - [`Config`] describes *how* the process runs: logging and the async runtime. It is loaded
//!   from defaults, overridden by environment variables prefixed with `SQLSTRESS__`. Double
//!   underscores (`__`) denote nested structures, for example:
//!
//!   - `SQLSTRESS__LOGGING__LEVEL=debug`
//!   - `SQLSTRESS__LOGGING__FORMAT=json`
//!   - `SQLSTRESS__RUNTIME__WORKER_THREADS=4`

use std::fmt;
use std::thread::available_parallelism;

use figment::providers::{Env, Serialized};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::{Error, Result};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "SQLSTRESS__";

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Parameters for connecting to the target database.
#[derive(Debug)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Redacted in `Debug` output.
    pub password: SecretString,
}

/// Everything a single stresstest run needs, immutable once the run started.
#[derive(Debug)]
pub struct RunConfig {
    pub connection: ConnectionParams,
    /// The number of workers to launch. Always positive.
    pub workers: usize,
    /// Seed for the sequence selection. A random seed is used if absent.
    pub seed: Option<u64>,
}

/// Log output format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Chooses [`LogFormat::Pretty`] for a TTY, otherwise [`LogFormat::Simplified`].
    Auto,
    /// Pretty printing with colors.
    Pretty,
    /// Simplified plain text output.
    Simplified,
    /// JSON lines.
    Json,
}

/// The logging format parse error.
#[derive(Clone, Debug)]
pub struct FormatParseError(String);

impl fmt::Display for FormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"error parsing "{}" as format: expected one of "auto", "pretty", "simplified", "json""#,
            self.0
        )
    }
}

impl std::error::Error for FormatParseError {}

impl std::str::FromStr for LogFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let result = match s {
            "" => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("auto") => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            s if s.eq_ignore_ascii_case("simplified") => LogFormat::Simplified,
            s if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            s => return Err(FormatParseError(s.into())),
        };

        Ok(result)
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration. Logs are always written to stderr.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// `RUST_LOG` takes precedence if it is set.
    ///
    /// # Default
    ///
    /// `INFO`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Default
    ///
    /// `Auto`
    #[serde(with = "display_fromstr")]
    pub format: LogFormat,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::Auto => "auto",
            LogFormat::Pretty => "pretty",
            LogFormat::Simplified => "simplified",
            LogFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Configuration of the async runtime driving the workers.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Runtime {
    /// Number of runtime threads workers are scheduled on. Must be positive.
    ///
    /// # Default
    ///
    /// The number of available CPU cores.
    pub worker_threads: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            worker_threads: available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Process-level configuration, see the [module docs](self).
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Log verbosity and format.
    pub logging: Logging,
    /// Async runtime settings.
    pub runtime: Runtime,
}

impl Config {
    /// Loads the configuration from defaults and `SQLSTRESS__` environment variables.
    pub fn load() -> Result<Self> {
        let config: Self = figment::Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        if config.runtime.worker_threads == 0 {
            return Err(Error::Config(
                "runtime.worker_threads must be positive".to_owned(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load().unwrap();
            assert_eq!(config.logging.level, LevelFilter::INFO);
            assert_eq!(config.logging.format, LogFormat::Auto);
            assert!(config.runtime.worker_threads > 0);
            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SQLSTRESS__LOGGING__LEVEL", "debug");
            jail.set_env("SQLSTRESS__LOGGING__FORMAT", "JSON");
            jail.set_env("SQLSTRESS__RUNTIME__WORKER_THREADS", "3");

            let config = Config::load().unwrap();
            assert_eq!(config.logging.level, LevelFilter::DEBUG);
            assert_eq!(config.logging.format, LogFormat::Json);
            assert_eq!(config.runtime.worker_threads, 3);
            Ok(())
        });
    }

    #[test]
    fn rejects_invalid_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SQLSTRESS__LOGGING__FORMAT", "xml");
            let err = Config::load().unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{err:?}");
            Ok(())
        });

        figment::Jail::expect_with(|jail| {
            jail.set_env("SQLSTRESS__RUNTIME__WORKER_THREADS", "0");
            let err = Config::load().unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{err:?}");
            Ok(())
        });
    }

    #[test]
    fn password_is_redacted() {
        let params = ConnectionParams {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            database: "db".into(),
            user: "user".into(),
            password: SecretString::from("hunter2".to_owned()),
        };

        let debug = format!("{params:?}");
        assert!(!debug.contains("hunter2"), "{debug}");
    }
}
