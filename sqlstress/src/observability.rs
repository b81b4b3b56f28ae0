use std::env;
use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, Registry, prelude::*};

use crate::config::{Config, LogFormat};

/// Installs the global tracing subscriber, logging to stderr.
pub fn init_tracing(config: &Config) {
    let (level, env_filter) = parse_rust_log(config.logging.level);

    let format = match config.logging.format {
        LogFormat::Auto if std::io::stderr().is_terminal() => pretty_layer(),
        LogFormat::Pretty => pretty_layer(),
        LogFormat::Auto | LogFormat::Simplified => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .flatten_event(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(format.with_filter(level))
        .with(env_filter)
        .init();
}

fn pretty_layer() -> Box<dyn Layer<Registry> + Send + Sync> {
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .pretty()
        .boxed()
}

/// Resolves the effective log level and filter from `RUST_LOG`.
///
/// A plain level in `RUST_LOG` replaces `default_level`. Anything else is used literally as the
/// filter directive.
fn parse_rust_log(default_level: LevelFilter) -> (LevelFilter, EnvFilter) {
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        Err(_) => default_level,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        sqlstress=TRACE,\
        sqlx=WARN,\
        ",
    );

    (level, env_filter)
}
