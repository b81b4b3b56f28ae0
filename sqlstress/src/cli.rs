use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use secrecy::SecretString;

use crate::catalog::Catalog;
use crate::config::{Config, ConnectionParams, DEFAULT_PORT, RunConfig};
use crate::database::PostgresConnector;
use crate::{coordinator, observability};

/// Runs weighted sequences of SQL statements concurrently against a PostgreSQL database.
#[derive(Debug, FromArgs)]
struct Args {
    /// database host
    #[argh(positional)]
    host: String,

    /// database name
    #[argh(positional)]
    database: String,

    /// database user
    #[argh(positional)]
    user: String,

    /// database password
    #[argh(positional, from_str_fn(parse_secret))]
    password: SecretString,

    /// number of concurrent workers, each running one sequence
    #[argh(positional, from_str_fn(parse_workers))]
    workers: usize,

    /// path to the JSON or YAML sequence file
    #[argh(option, short = 's', default = "PathBuf::from(\"queries.json\")")]
    sequences: PathBuf,

    /// database port
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// seed for the sequence selection, random if omitted
    #[argh(option)]
    seed: Option<u64>,
}

fn parse_secret(value: &str) -> Result<SecretString, String> {
    Ok(SecretString::from(value.to_owned()))
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("the number of workers must be positive".to_owned()),
        Ok(workers) => Ok(workers),
        Err(_) => Err(format!("`{value}` is not a valid number of workers")),
    }
}

/// Parses the command line, runs the stresstest, and waits for all workers.
///
/// Errors are only returned for failures before the first worker is launched. Failed workers are
/// logged and do not make this function fail.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();
    let config = Config::load().context("failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("sqlstress-rt")
        .enable_all()
        .worker_threads(config.runtime.worker_threads)
        .build()?;

    observability::init_tracing(&config);
    tracing::debug!(?config, ?args);

    let catalog = Catalog::load(&args.sequences)?;

    let run_config = RunConfig {
        connection: ConnectionParams {
            host: args.host,
            port: args.port,
            database: args.database,
            user: args.user,
            password: args.password,
        },
        workers: args.workers,
        seed: args.seed,
    };
    let connector = Arc::new(PostgresConnector::new(&run_config.connection));

    tracing::info!(
        workers = run_config.workers,
        sequences = catalog.len(),
        "starting stresstest"
    );
    let summary = runtime.block_on(coordinator::run(&catalog, connector, &run_config))?;
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "stresstest finished"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn parse(args: &[&str]) -> Result<Args, argh::EarlyExit> {
        Args::from_args(&["sqlstress"], args)
    }

    #[test]
    fn parses_positional_arguments() {
        let args = parse(&["localhost", "shop", "admin", "hunter2", "5"]).unwrap();

        assert_eq!(args.host, "localhost");
        assert_eq!(args.database, "shop");
        assert_eq!(args.user, "admin");
        assert_eq!(args.password.expose_secret(), "hunter2");
        assert_eq!(args.workers, 5);
        assert_eq!(args.sequences, PathBuf::from("queries.json"));
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.seed, None);
        assert!(!format!("{args:?}").contains("hunter2"));
    }

    #[test]
    fn parses_options() {
        let args = parse(&[
            "db.internal",
            "shop",
            "admin",
            "pw",
            "2",
            "-s",
            "load.yaml",
            "--port",
            "6432",
            "--seed",
            "99",
        ])
        .unwrap();

        assert_eq!(args.sequences, PathBuf::from("load.yaml"));
        assert_eq!(args.port, 6432);
        assert_eq!(args.seed, Some(99));
    }

    #[test]
    fn rejects_invalid_worker_counts() {
        assert!(parse(&["localhost", "shop", "admin", "pw", "abc"]).is_err());
        assert!(parse(&["localhost", "shop", "admin", "pw", "0"]).is_err());
        assert!(parse(&["localhost", "shop", "admin", "pw"]).is_err());
    }
}
