//! Launches workers concurrently and waits for all of them to finish.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::catalog::Catalog;
use crate::config::RunConfig;
use crate::database::Connector;
use crate::error::Result;
use crate::worker;

/// Terminal states of all workers of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Workers that committed their sequence.
    pub succeeded: usize,
    /// Workers that failed to connect, failed a statement, or panicked.
    pub failed: usize,
}

/// Runs `config.workers` workers concurrently, each on an independently selected sequence.
///
/// All sequences are selected before the first worker is launched, so an empty or degenerate
/// catalog fails the run without touching the database. Once launched, worker failures are
/// logged and counted but never abort the run or affect other workers. Returns only after every
/// worker has terminated.
pub async fn run(
    catalog: &Catalog,
    connector: Arc<dyn Connector>,
    config: &RunConfig,
) -> Result<RunSummary> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = SmallRng::seed_from_u64(seed);
    tracing::debug!(seed, workers = config.workers, "selecting sequences");

    let selected = (0..config.workers)
        .map(|_| catalog.select_weighted(&mut rng).map(Arc::clone))
        .collect::<Result<Vec<_>>>()?;

    let tasks: Vec<_> = selected
        .into_iter()
        .enumerate()
        .map(|(ordinal, sequence)| {
            let connector = Arc::clone(&connector);
            tracing::debug!(ordinal, sequence = %sequence.name, "launching worker");
            tokio::spawn(async move { worker::run(connector.as_ref(), &sequence, ordinal).await })
        })
        .collect();

    let finished_tasks = futures::future::join_all(tasks).await;

    let mut summary = RunSummary::default();
    for (ordinal, task) in finished_tasks.into_iter().enumerate() {
        match task {
            Ok(Ok(())) => summary.succeeded += 1,
            Ok(Err(error)) => {
                tracing::error!(
                    ordinal,
                    error = &error as &dyn std::error::Error,
                    "worker failed"
                );
                summary.failed += 1;
            }
            Err(error) => {
                tracing::error!(
                    ordinal,
                    error = &error as &dyn std::error::Error,
                    "worker panicked"
                );
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
