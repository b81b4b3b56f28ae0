use std::path::PathBuf;

use thiserror::Error;

/// A type-erased cause reported by a database driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while setting up or running a stresstest.
#[derive(Debug, Error)]
pub enum Error {
    /// The run configuration could not be assembled from the environment.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The sequence file is missing, unreadable, or malformed.
    #[error("failed to load sequences from `{}`: {context}", path.display())]
    CatalogLoad {
        path: PathBuf,
        context: String,
        #[source]
        cause: Option<DriverError>,
    },

    /// Selection was attempted on a catalog without any sequences.
    #[error("the sequence catalog is empty")]
    EmptyCatalog,

    /// Selection was attempted on a catalog whose weights sum to zero.
    #[error("the sequence catalog has no selectable weight (total weight {total})")]
    DegenerateWeights { total: f64 },

    /// A worker could not establish its database connection.
    #[error("worker {ordinal} failed to connect to the database")]
    Connection {
        ordinal: usize,
        #[source]
        cause: DriverError,
    },

    /// A statement in a worker's sequence failed; the sequence was not committed.
    #[error("worker {ordinal} failed executing statement #{index} `{statement}`")]
    StatementExecution {
        ordinal: usize,
        index: usize,
        statement: String,
        #[source]
        cause: DriverError,
    },
}

/// Result type for stresstest operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
