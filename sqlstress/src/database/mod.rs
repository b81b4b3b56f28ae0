//! Database connections used by workers.
//!
//! Workers only ever talk to the database through a [`Connector`], which opens one [`Session`]
//! per worker. A session wraps a single raw connection with an open transaction: statements run
//! in order, [`Session::commit`] makes them durable, and closing a session without committing
//! discards them.
//!
//! [`PostgresConnector`] is the production implementation. [`InMemoryConnector`] records all
//! calls for inspection in tests.

use std::fmt::Debug;

use crate::error::DriverError;

mod in_memory;
mod postgres;

pub use in_memory::{Event, InMemoryConnector};
pub use postgres::PostgresConnector;

/// A type-erased [`Session`] instance.
pub type BoxedSession = Box<dyn Session>;

/// Opens database sessions for workers.
#[async_trait::async_trait]
pub trait Connector: Debug + Send + Sync + 'static {
    /// Establishes a new connection and begins a transaction on it.
    async fn connect(&self) -> Result<BoxedSession, DriverError>;
}

/// A single database connection with an open transaction.
#[async_trait::async_trait]
pub trait Session: Send {
    /// Executes a single statement within the transaction.
    async fn execute(&mut self, statement: &str) -> Result<(), DriverError>;

    /// Commits all statements executed so far.
    async fn commit(&mut self) -> Result<(), DriverError>;

    /// Closes the connection. Uncommitted statements are rolled back by the database.
    ///
    /// Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<(), DriverError>;
}
