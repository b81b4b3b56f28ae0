//! A concurrent SQL load generator.
//!
//! A stresstest loads a [`Catalog`] of weighted [`CommandSequence`]s, launches a fixed number of
//! workers and lets each of them pick one sequence at random, with a probability proportional to
//! the sequence's weight. Every worker opens its own database connection, executes its sequence
//! as a single transaction and reports completion.
//!
//! Workers are isolated from each other: a worker that fails to connect or hits a failing
//! statement is logged and counted, but never affects the other workers or the outcome of the
//! run.
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod database;
pub mod error;
pub mod observability;
pub mod worker;

pub use crate::catalog::{Catalog, CommandSequence};
pub use crate::coordinator::{RunSummary, run};
pub use crate::error::{Error, Result};
