//! Runs weighted sequences of SQL statements concurrently against a PostgreSQL database.
//!
//! ```text
//! sqlstress <host> <database> <user> <password> <workers> [-s queries.json] [-p 5432]
//! ```
//!
//! See [`sqlstress::cli`] for all arguments.

fn main() -> anyhow::Result<()> {
    sqlstress::cli::execute()
}
