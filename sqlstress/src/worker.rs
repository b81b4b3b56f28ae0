//! Executes a single [`CommandSequence`] on its own database connection.

use crate::catalog::CommandSequence;
use crate::database::{Connector, Session};
use crate::error::{Error, Result};

/// Runs `sequence` as one transaction on a fresh connection and reports completion.
///
/// Statements execute strictly in order. The first failing statement aborts the sequence with
/// [`Error::StatementExecution`], in which case nothing is committed. The connection is closed on
/// every path once it has been established.
///
/// On success, prints `Executed sequence {ordinal}` to stdout.
pub async fn run(
    connector: &dyn Connector,
    sequence: &CommandSequence,
    ordinal: usize,
) -> Result<()> {
    let mut session = connector
        .connect()
        .await
        .map_err(|cause| Error::Connection { ordinal, cause })?;

    let result = execute_and_commit(session.as_mut(), sequence, ordinal).await;

    if let Err(error) = session.close().await {
        tracing::warn!(
            ordinal,
            error = &*error as &dyn std::error::Error,
            "failed to close connection"
        );
    }
    result?;

    println!("Executed sequence {ordinal}");
    tracing::info!(ordinal, sequence = %sequence.name, "executed sequence");

    Ok(())
}

async fn execute_and_commit(
    session: &mut dyn Session,
    sequence: &CommandSequence,
    ordinal: usize,
) -> Result<()> {
    for (index, statement) in sequence.statements.iter().enumerate() {
        tracing::debug!(
            ordinal,
            index,
            statement = statement.as_str(),
            "executing statement"
        );
        session
            .execute(statement)
            .await
            .map_err(|cause| Error::StatementExecution {
                ordinal,
                index,
                statement: statement.clone(),
                cause,
            })?;
    }

    session
        .commit()
        .await
        .map_err(|cause| Error::StatementExecution {
            ordinal,
            index: sequence.statements.len(),
            statement: "COMMIT".to_owned(),
            cause,
        })
}

#[cfg(test)]
mod tests {
    use crate::database::{Event, InMemoryConnector};

    use super::*;

    fn sequence(statements: &[&str]) -> CommandSequence {
        CommandSequence::new("test", statements.iter().copied(), 1.0)
    }

    #[tokio::test]
    async fn executes_in_order_and_commits() {
        sqlstress_test::tracing::init();
        let connector = InMemoryConnector::new();

        run(&connector, &sequence(&["s1", "s2", "s3"]), 0).await.unwrap();

        assert_eq!(
            connector.events(),
            [
                Event::Connect(0),
                Event::Execute(0, "s1".into()),
                Event::Execute(0, "s2".into()),
                Event::Execute(0, "s3".into()),
                Event::Commit(0),
                Event::Close(0),
            ]
        );
        assert_eq!(connector.committed(), ["s1", "s2", "s3"]);
    }

    #[tokio::test]
    async fn failing_statement_stops_without_commit() {
        sqlstress_test::tracing::init();
        let connector = InMemoryConnector::new().failing_on("s2");

        let err = run(&connector, &sequence(&["s1", "s2", "s3"]), 4)
            .await
            .unwrap_err();

        let Error::StatementExecution {
            ordinal,
            index,
            statement,
            ..
        } = &err
        else {
            panic!("expected statement error, got {err:?}");
        };
        assert_eq!(*ordinal, 4);
        assert_eq!(*index, 1);
        assert_eq!(statement, "s2");

        assert_eq!(
            connector.events(),
            [
                Event::Connect(0),
                Event::Execute(0, "s1".into()),
                Event::Close(0),
            ]
        );
        assert_eq!(connector.commits(), 0);
        assert!(connector.committed().is_empty());
    }

    #[tokio::test]
    async fn connection_failure_is_reported() {
        sqlstress_test::tracing::init();
        let connector = InMemoryConnector::new().refusing_connections();

        let err = run(&connector, &sequence(&["s1"]), 2).await.unwrap_err();

        assert!(
            matches!(err, Error::Connection { ordinal: 2, .. }),
            "{err:?}"
        );
        assert!(connector.events().is_empty());
    }

    #[tokio::test]
    async fn empty_sequence_still_commits() {
        let connector = InMemoryConnector::new();

        run(&connector, &sequence(&[]), 0).await.unwrap();

        assert_eq!(connector.commits(), 1);
        assert_eq!(connector.closed(), 1);
    }
}
