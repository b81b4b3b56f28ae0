use std::fmt;

use secrecy::ExposeSecret;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, Executor, PgConnection};

use super::{BoxedSession, Connector, Session};
use crate::config::ConnectionParams;
use crate::error::DriverError;

/// Opens one unpooled PostgreSQL connection per session.
#[derive(Clone)]
pub struct PostgresConnector {
    options: PgConnectOptions,
}

impl fmt::Debug for PostgresConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The connect options carry the plain password.
        f.debug_struct("PostgresConnector")
            .field("host", &self.options.get_host())
            .field("port", &self.options.get_port())
            .field("database", &self.options.get_database())
            .finish_non_exhaustive()
    }
}

impl PostgresConnector {
    /// Creates a connector for the given connection parameters.
    pub fn new(params: &ConnectionParams) -> Self {
        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .database(&params.database)
            .username(&params.user)
            .password(params.password.expose_secret())
            .application_name("sqlstress");

        Self { options }
    }
}

#[async_trait::async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self) -> Result<BoxedSession, DriverError> {
        let mut conn = PgConnection::connect_with(&self.options).await?;

        if let Err(error) = conn.execute(sqlx::raw_sql("BEGIN")).await {
            if let Err(close_error) = conn.close().await {
                tracing::warn!(
                    error = &close_error as &dyn std::error::Error,
                    "failed to close connection after BEGIN failed"
                );
            }
            return Err(error.into());
        }

        Ok(Box::new(PostgresSession { conn: Some(conn) }))
    }
}

struct PostgresSession {
    conn: Option<PgConnection>,
}

impl PostgresSession {
    fn conn(&mut self) -> Result<&mut PgConnection, DriverError> {
        self.conn
            .as_mut()
            .ok_or_else(|| "connection is already closed".into())
    }
}

#[async_trait::async_trait]
impl Session for PostgresSession {
    async fn execute(&mut self, statement: &str) -> Result<(), DriverError> {
        self.conn()?.execute(sqlx::raw_sql(statement)).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.conn()?.execute(sqlx::raw_sql("COMMIT")).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}
