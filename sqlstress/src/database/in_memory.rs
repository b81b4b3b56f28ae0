//! In-memory connector for tests.
//!
//! [`InMemoryConnector`] never touches a database. It records every call made by its sessions as
//! an [`Event`] and keeps the statements of committed sessions, so tests can assert on ordering,
//! commits and connection cleanup. It can be configured to fail connecting, to fail on a specific
//! statement, and to delay every statement.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BoxedSession, Connector, Session};
use crate::error::DriverError;

/// A call observed by an [`InMemoryConnector`], tagged with the session it happened on.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A session was opened.
    Connect(usize),
    /// A statement was executed successfully.
    Execute(usize, String),
    /// A session committed.
    Commit(usize),
    /// A session was closed.
    Close(usize),
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    committed: Vec<String>,
    sessions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    state: Arc<Mutex<State>>,
    delay: Duration,
    refuse_connections: bool,
    failing_statement: Option<String>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `delay` before every statement.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes every connection attempt fail.
    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Makes every execution of `statement` fail.
    pub fn failing_on(mut self, statement: impl Into<String>) -> Self {
        self.failing_statement = Some(statement.into());
        self
    }

    /// Returns all recorded events in the order they happened.
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    /// Returns the statements of all committed sessions, in commit order.
    pub fn committed(&self) -> Vec<String> {
        self.state.lock().unwrap().committed.clone()
    }

    /// Returns the number of sessions that were opened.
    pub fn connections(&self) -> usize {
        self.state.lock().unwrap().sessions
    }

    /// Returns the number of sessions that were closed.
    pub fn closed(&self) -> usize {
        self.count(|e| matches!(e, Event::Close(_)))
    }

    /// Returns the number of sessions that committed.
    pub fn commits(&self) -> usize {
        self.count(|e| matches!(e, Event::Commit(_)))
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        let state = self.state.lock().unwrap();
        state.events.iter().filter(|e| predicate(e)).count()
    }
}

#[async_trait::async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self) -> Result<BoxedSession, DriverError> {
        if self.refuse_connections {
            return Err("connection refused".into());
        }

        let id = {
            let mut state = self.state.lock().unwrap();
            let id = state.sessions;
            state.sessions += 1;
            state.events.push(Event::Connect(id));
            id
        };

        Ok(Box::new(InMemorySession {
            id,
            connector: self.clone(),
            pending: Vec::new(),
            closed: false,
        }))
    }
}

struct InMemorySession {
    id: usize,
    connector: InMemoryConnector,
    pending: Vec<String>,
    closed: bool,
}

#[async_trait::async_trait]
impl Session for InMemorySession {
    async fn execute(&mut self, statement: &str) -> Result<(), DriverError> {
        if !self.connector.delay.is_zero() {
            tokio::time::sleep(self.connector.delay).await;
        }

        if self.connector.failing_statement.as_deref() == Some(statement) {
            return Err(format!("syntax error at or near `{statement}`").into());
        }

        self.pending.push(statement.to_owned());
        let mut state = self.connector.state.lock().unwrap();
        state.events.push(Event::Execute(self.id, statement.to_owned()));
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        let mut state = self.connector.state.lock().unwrap();
        state.committed.append(&mut self.pending);
        state.events.push(Event::Commit(self.id));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            self.pending.clear();
            let mut state = self.connector.state.lock().unwrap();
            state.events.push(Event::Close(self.id));
        }
        Ok(())
    }
}
