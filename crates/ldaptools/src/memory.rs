//! In-memory transport.
//!
//! Records every operation it is asked to execute and answers searches with
//! scripted rows. Used by the test suites and handy for dry runs: wrap it,
//! run a pipeline, inspect the recorded operations.

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use ldaptools_core::error::{LdapError, LdapResult};
use ldaptools_core::operation::{LdapOperation, Operation};
use ldaptools_core::transport::{LdapConnection, OperationResult, RawEntry};

#[derive(Debug, Default)]
struct State {
    operations: Vec<Operation>,
    queued: VecDeque<Vec<RawEntry>>,
    entries: Vec<RawEntry>,
    failure: Option<String>,
}

/// A transport that never leaves the process.
pub struct InMemoryConnection {
    domain: String,
    root_context: String,
    schema_name: String,
    state: Mutex<State>,
}

impl InMemoryConnection {
    pub fn new(
        domain: impl Into<String>,
        root_context: impl Into<String>,
        schema_name: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            root_context: root_context.into(),
            schema_name: schema_name.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Connection to `example.local` using the `ad` schema.
    pub fn active_directory() -> Self {
        Self::new("example.local", "dc=example,dc=local", "ad")
    }

    /// Rows returned by every search that has no queued response.
    #[must_use]
    pub fn with_entries(mut self, entries: Vec<RawEntry>) -> Self {
        self.state.get_mut().entries = entries;
        self
    }

    /// Queue rows for the next search only.
    pub async fn push_entries(&self, entries: Vec<RawEntry>) {
        self.state.lock().await.queued.push_back(entries);
    }

    /// Fail the next operation with a transport error.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.state.lock().await.failure = Some(message.into());
    }

    /// Every operation executed so far, in order.
    pub async fn operations(&self) -> Vec<Operation> {
        self.state.lock().await.operations.clone()
    }

    pub async fn operation_count(&self) -> usize {
        self.state.lock().await.operations.len()
    }

    pub async fn last_operation(&self) -> Option<Operation> {
        self.state.lock().await.operations.last().cloned()
    }

    /// Forget recorded operations.
    pub async fn reset(&self) {
        self.state.lock().await.operations.clear();
    }
}

#[async_trait]
impl LdapConnection for InMemoryConnection {
    async fn execute(&self, operation: &Operation) -> LdapResult<OperationResult> {
        let mut state = self.state.lock().await;

        if let Some(message) = state.failure.take() {
            debug!(function = operation.ldap_function(), "Scripted transport failure");
            return Err(LdapError::transport(message));
        }

        state.operations.push(operation.clone());
        debug!(
            function = operation.ldap_function(),
            operation = %operation.log_line(),
            "Recorded operation"
        );

        match operation {
            Operation::Query(_) => {
                let rows = match state.queued.pop_front() {
                    Some(rows) => rows,
                    None => state.entries.clone(),
                };
                Ok(OperationResult::Entries(rows))
            }
            _ => Ok(OperationResult::Success),
        }
    }

    fn root_context_value(&self) -> String {
        self.root_context.clone()
    }

    fn schema_context_name(&self) -> String {
        self.schema_name.clone()
    }
}

impl fmt::Display for InMemoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}

impl fmt::Debug for InMemoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryConnection")
            .field("domain", &self.domain)
            .field("root_context", &self.root_context)
            .field("schema_name", &self.schema_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldaptools_core::operation::{DeleteOperation, QueryOperation};

    #[tokio::test]
    async fn test_records_operations() {
        let conn = InMemoryConnection::active_directory();
        conn.execute(&DeleteOperation::new("cn=x,dc=example,dc=local").into())
            .await
            .unwrap();

        assert_eq!(conn.operation_count().await, 1);
        assert_eq!(
            conn.last_operation().await.map(|op| op.ldap_function()),
            Some("ldap_delete")
        );
        assert_eq!(conn.to_string(), "example.local");
        assert_eq!(conn.root_context_value(), "dc=example,dc=local");
        assert_eq!(conn.schema_context_name(), "ad");
    }

    #[tokio::test]
    async fn test_scripted_entries() {
        let conn = InMemoryConnection::active_directory()
            .with_entries(vec![RawEntry::new("cn=sticky,dc=example,dc=local")]);
        conn.push_entries(vec![]).await;

        let query: Operation = QueryOperation::new("dc=example,dc=local", "(cn=*)").into();
        assert!(conn.execute(&query).await.unwrap().into_entries().is_empty());
        assert_eq!(conn.execute(&query).await.unwrap().into_entries().len(), 1);
        assert_eq!(conn.execute(&query).await.unwrap().into_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next() {
        let conn = InMemoryConnection::active_directory();
        conn.fail_next("server down").await;

        let op: Operation = DeleteOperation::new("cn=x").into();
        let err = conn.execute(&op).await.unwrap_err();
        assert_eq!(err.error_code(), "TRANSPORT_ERROR");
        assert_eq!(conn.operation_count().await, 0);
        assert!(conn.execute(&op).await.is_ok());
    }
}
