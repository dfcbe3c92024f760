//! Integration test helpers for ldaptools.
//!
//! Provides logging setup, an event recorder and connection fixtures backed
//! by the in-memory transport.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use ldaptools::prelude::*;

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// Records every dispatched event.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(LifecycleEvent::kind).collect()
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: &LifecycleEvent) -> LdapResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Connection to `example.com` using the `ad` schema.
pub fn example_com() -> Arc<InMemoryConnection> {
    Arc::new(InMemoryConnection::new("example.com", "dc=example,dc=com", "ad"))
}

/// Connection to `example.local` using the `example` schema.
pub fn example_local() -> Arc<InMemoryConnection> {
    Arc::new(InMemoryConnection::new(
        "example.local",
        "dc=example,dc=local",
        "example",
    ))
}

/// The built-in schemas plus an `example` schema whose users have a default container.
pub fn example_schemas() -> InMemorySchemaParser {
    let mut parser = InMemorySchemaParser::with_default_schemas();
    parser
        .add(
            "example",
            SchemaDefinition::new("user", vec!["top", "person", "organizationalPerson", "user"])
                .with_attribute("name", "cn")
                .with_attribute("username", "sAMAccountName")
                .with_converted_attribute("password", "unicodePwd", "windows_password")
                .with_default_container("ou=foo,ou=bar,%_defaultnamingcontext_%")
                .with_default_value("name", "%username%"),
        )
        .unwrap();
    parser
}

/// A context over `connection` with the example schemas and an event recorder.
pub fn context_with_recorder(
    connection: Arc<InMemoryConnection>,
) -> (LdapContext, Arc<RecordingDispatcher>) {
    init_test_logging();
    let recorder = Arc::new(RecordingDispatcher::default());
    let context = LdapContext::new(connection)
        .with_schema_parser(example_schemas())
        .with_dispatcher(recorder.clone());
    (context, recorder)
}

/// The two-person fixture used by the query tests.
pub fn people_rows() -> Vec<RawEntry> {
    vec![
        RawEntry::new("uid=jbourke,ou=People,dc=example,dc=local")
            .with("givenname", vec!["Jon".into()])
            .with("cn", vec!["Jon Bourke".into()])
            .with("sn", vec!["Bourke".into()]),
        RawEntry::new("uid=jgoldste,ou=People,dc=example,dc=local")
            .with("givenname", vec!["Joe".into()])
            .with("cn", vec!["Joe Goldstein".into()])
            .with("sn", vec!["Goldstein".into()]),
    ]
}
