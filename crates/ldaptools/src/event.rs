//! Lifecycle events
//!
//! The pipelines announce every mutation and query before and after it hits
//! the directory. Events are a closed set: each [`LifecycleEvent`] variant
//! carries the payload type for its kind, and [`EventBus`] subscribers are
//! registered against a payload type, so a handler can only ever see the
//! shape it was written for.
//!
//! A dispatcher error aborts the enclosing operation.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use ldaptools_core::attribute::AttributeMap;
use ldaptools_core::error::LdapResult;
use ldaptools_core::types::ObjectKind;

/// Payload types that travel in lifecycle events.
pub trait Event: Serialize + Send + Sync + 'static {
    /// Event family name. Convention: `ldaptools.<entity>`.
    const EVENT_TYPE: &'static str;
}

/// Payload of the create events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectCreationEvent {
    pub object_type: ObjectKind,

    /// Container the object is placed in.
    pub container: Option<String>,

    /// Caller data. Raw on before-create, with placeholders resolved on after-create.
    pub data: AttributeMap,

    /// DN of the new object. Only set on after-create.
    pub dn: Option<String>,
}

impl Event for ObjectCreationEvent {
    const EVENT_TYPE: &'static str = "ldaptools.object.create";
}

/// Payload of the query events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEvent {
    pub base_dn: String,
    pub filter: String,
    pub scope: String,
    pub attributes: Vec<String>,

    /// Number of objects returned. Only set on after-query.
    pub result_count: Option<usize>,
}

impl Event for QueryEvent {
    const EVENT_TYPE: &'static str = "ldaptools.query";
}

/// Payload of the modify, delete and move events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectEvent {
    pub dn: String,

    /// Domain-level changes for modify events; empty otherwise.
    pub changes: AttributeMap,

    /// Target DN for move events.
    pub new_dn: Option<String>,
}

impl Event for ObjectEvent {
    const EVENT_TYPE: &'static str = "ldaptools.object";
}

/// Every event kind the pipelines emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BeforeCreate,
    AfterCreate,
    BeforeQuery,
    AfterQuery,
    BeforeModify,
    AfterModify,
    BeforeDelete,
    AfterDelete,
    BeforeMove,
    AfterMove,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BeforeCreate => "ldap.object.before_create",
            EventKind::AfterCreate => "ldap.object.after_create",
            EventKind::BeforeQuery => "ldap.query.before_execute",
            EventKind::AfterQuery => "ldap.query.after_execute",
            EventKind::BeforeModify => "ldap.object.before_modify",
            EventKind::AfterModify => "ldap.object.after_modify",
            EventKind::BeforeDelete => "ldap.object.before_delete",
            EventKind::AfterDelete => "ldap.object.after_delete",
            EventKind::BeforeMove => "ldap.object.before_move",
            EventKind::AfterMove => "ldap.object.after_move",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event with its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum LifecycleEvent {
    BeforeCreate(ObjectCreationEvent),
    AfterCreate(ObjectCreationEvent),
    BeforeQuery(QueryEvent),
    AfterQuery(QueryEvent),
    BeforeModify(ObjectEvent),
    AfterModify(ObjectEvent),
    BeforeDelete(ObjectEvent),
    AfterDelete(ObjectEvent),
    BeforeMove(ObjectEvent),
    AfterMove(ObjectEvent),
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::BeforeCreate(_) => EventKind::BeforeCreate,
            LifecycleEvent::AfterCreate(_) => EventKind::AfterCreate,
            LifecycleEvent::BeforeQuery(_) => EventKind::BeforeQuery,
            LifecycleEvent::AfterQuery(_) => EventKind::AfterQuery,
            LifecycleEvent::BeforeModify(_) => EventKind::BeforeModify,
            LifecycleEvent::AfterModify(_) => EventKind::AfterModify,
            LifecycleEvent::BeforeDelete(_) => EventKind::BeforeDelete,
            LifecycleEvent::AfterDelete(_) => EventKind::AfterDelete,
            LifecycleEvent::BeforeMove(_) => EventKind::BeforeMove,
            LifecycleEvent::AfterMove(_) => EventKind::AfterMove,
        }
    }

    /// The payload's family name.
    pub fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeCreate(_) | LifecycleEvent::AfterCreate(_) => {
                ObjectCreationEvent::EVENT_TYPE
            }
            LifecycleEvent::BeforeQuery(_) | LifecycleEvent::AfterQuery(_) => {
                QueryEvent::EVENT_TYPE
            }
            _ => ObjectEvent::EVENT_TYPE,
        }
    }

    pub fn as_creation(&self) -> Option<&ObjectCreationEvent> {
        match self {
            LifecycleEvent::BeforeCreate(e) | LifecycleEvent::AfterCreate(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&QueryEvent> {
        match self {
            LifecycleEvent::BeforeQuery(e) | LifecycleEvent::AfterQuery(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectEvent> {
        match self {
            LifecycleEvent::BeforeModify(e)
            | LifecycleEvent::AfterModify(e)
            | LifecycleEvent::BeforeDelete(e)
            | LifecycleEvent::AfterDelete(e)
            | LifecycleEvent::BeforeMove(e)
            | LifecycleEvent::AfterMove(e) => Some(e),
            _ => None,
        }
    }
}

/// Receives lifecycle events.
pub trait EventDispatcher: Send + Sync {
    /// Handle an event. An error aborts the operation that emitted it.
    fn dispatch(&self, event: &LifecycleEvent) -> LdapResult<()>;
}

/// Which side of the operation a subscriber fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Before,
    After,
}

type Handler<E> = Box<dyn Fn(&E) -> LdapResult<()> + Send + Sync>;

enum Subscriber {
    Creation(Handler<ObjectCreationEvent>),
    Query(Handler<QueryEvent>),
    Object(Handler<ObjectEvent>),
}

/// Typed publish/subscribe dispatcher.
///
/// Subscribers run in registration order; the first error stops dispatch.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(EventKind, Subscriber)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to before-create or after-create.
    pub fn on_create<F>(&mut self, stage: Stage, handler: F) -> &mut Self
    where
        F: Fn(&ObjectCreationEvent) -> LdapResult<()> + Send + Sync + 'static,
    {
        let kind = match stage {
            Stage::Before => EventKind::BeforeCreate,
            Stage::After => EventKind::AfterCreate,
        };
        self.subscribers
            .push((kind, Subscriber::Creation(Box::new(handler))));
        self
    }

    /// Subscribe to before-query or after-query.
    pub fn on_query<F>(&mut self, stage: Stage, handler: F) -> &mut Self
    where
        F: Fn(&QueryEvent) -> LdapResult<()> + Send + Sync + 'static,
    {
        let kind = match stage {
            Stage::Before => EventKind::BeforeQuery,
            Stage::After => EventKind::AfterQuery,
        };
        self.subscribers
            .push((kind, Subscriber::Query(Box::new(handler))));
        self
    }

    /// Subscribe to before-modify or after-modify.
    pub fn on_modify<F>(&mut self, stage: Stage, handler: F) -> &mut Self
    where
        F: Fn(&ObjectEvent) -> LdapResult<()> + Send + Sync + 'static,
    {
        let kind = match stage {
            Stage::Before => EventKind::BeforeModify,
            Stage::After => EventKind::AfterModify,
        };
        self.push_object(kind, handler)
    }

    /// Subscribe to before-delete or after-delete.
    pub fn on_delete<F>(&mut self, stage: Stage, handler: F) -> &mut Self
    where
        F: Fn(&ObjectEvent) -> LdapResult<()> + Send + Sync + 'static,
    {
        let kind = match stage {
            Stage::Before => EventKind::BeforeDelete,
            Stage::After => EventKind::AfterDelete,
        };
        self.push_object(kind, handler)
    }

    /// Subscribe to before-move or after-move.
    pub fn on_move<F>(&mut self, stage: Stage, handler: F) -> &mut Self
    where
        F: Fn(&ObjectEvent) -> LdapResult<()> + Send + Sync + 'static,
    {
        let kind = match stage {
            Stage::Before => EventKind::BeforeMove,
            Stage::After => EventKind::AfterMove,
        };
        self.push_object(kind, handler)
    }

    fn push_object<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&ObjectEvent) -> LdapResult<()> + Send + Sync + 'static,
    {
        self.subscribers
            .push((kind, Subscriber::Object(Box::new(handler))));
        self
    }

    /// Number of subscribers for a kind.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.iter().filter(|(k, _)| *k == kind).count()
    }
}

impl EventDispatcher for EventBus {
    fn dispatch(&self, event: &LifecycleEvent) -> LdapResult<()> {
        let kind = event.kind();
        debug!(event = %kind, "Dispatching lifecycle event");

        for (subscribed, subscriber) in &self.subscribers {
            if *subscribed != kind {
                continue;
            }
            match subscriber {
                Subscriber::Creation(handler) => {
                    if let Some(payload) = event.as_creation() {
                        handler(payload)?;
                    }
                }
                Subscriber::Query(handler) => {
                    if let Some(payload) = event.as_query() {
                        handler(payload)?;
                    }
                }
                Subscriber::Object(handler) => {
                    if let Some(payload) = event.as_object() {
                        handler(payload)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<EventKind> = self.subscribers.iter().map(|(k, _)| *k).collect();
        f.debug_struct("EventBus").field("subscribers", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldaptools_core::error::LdapError;
    use std::sync::{Arc, Mutex};

    fn creation(dn: Option<&str>) -> ObjectCreationEvent {
        ObjectCreationEvent {
            object_type: ObjectKind::User,
            container: Some("dc=example,dc=local".to_string()),
            data: AttributeMap::new().with("username", "somedude"),
            dn: dn.map(String::from),
        }
    }

    #[test]
    fn test_event_kinds() {
        let event = LifecycleEvent::AfterCreate(creation(Some("cn=somedude,dc=example,dc=local")));
        assert_eq!(event.kind(), EventKind::AfterCreate);
        assert_eq!(event.kind().as_str(), "ldap.object.after_create");
        assert_eq!(event.event_type(), "ldaptools.object.create");
        assert!(event.as_query().is_none());
    }

    #[test]
    fn test_bus_routes_by_kind() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let before = Arc::clone(&seen);
        bus.on_create(Stage::Before, move |e| {
            before.lock().unwrap().push(format!("before:{:?}", e.dn));
            Ok(())
        });
        let after = Arc::clone(&seen);
        bus.on_create(Stage::After, move |e| {
            after.lock().unwrap().push(format!("after:{:?}", e.dn));
            Ok(())
        });

        bus.dispatch(&LifecycleEvent::BeforeCreate(creation(None)))
            .unwrap();
        bus.dispatch(&LifecycleEvent::AfterCreate(creation(Some("cn=x"))))
            .unwrap();
        bus.dispatch(&LifecycleEvent::AfterDelete(ObjectEvent {
            dn: "cn=x".to_string(),
            changes: AttributeMap::new(),
            new_dn: None,
        }))
        .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["before:None".to_string(), "after:Some(\"cn=x\")".to_string()]
        );
        assert_eq!(bus.subscriber_count(EventKind::BeforeCreate), 1);
    }

    #[test]
    fn test_bus_stops_on_error() {
        let calls = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();

        bus.on_query(Stage::Before, |_| Err(LdapError::invalid_state("vetoed")));
        let counter = Arc::clone(&calls);
        bus.on_query(Stage::Before, move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        let event = LifecycleEvent::BeforeQuery(QueryEvent {
            base_dn: "dc=example,dc=local".to_string(),
            filter: "(objectClass=*)".to_string(),
            scope: "subtree".to_string(),
            attributes: vec![],
            result_count: None,
        });

        assert!(bus.dispatch(&event).is_err());
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = LifecycleEvent::BeforeCreate(creation(None));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "before_create");
        assert_eq!(json["payload"]["object_type"], "user");
        assert_eq!(json["payload"]["data"]["username"], "somedude");
    }
}
