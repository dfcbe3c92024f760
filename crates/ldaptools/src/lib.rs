//! # ldaptools
//!
//! Schema-driven object creation and querying over an LDAP transport.
//!
//! Callers describe directory objects and searches in domain terms
//! (`username`, `firstName`, `groups`...). The schemas map those names to
//! wire attributes and converters, so the operations handed to the transport
//! are correctly named, escaped and encoded. Search rows travel back through
//! the same schemas into [`LdapObject`]s.
//!
//! ## Features
//!
//! - Built-in Active Directory and OpenLDAP schemas, or custom ones from JSON
//! - `%placeholder%` parameters in attribute values and containers
//! - Converters for Windows passwords, GUIDs, SIDs, FILETIME and more
//! - Filter builder with schema-aware attribute mapping
//! - Change tracking with batch modification, delete and move
//! - Typed before/after lifecycle events
//!
//! ## Example
//!
//! ```ignore
//! use ldaptools::prelude::*;
//!
//! let manager = LdapManager::new(connection);
//!
//! let dn = manager
//!     .create_user()?
//!     .with(AttributeMap::new().with("username", "jsmith").with("password", "12345"))?
//!     .in_container("ou=Employees,%_defaultnamingcontext_%")?
//!     .execute()
//!     .await?;
//!
//! let mut query = manager.query();
//! query
//!     .from_schema(ObjectKind::User)?
//!     .set_filter(Filter::starts_with("lastName", "Sm"))
//!     .add_order_by("lastName", SortDirection::Asc);
//! let users = query.get_result().await?;
//! ```

pub mod config;
pub mod context;
pub mod converter;
pub mod dn;
pub mod event;
pub mod filter;
pub mod memory;
pub mod object;
pub mod parameter;
pub mod query;
pub mod schema;

// Re-exports
pub use config::{CacheType, LdapToolsConfig};
pub use context::LdapContext;
pub use converter::{AttributeConverter, ConverterRegistry};
pub use dn::DistinguishedName;
pub use event::{EventBus, EventDispatcher, LifecycleEvent, Stage};
pub use filter::Filter;
pub use memory::InMemoryConnection;
pub use object::{LdapManager, LdapObject, LdapObjectCollection, LdapObjectCreator};
pub use query::{LdapQuery, QueryResult};
pub use schema::{InMemorySchemaParser, SchemaDefinition, SchemaParser, SchemaRegistry};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ldaptools_core::prelude::*;

    pub use crate::config::{CacheType, LdapToolsConfig};
    pub use crate::context::LdapContext;
    pub use crate::converter::{AttributeConverter, ConverterRegistry};
    pub use crate::dn::DistinguishedName;
    pub use crate::event::{
        EventBus, EventDispatcher, EventKind, LifecycleEvent, ObjectCreationEvent, ObjectEvent,
        QueryEvent, Stage,
    };
    pub use crate::filter::Filter;
    pub use crate::memory::InMemoryConnection;
    pub use crate::object::{
        AttributeChange, ChangeKind, LdapManager, LdapObject, LdapObjectCollection,
        LdapObjectCreator,
    };
    pub use crate::query::{LdapQuery, QueryResult};
    pub use crate::schema::{
        InMemorySchemaParser, SchemaAttribute, SchemaDefinition, SchemaParser, SchemaRegistry,
    };
}
