//! # ldaptools core
//!
//! Shared abstractions for the ldaptools object layer.
//!
//! This crate holds the pieces every pipeline agrees on: the error taxonomy,
//! attribute values, the operation value objects and the transport trait the
//! directory connection implements.
//!
//! ## Crate Organization
//!
//! - [`error`] - Error taxonomy (`LdapError`, `LdapResult`)
//! - [`types`] - Object kinds, scopes, sort directions, hydration modes
//! - [`attribute`] - `AttributeValue` and the ordered `AttributeMap`
//! - [`operation`] - Add, Delete, Rename, BatchModify and Query operations
//! - [`transport`] - The `LdapConnection` trait and raw search rows

pub mod attribute;
pub mod error;
pub mod operation;
pub mod transport;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use ldaptools_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::attribute::{AttributeMap, AttributeValue};
    pub use crate::error::{LdapError, LdapResult};
    pub use crate::operation::{
        AddOperation, BatchChange, BatchModifyOperation, DeleteOperation, LdapOperation, ModType,
        Operation, OperationArgument, QueryOperation, RenameOperation,
    };
    pub use crate::transport::{LdapConnection, OperationResult, RawEntry};
    pub use crate::types::{HydrationMode, ObjectKind, Scope, SortDirection};
}

// Re-export async_trait for transport implementors
pub use async_trait::async_trait;
