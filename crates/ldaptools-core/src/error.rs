//! ldaptools error types
//!
//! A single taxonomy for the object and query pipelines. Validation classes are
//! always raised before any transport call is made.

use thiserror::Error;

/// Error that can occur while building, converting or executing directory operations.
#[derive(Debug, Error)]
pub enum LdapError {
    // Builder usage errors
    /// A builder method was called out of order.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// The input to a create or query call has the wrong shape.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The object type token passed to `create` is not a known object kind.
    #[error("unable to create object: {message}")]
    Creation { message: String },

    // Schema errors
    /// No schema definition exists for the object type.
    #[error("unknown object type '{object_type}' in schema '{schema}'")]
    UnknownObjectType { object_type: String, schema: String },

    /// The schema definition could not be parsed or is malformed.
    #[error("schema parse error: {message}")]
    SchemaParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Finalize errors
    /// A `%name%` placeholder was referenced but never bound.
    #[error("unresolved parameter '{name}'")]
    UnresolvedParameter { name: String },

    /// Neither an explicit container nor a schema default container is available.
    #[error("no container or OU specified to place the LDAP object in")]
    MissingContainer,

    // Conversion errors
    /// The schema references a converter that is not registered.
    #[error("unknown attribute converter '{converter}'")]
    UnknownConverter { converter: String },

    /// A converter rejected the value it was given.
    #[error("conversion failed with converter '{converter}': {message}")]
    Conversion { converter: String, message: String },

    // Query errors
    /// The scope value is not one of base, onelevel or subtree.
    #[error("invalid scope '{scope}', expected one of: base, onelevel, subtree")]
    InvalidScope { scope: String },

    // Transport errors
    /// The transport collaborator reported a failure.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LdapError {
    /// Check if this error is detected before any network call is made.
    ///
    /// These errors guarantee the directory was left untouched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LdapError::InvalidState { .. }
                | LdapError::InvalidArgument { .. }
                | LdapError::InvalidScope { .. }
                | LdapError::MissingContainer
                | LdapError::UnresolvedParameter { .. }
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            LdapError::InvalidState { .. } => "INVALID_STATE",
            LdapError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            LdapError::Creation { .. } => "CREATION_ERROR",
            LdapError::UnknownObjectType { .. } => "UNKNOWN_OBJECT_TYPE",
            LdapError::SchemaParse { .. } => "SCHEMA_PARSE_ERROR",
            LdapError::UnresolvedParameter { .. } => "UNRESOLVED_PARAMETER",
            LdapError::MissingContainer => "MISSING_CONTAINER",
            LdapError::UnknownConverter { .. } => "UNKNOWN_CONVERTER",
            LdapError::Conversion { .. } => "CONVERSION_FAILED",
            LdapError::InvalidScope { .. } => "INVALID_SCOPE",
            LdapError::Transport { .. } => "TRANSPORT_ERROR",
        }
    }

    // Convenience constructors

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        LdapError::InvalidState {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        LdapError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a schema parse error.
    pub fn schema_parse(message: impl Into<String>) -> Self {
        LdapError::SchemaParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a schema parse error with source.
    pub fn schema_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LdapError::SchemaParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a conversion error.
    pub fn conversion(converter: impl Into<String>, message: impl Into<String>) -> Self {
        LdapError::Conversion {
            converter: converter.into(),
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        LdapError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error with source.
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LdapError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for ldaptools operations.
pub type LdapResult<T> = Result<T, LdapError>;
