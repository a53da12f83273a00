//! Error types for the resolver
//!
//! Provides error handling for:
//! - Entity lookup failures (recovered inside a session)
//! - Audit log failures (degrade a response, never fail it)
//! - Session state machine violations
//! - Request-level failures surfaced at the service boundary
//! - Configuration loading

use crate::state::SessionState;
use resolver_graph::GraphNameError;
use resolver_store::StoreError;
use std::path::PathBuf;

/// External entity lookup failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The lookup service reported an error
    #[error("lookup failed: {0}")]
    Failed(String),

    /// The lookup did not answer in time
    #[error("lookup timed out after {timeout_ms}ms")]
    TimedOut {
        /// Configured timeout
        timeout_ms: u64,
    },
}

/// Audit log failures
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The log graph could not be obtained
    #[error("log graph unavailable: {0}")]
    Graph(#[source] StoreError),

    /// The read policy could not be installed on a freshly created log graph
    #[error("log policy installation failed: {0}")]
    Policy(#[source] StoreError),

    /// The privileged append was refused or failed
    #[error("append to log failed: {0}")]
    Append(#[source] StoreError),

    /// The log graph could not be read
    #[error("log graph unreadable: {0}")]
    Read(#[source] StoreError),
}

impl AuditError {
    /// Underlying store error
    #[must_use]
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::Graph(e) | Self::Policy(e) | Self::Append(e) | Self::Read(e) => e,
        }
    }

    /// Whether the backing store is unusable
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.store_error().is_fatal()
    }
}

/// Session state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Transition not permitted from the current state
    #[error("illegal session transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },
}

/// Request-level errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A request parameter is not an absolute IRI
    #[error("invalid IRI {iri:?}: {reason}")]
    InvalidIri {
        /// Offending value
        iri: String,
        /// Parser message
        reason: String,
    },

    /// Persistent storage unreachable
    #[error("storage failure: {0}")]
    StorageFatal(#[source] StoreError),

    /// Session driven out of order
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ResolveError {
    /// HTTP status the boundary should answer with
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidIri { .. } => 400,
            Self::StorageFatal(_) | Self::Session(_) => 500,
        }
    }

    /// Whether the service itself is unusable
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StorageFatal(_))
    }
}

impl From<AuditError> for ResolveError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Graph(e) | AuditError::Policy(e) | AuditError::Append(e) | AuditError::Read(e) => {
                Self::StorageFatal(e)
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An override or field has an unusable value
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Field or variable name
        key: String,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Log graph name is not an IRI
    #[error(transparent)]
    GraphName(#[from] GraphNameError),
}
