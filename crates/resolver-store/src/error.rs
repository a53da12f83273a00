//! Error types for the graph store
//!
//! Two families:
//! - [`StoreError`]: registry, policy and storage failures
//! - [`TokenError`]: capability token integrity failures

use resolver_graph::GraphName;

/// Graph store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Strict creation found the name taken
    #[error("graph already exists: {0}")]
    AlreadyExists(GraphName),

    /// Lookup of a name that was never created
    #[error("no such graph: {0}")]
    NoSuchGraph(GraphName),

    /// Read policy not satisfied by the principal
    #[error("access to {graph} denied for principal {principal:?}")]
    AccessDenied {
        /// Protected graph
        graph: GraphName,
        /// Principal that asked
        principal: String,
    },

    /// Append attempted without a valid capability
    #[error("write to {graph} rejected: {source}")]
    WriteRejected {
        /// Target graph
        graph: GraphName,
        /// Why the token was refused
        #[source]
        source: TokenError,
    },

    /// Backing storage unreachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the store itself is unusable
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Whether the error stems from access control rather than storage
    #[inline]
    #[must_use]
    pub fn is_access_violation(&self) -> bool {
        matches!(self, Self::AccessDenied { .. } | Self::WriteRejected { .. })
    }
}

/// Capability token integrity failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Signature does not verify against the store's key
    #[error("token signature invalid")]
    InvalidSignature,

    /// Token lifetime elapsed
    #[error("token expired at {expires_at}")]
    Expired {
        /// Expiry as unix seconds
        expires_at: u64,
    },

    /// Token minted for another graph
    #[error("token bound to {actual}, not {expected}")]
    GraphMismatch {
        /// Graph being written
        expected: GraphName,
        /// Graph in the token
        actual: GraphName,
    },

    /// Token minted for another operation
    #[error("token bound to operation {actual:?}, not {expected:?}")]
    OperationMismatch {
        /// Operation being performed
        expected: &'static str,
        /// Operation in the token
        actual: &'static str,
    },
}
