//! Graph names
//!
//! A [`GraphName`] is the stable identifier of a persistent collection. It is
//! always an absolute IRI.

use oxrdf::{NamedNode, NamedNodeRef};
use std::fmt;
use std::str::FromStr;

/// Errors raised while building a [`GraphName`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphNameError {
    /// The string is not an absolute IRI
    #[error("invalid graph name {iri:?}: {reason}")]
    InvalidIri {
        /// Offending input
        iri: String,
        /// Parser message
        reason: String,
    },
}

/// IRI naming a persistent triple collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphName(NamedNode);

impl GraphName {
    /// Parse and validate a graph name
    ///
    /// # Errors
    /// Returns [`GraphNameError::InvalidIri`] if `iri` is not an absolute IRI.
    pub fn new(iri: impl Into<String>) -> Result<Self, GraphNameError> {
        let iri = iri.into();
        NamedNode::new(iri.clone())
            .map(Self)
            .map_err(|e| GraphNameError::InvalidIri {
                iri,
                reason: e.to_string(),
            })
    }

    /// IRI string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The name as an RDF node
    #[inline]
    #[must_use]
    pub fn as_named_node(&self) -> NamedNodeRef<'_> {
        self.0.as_ref()
    }
}

impl fmt::Display for GraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphName {
    type Err = GraphNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<NamedNode> for GraphName {
    fn from(node: NamedNode) -> Self {
        Self(node)
    }
}
