//! Resolution results

use crate::types::RequestId;
use oxrdf::NamedNode;
use resolver_graph::{GraphNode, UnionView};
use serde::Serialize;
use std::fmt;

/// Presentation template the boundary renders a [`ResolvedView`] with
pub const SERVICE_ENTRY_TEMPLATE: &str = "ServiceEntry";

/// Recoverable problem encountered while resolving
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No description could be obtained for the entity
    LookupUnavailable {
        /// Requested entity
        entity: String,
        /// Failure, timeout or absence
        reason: String,
    },
    /// The audit entry could not be written
    LogWriteFailure {
        /// Requested entity
        entity: String,
        /// Underlying store error
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::LookupUnavailable { entity, reason } => {
                write!(f, "no description for <{entity}>: {reason}")
            }
            Warning::LogWriteFailure { entity, reason } => {
                write!(f, "request for <{entity}> not logged: {reason}")
            }
        }
    }
}

/// Composed response of one resolution
#[derive(Debug, Clone)]
pub struct ResolvedView {
    /// Request identifier
    pub request_id: RequestId,
    /// The request's own node
    pub root: NamedNode,
    /// Presentation template name
    pub template: &'static str,
    /// Response graph united with the audit log
    pub view: UnionView,
    /// Recovered failures
    pub warnings: Vec<Warning>,
}

impl ResolvedView {
    /// HTTP status for the boundary
    ///
    /// Degraded results are still successful responses.
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        200
    }

    /// Whether anything was recovered from
    #[inline]
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// The root node seen through the view
    #[must_use]
    pub fn root_node(&self) -> GraphNode<'_> {
        self.view.node(self.root.clone())
    }

    /// N-Triples serialization of the whole view, lines sorted
    #[must_use]
    pub fn to_ntriples(&self) -> String {
        let mut lines: Vec<String> = self
            .view
            .triples()
            .iter()
            .map(|t| format!("{t} ."))
            .collect();
        lines.sort();
        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}
