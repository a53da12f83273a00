//! Resolver Store
//!
//! Named persistent graphs, read policies and capability-gated appends.
//!
//! # Overview
//!
//! - **GraphStore**: registry with strict `create` and race-tolerant `get_or_create`
//! - **AccessPolicy**: read permission attached to a graph
//! - **AccessGate**: mints scoped append capabilities via `run_privileged`
//! - **CapabilityToken**: ed25519-signed grant bound to one graph and operation
//!
//! # Example
//!
//! ```rust
//! use resolver_store::{AccessGate, GraphStore, InMemoryGraphStore};
//! use resolver_graph::{vocab, GraphName};
//! use oxrdf::{BlankNode, Triple};
//! use std::time::Duration;
//!
//! let gate = AccessGate::generate(Duration::from_secs(30));
//! let store = InMemoryGraphStore::new(gate.verifying_key());
//!
//! let name = GraphName::new("http://example.org/log.graph").unwrap();
//! let acquired = store.get_or_create(&name).unwrap();
//! assert!(acquired.created);
//!
//! let entry = Triple::new(
//!     BlankNode::default(),
//!     vocab::rdf::TYPE.into_owned(),
//!     vocab::service::LOGGED_REQUEST.into_owned(),
//! );
//! gate.run_privileged(&name, |scope| scope.append(&acquired.graph, &[entry]))
//!     .unwrap();
//! assert_eq!(acquired.graph.collection().len(), 1);
//! ```

#![warn(missing_docs)]

mod error;
mod gate;
mod integrity;
mod policy;
mod store;
mod token;

// Re-exports
pub use error::{StoreError, TokenError};
pub use gate::{AccessGate, PrivilegedScope};
pub use integrity::TokenIntegrity;
pub use policy::{
    AccessPolicy, Permission, PermissionAction, Principal, CONTENT_GRAPH_NAMESPACE,
};
pub use store::{Acquired, GraphStore, InMemoryGraphStore, StoredGraph};
pub use token::{CapabilityToken, Operation};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for store operations
    pub use crate::{
        AccessGate, AccessPolicy, Acquired, GraphStore, InMemoryGraphStore, Permission,
        Principal, StoreError, StoredGraph,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
