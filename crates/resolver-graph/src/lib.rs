//! Resolver Graph
//!
//! Grow-only triple collections and the read-only union view built over them.
//!
//! # Overview
//!
//! - **TripleCollection**: cloneable read handle onto one physical set of triples
//! - **CollectionWriter**: the separate write capability for a collection
//! - **UnionView**: ordered composition of collections queried as one graph
//! - **GraphName**: validated IRI naming a persistent collection
//!
//! # Example
//!
//! ```rust
//! use resolver_graph::{vocab, CollectionWriter, UnionView};
//! use oxrdf::{Literal, NamedNode, Triple};
//!
//! let log = CollectionWriter::new();
//! let response = CollectionWriter::new();
//!
//! let view = UnionView::compose(response, [log.collection()]);
//! let root = NamedNode::new_unchecked("http://localhost/example-service");
//! view.node(root.clone())
//!     .add_property(vocab::rdfs::COMMENT.into_owned(), Literal::new_simple_literal("hi"));
//!
//! // The write went to the first member, never to the log.
//! assert_eq!(view.write_target().len(), 1);
//! assert!(log.collection().is_empty());
//! ```

#![warn(missing_docs)]

pub mod collection;
pub mod name;
pub mod union;
pub mod vocab;

// Re-exports
pub use collection::{CollectionId, CollectionWriter, TripleCollection};
pub use name::{GraphName, GraphNameError};
pub use union::{GraphNode, UnionView};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for graph operations
    pub use crate::{
        CollectionId, CollectionWriter, GraphName, GraphNode, TripleCollection, UnionView,
    };
    pub use oxrdf::{BlankNode, Literal, NamedNode, Subject, Term, Triple};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
