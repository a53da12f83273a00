//! Triple collections
//!
//! A collection is a set of triples behind a shared lock. Access is split into
//! two capabilities:
//!
//! - [`TripleCollection`]: read handle, freely cloneable
//! - [`CollectionWriter`]: write handle, the only way to insert
//!
//! A writer can always produce a read handle; the reverse is impossible. There
//! is no removal API at all, so every collection only grows.

use oxrdf::{Graph, NamedNodeRef, Subject, Term, Triple, TripleRef};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use ulid::Ulid;

/// Identity of a physical collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionId(pub Ulid);

impl CollectionId {
    fn new() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Inner {
    id: CollectionId,
    graph: RwLock<Graph>,
}

/// Read handle onto a physical triple collection
///
/// Cloning shares the same underlying set; membership in a union is by
/// reference, never by copy.
#[derive(Debug, Clone)]
pub struct TripleCollection {
    inner: Arc<Inner>,
}

impl TripleCollection {
    /// Identity of the underlying collection
    #[inline]
    #[must_use]
    pub fn id(&self) -> CollectionId {
        self.inner.id
    }

    /// Whether both handles point at the same physical collection
    #[inline]
    #[must_use]
    pub fn same_collection(&self, other: &TripleCollection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of triples
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.graph.read().len()
    }

    /// Whether the collection holds no triples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.graph.read().is_empty()
    }

    /// Membership test
    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.inner.graph.read().contains(triple)
    }

    /// Owned copy of every triple
    #[must_use]
    pub fn snapshot(&self) -> Vec<Triple> {
        self.inner
            .graph
            .read()
            .iter()
            .map(TripleRef::into_owned)
            .collect()
    }

    /// Visit every triple while holding the read lock
    ///
    /// The closure must not touch this collection again.
    pub fn for_each(&self, mut f: impl FnMut(TripleRef<'_>)) {
        let graph = self.inner.graph.read();
        for triple in graph.iter() {
            f(triple);
        }
    }

    /// Triples with the given subject
    #[must_use]
    pub fn triples_for_subject(&self, subject: &Subject) -> Vec<Triple> {
        self.inner
            .graph
            .read()
            .triples_for_subject(subject.as_ref())
            .map(TripleRef::into_owned)
            .collect()
    }

    /// Objects of `(subject, predicate, ?)`
    #[must_use]
    pub fn objects(&self, subject: &Subject, predicate: NamedNodeRef<'_>) -> Vec<Term> {
        self.inner
            .graph
            .read()
            .objects_for_subject_predicate(subject.as_ref(), predicate)
            .map(|t| t.into_owned())
            .collect()
    }
}

/// Write capability for a triple collection
///
/// Only inserts are offered. Whoever owns the writer decides who may write;
/// handing out [`TripleCollection`] handles never grants write access.
#[derive(Debug, Clone)]
pub struct CollectionWriter {
    inner: Arc<Inner>,
}

impl CollectionWriter {
    /// Create a fresh, empty collection and return its writer
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: CollectionId::new(),
                graph: RwLock::new(Graph::new()),
            }),
        }
    }

    /// Read handle for the same collection
    #[inline]
    #[must_use]
    pub fn collection(&self) -> TripleCollection {
        TripleCollection {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Identity of the underlying collection
    #[inline]
    #[must_use]
    pub fn id(&self) -> CollectionId {
        self.inner.id
    }

    /// Insert one triple; returns `false` if it was already present
    pub fn insert(&self, triple: &Triple) -> bool {
        self.inner.graph.write().insert(triple)
    }

    /// Insert many triples under one lock; returns how many were new
    pub fn extend<'a>(&self, triples: impl IntoIterator<Item = &'a Triple>) -> usize {
        let mut graph = self.inner.graph.write();
        triples
            .into_iter()
            .filter(|t| graph.insert(*t))
            .count()
    }
}

impl Default for CollectionWriter {
    fn default() -> Self {
        Self::new()
    }
}
