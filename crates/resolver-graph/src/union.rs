//! Union views
//!
//! [`UnionView`] presents an ordered list of collections as one logical graph.
//! Reads see the deduplicated union of every member. The view itself has no
//! write operation: the only write path is [`GraphNode::add_property`], which
//! always lands in the first member, and that member must be supplied as a
//! [`CollectionWriter`]. Persistent graphs that only contribute read handles
//! therefore cannot be written through the view.

use crate::collection::{CollectionWriter, TripleCollection};
use oxrdf::{Graph, NamedNode, NamedNodeRef, Subject, Term, Triple, TripleRef};
use std::collections::HashSet;

/// Read-only composition of triple collections
#[derive(Debug, Clone)]
pub struct UnionView {
    target: CollectionWriter,
    members: Vec<TripleCollection>,
}

impl UnionView {
    /// Compose a view whose first member is `write_target`
    ///
    /// Members listed in `others` are referenced, never copied. A member that
    /// is the same physical collection as an earlier one is skipped.
    #[must_use]
    pub fn compose(
        write_target: CollectionWriter,
        others: impl IntoIterator<Item = TripleCollection>,
    ) -> Self {
        let mut members = vec![write_target.collection()];
        for member in others {
            if !members.iter().any(|m| m.same_collection(&member)) {
                members.push(member);
            }
        }
        Self {
            target: write_target,
            members,
        }
    }

    /// Members in composition order
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[TripleCollection] {
        &self.members
    }

    /// Read handle of the designated write target (the first member)
    #[inline]
    #[must_use]
    pub fn write_target(&self) -> TripleCollection {
        self.target.collection()
    }

    /// Whether any member holds `triple`
    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.members.iter().any(|m| m.contains(triple))
    }

    /// Number of distinct triples across all members
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_graph().len()
    }

    /// Whether every member is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.iter().all(TripleCollection::is_empty)
    }

    /// Deduplicated union materialized as a graph
    ///
    /// Members are locked one at a time, never together.
    #[must_use]
    pub fn to_graph(&self) -> Graph {
        let mut union = Graph::new();
        for member in &self.members {
            member.for_each(|t| {
                union.insert(t);
            });
        }
        union
    }

    /// Deduplicated union in member order
    #[must_use]
    pub fn triples(&self) -> Vec<Triple> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for member in &self.members {
            member.for_each(|t: TripleRef<'_>| {
                let owned = t.into_owned();
                if seen.insert(owned.clone()) {
                    out.push(owned);
                }
            });
        }
        out
    }

    /// Triples about `subject` from every member
    #[must_use]
    pub fn triples_for_subject(&self, subject: &Subject) -> Vec<Triple> {
        let mut seen = HashSet::new();
        self.members
            .iter()
            .flat_map(|m| m.triples_for_subject(subject))
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Node of this view; property writes go to the first member
    #[must_use]
    pub fn node(&self, subject: impl Into<Subject>) -> GraphNode<'_> {
        GraphNode {
            subject: subject.into(),
            view: self,
        }
    }
}

/// A subject seen through a [`UnionView`]
#[derive(Debug, Clone)]
pub struct GraphNode<'a> {
    subject: Subject,
    view: &'a UnionView,
}

impl GraphNode<'_> {
    /// The node's subject
    #[inline]
    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Add `(subject, predicate, object)` to the view's write target
    ///
    /// Returns `false` if the write target already held the triple.
    pub fn add_property(&self, predicate: NamedNode, object: impl Into<Term>) -> bool {
        let triple = Triple::new(self.subject.clone(), predicate, object);
        self.view.target.insert(&triple)
    }

    /// Objects of `predicate` across the whole union
    #[must_use]
    pub fn objects(&self, predicate: NamedNodeRef<'_>) -> Vec<Term> {
        let mut seen = HashSet::new();
        self.view
            .members
            .iter()
            .flat_map(|m| m.objects(&self.subject, predicate))
            .filter(|o| seen.insert(o.clone()))
            .collect()
    }
}
