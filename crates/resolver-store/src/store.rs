//! Named graph registry
//!
//! [`GraphStore`] maps graph names to persistent collections. Creation is
//! strict (`create` fails if the name is taken); [`GraphStore::get_or_create`]
//! layers race tolerance on top so that concurrent first use of a name always
//! converges on one collection.
//!
//! A [`StoredGraph`] never hands out its writer. Appends must present a
//! [`CapabilityToken`] signed by the key the store trusts.

use crate::error::StoreError;
use crate::integrity::TokenIntegrity;
use crate::policy::{AccessPolicy, Principal};
use crate::token::{CapabilityToken, Operation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ed25519_dalek::VerifyingKey;
use oxrdf::Triple;
use resolver_graph::{CollectionWriter, GraphName, TripleCollection};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Result of [`GraphStore::get_or_create`]
#[derive(Debug, Clone)]
pub struct Acquired {
    /// The graph, whoever created it
    pub graph: StoredGraph,
    /// Whether this call created it
    pub created: bool,
}

/// A persistent graph held by a store
#[derive(Clone)]
pub struct StoredGraph {
    name: GraphName,
    writer: CollectionWriter,
    verifying_key: VerifyingKey,
}

impl StoredGraph {
    /// New empty graph that accepts appends signed for `verifying_key`
    #[must_use]
    pub fn new(name: GraphName, verifying_key: VerifyingKey) -> Self {
        Self {
            name,
            writer: CollectionWriter::new(),
            verifying_key,
        }
    }

    /// Graph name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &GraphName {
        &self.name
    }

    /// Read handle onto the graph's triples
    #[inline]
    #[must_use]
    pub fn collection(&self) -> TripleCollection {
        self.writer.collection()
    }

    /// Append triples under a capability
    ///
    /// Returns how many triples were new.
    ///
    /// # Errors
    /// [`StoreError::WriteRejected`] if the token fails signature, expiry,
    /// graph or operation checks. Nothing is written in that case.
    pub fn append(&self, token: &CapabilityToken, triples: &[Triple]) -> Result<usize, StoreError> {
        if let Err(source) =
            TokenIntegrity::verify_full(token, &self.verifying_key, &self.name, Operation::Append)
        {
            tracing::warn!(graph = %self.name, token = %token.token_id, error = %source, "append rejected");
            return Err(StoreError::WriteRejected {
                graph: self.name.clone(),
                source,
            });
        }
        let added = self.writer.extend(triples);
        tracing::trace!(graph = %self.name, added, "appended");
        Ok(added)
    }
}

impl fmt::Debug for StoredGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredGraph")
            .field("name", &self.name)
            .field("collection", &self.writer.id())
            .finish_non_exhaustive()
    }
}

/// Registry of named persistent graphs and their read policies
pub trait GraphStore: Send + Sync + fmt::Debug {
    /// Create a graph; fails if the name is already taken
    ///
    /// # Errors
    /// [`StoreError::AlreadyExists`] if another caller created it first,
    /// [`StoreError::Unavailable`] if the backing storage is gone.
    fn create(&self, name: &GraphName) -> Result<StoredGraph, StoreError>;

    /// Look up an existing graph
    ///
    /// # Errors
    /// [`StoreError::NoSuchGraph`] if it was never created.
    fn graph(&self, name: &GraphName) -> Result<StoredGraph, StoreError>;

    /// Attach a read policy to a graph
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] if the backing storage is gone.
    fn install_policy(&self, policy: AccessPolicy) -> Result<(), StoreError>;

    /// Read policy attached to a graph, if any
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] if the backing storage is gone.
    fn policy(&self, name: &GraphName) -> Result<Option<AccessPolicy>, StoreError>;

    /// Names of every stored graph, sorted
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] if the backing storage is gone.
    fn names(&self) -> Result<Vec<GraphName>, StoreError>;

    /// Obtain a graph, creating it if absent
    ///
    /// Exactly one of any number of concurrent callers for a fresh name sees
    /// `created == true`; every caller gets the same collection. A caller
    /// that loses the creation race falls back to the winner's graph.
    ///
    /// # Errors
    /// Any error other than the tolerated `NoSuchGraph` / `AlreadyExists`.
    fn get_or_create(&self, name: &GraphName) -> Result<Acquired, StoreError> {
        match self.graph(name) {
            Ok(graph) => {
                return Ok(Acquired {
                    graph,
                    created: false,
                })
            }
            Err(StoreError::NoSuchGraph(_)) => {}
            Err(e) => return Err(e),
        }

        match self.create(name) {
            Ok(graph) => Ok(Acquired {
                graph,
                created: true,
            }),
            Err(StoreError::AlreadyExists(_)) => {
                tracing::debug!(graph = %name, "lost creation race, using existing graph");
                self.graph(name).map(|graph| Acquired {
                    graph,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Create a graph that is protected by `policy` from the moment it is
    /// visible
    ///
    /// The default runs `create` then `install_policy`, so a failed install
    /// leaves the graph without a policy. Stores that can publish both at once
    /// should override it.
    ///
    /// # Errors
    /// As for [`Self::create`] and [`Self::install_policy`].
    fn create_with_policy(
        &self,
        name: &GraphName,
        policy: AccessPolicy,
    ) -> Result<StoredGraph, StoreError> {
        let graph = self.create(name)?;
        self.install_policy(policy)?;
        Ok(graph)
    }

    /// Like [`Self::get_or_create`], creating through
    /// [`Self::create_with_policy`]
    ///
    /// # Errors
    /// Any error other than the tolerated `NoSuchGraph` / `AlreadyExists`.
    fn get_or_create_with_policy(
        &self,
        name: &GraphName,
        policy: AccessPolicy,
    ) -> Result<Acquired, StoreError> {
        match self.graph(name) {
            Ok(graph) => {
                return Ok(Acquired {
                    graph,
                    created: false,
                })
            }
            Err(StoreError::NoSuchGraph(_)) => {}
            Err(e) => return Err(e),
        }

        match self.create_with_policy(name, policy) {
            Ok(graph) => Ok(Acquired {
                graph,
                created: true,
            }),
            Err(StoreError::AlreadyExists(_)) => {
                tracing::debug!(graph = %name, "lost creation race, using existing graph");
                self.graph(name).map(|graph| Acquired {
                    graph,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Read handle for `principal`, enforcing the graph's read policy
    ///
    /// Graphs without a policy are readable by everyone.
    ///
    /// # Errors
    /// [`StoreError::AccessDenied`] if the policy is not satisfied.
    fn open_for_read(
        &self,
        name: &GraphName,
        principal: &Principal,
    ) -> Result<TripleCollection, StoreError> {
        let graph = self.graph(name)?;
        if let Some(policy) = self.policy(name)? {
            if !policy.permits_read(principal) {
                tracing::debug!(graph = %name, principal = principal.name(), "read denied");
                return Err(StoreError::AccessDenied {
                    graph: name.clone(),
                    principal: principal.name().to_string(),
                });
            }
        }
        Ok(graph.collection())
    }
}

/// In-process graph store
pub struct InMemoryGraphStore {
    graphs: DashMap<GraphName, StoredGraph>,
    policies: DashMap<GraphName, AccessPolicy>,
    verifying_key: VerifyingKey,
    policy_installs: AtomicUsize,
}

impl InMemoryGraphStore {
    /// Empty store that trusts tokens signed for `verifying_key`
    #[must_use]
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self {
            graphs: DashMap::new(),
            policies: DashMap::new(),
            verifying_key,
            policy_installs: AtomicUsize::new(0),
        }
    }

    /// Number of `install_policy` calls served
    #[inline]
    #[must_use]
    pub fn policy_installs(&self) -> usize {
        self.policy_installs.load(Ordering::SeqCst)
    }

    /// Number of stored graphs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Whether no graph has been created
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl fmt::Debug for InMemoryGraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryGraphStore")
            .field("graphs", &self.graphs.len())
            .field("policies", &self.policies.len())
            .finish_non_exhaustive()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn create(&self, name: &GraphName) -> Result<StoredGraph, StoreError> {
        match self.graphs.entry(name.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(name.clone())),
            Entry::Vacant(slot) => {
                let graph = StoredGraph::new(name.clone(), self.verifying_key);
                slot.insert(graph.clone());
                tracing::info!(graph = %name, "graph created");
                Ok(graph)
            }
        }
    }

    fn create_with_policy(
        &self,
        name: &GraphName,
        policy: AccessPolicy,
    ) -> Result<StoredGraph, StoreError> {
        match self.graphs.entry(name.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(name.clone())),
            Entry::Vacant(slot) => {
                // Policy first: the graph must never be visible unprotected.
                self.install_policy(policy)?;
                let graph = StoredGraph::new(name.clone(), self.verifying_key);
                slot.insert(graph.clone());
                tracing::info!(graph = %name, "graph created with policy");
                Ok(graph)
            }
        }
    }

    fn graph(&self, name: &GraphName) -> Result<StoredGraph, StoreError> {
        self.graphs
            .get(name)
            .map(|g| g.value().clone())
            .ok_or_else(|| StoreError::NoSuchGraph(name.clone()))
    }

    fn install_policy(&self, policy: AccessPolicy) -> Result<(), StoreError> {
        tracing::info!(graph = %policy.graph, permission = %policy.read_permission, "policy installed");
        self.policies.insert(policy.graph.clone(), policy);
        self.policy_installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn policy(&self, name: &GraphName) -> Result<Option<AccessPolicy>, StoreError> {
        Ok(self.policies.get(name).map(|p| p.value().clone()))
    }

    fn names(&self) -> Result<Vec<GraphName>, StoreError> {
        let mut names: Vec<GraphName> = self.graphs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}
