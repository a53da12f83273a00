//! Testing utilities for the resolver workspace
//!
//! Shared lookups, stores, fixtures and assertions.

#![allow(missing_docs)]

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use oxrdf::{NamedNode, Subject, Triple};
use rand::rngs::OsRng;
use resolver_core::{
    AuditEntry, Entity, EntityLookup, LookupError, ResolveRequest, ResolvedView, ResolverConfig,
    ResourceResolver, StaticEntityLookup,
};
use resolver_graph::{vocab, GraphName};
use resolver_store::{
    AccessGate, AccessPolicy, GraphStore, InMemoryGraphStore, StoreError, StoredGraph,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const REQUEST_URI: &str = "http://localhost/example-service";
pub const PARIS: &str = "http://example.org/Paris";
pub const CITY: &str = "http://example.org/City";
pub const NOWHERE: &str = "http://example.org/Nowhere";

pub fn node(iri: &str) -> NamedNode {
    NamedNode::new_unchecked(iri)
}

pub fn paris_is_city() -> Triple {
    Triple::new(node(PARIS), vocab::rdf::TYPE.into_owned(), node(CITY))
}

/// Lookup that knows Paris and nothing else
pub fn paris_lookup() -> StaticEntityLookup {
    StaticEntityLookup::new().with_entity(
        node(PARIS),
        Entity::new().with_representation(vec![paris_is_city()]),
    )
}

pub fn paris_request() -> ResolveRequest {
    ResolveRequest::new(REQUEST_URI)
        .with_iri(PARIS)
        .with_user_agent("test-agent/1.0")
}

/// Lookup that always fails
#[derive(Debug, Default)]
pub struct FailingLookup;

#[async_trait]
impl EntityLookup for FailingLookup {
    async fn get_entity(&self, _iri: &NamedNode) -> Result<Option<Entity>, LookupError> {
        Err(LookupError::Failed("lookup service unreachable".into()))
    }
}

/// Lookup that answers after `delay`
#[derive(Debug)]
pub struct SlowLookup {
    pub delay: Duration,
    pub inner: StaticEntityLookup,
}

impl SlowLookup {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: paris_lookup(),
        }
    }
}

#[async_trait]
impl EntityLookup for SlowLookup {
    async fn get_entity(&self, iri: &NamedNode) -> Result<Option<Entity>, LookupError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_entity(iri).await
    }
}

/// Lookup that counts calls
#[derive(Debug, Default)]
pub struct CountingLookup {
    pub inner: StaticEntityLookup,
    calls: AtomicUsize,
}

impl CountingLookup {
    pub fn new(inner: StaticEntityLookup) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityLookup for CountingLookup {
    async fn get_entity(&self, iri: &NamedNode) -> Result<Option<Entity>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_entity(iri).await
    }
}

/// Store whose backing storage is gone
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn down() -> StoreError {
        StoreError::Unavailable("connection to triple store refused".into())
    }
}

impl GraphStore for UnavailableStore {
    fn create(&self, _name: &GraphName) -> Result<StoredGraph, StoreError> {
        Err(Self::down())
    }

    fn graph(&self, _name: &GraphName) -> Result<StoredGraph, StoreError> {
        Err(Self::down())
    }

    fn install_policy(&self, _policy: AccessPolicy) -> Result<(), StoreError> {
        Err(Self::down())
    }

    fn policy(&self, _name: &GraphName) -> Result<Option<AccessPolicy>, StoreError> {
        Err(Self::down())
    }

    fn names(&self) -> Result<Vec<GraphName>, StoreError> {
        Err(Self::down())
    }
}

/// Store whose first `install_policy` fails, leaving a created graph
/// without a policy
#[derive(Debug)]
pub struct FlakyPolicyStore {
    pub inner: InMemoryGraphStore,
    failed: AtomicBool,
}

impl FlakyPolicyStore {
    pub fn new(inner: InMemoryGraphStore) -> Self {
        Self {
            inner,
            failed: AtomicBool::new(false),
        }
    }
}

impl GraphStore for FlakyPolicyStore {
    fn create(&self, name: &GraphName) -> Result<StoredGraph, StoreError> {
        self.inner.create(name)
    }

    fn graph(&self, name: &GraphName) -> Result<StoredGraph, StoreError> {
        self.inner.graph(name)
    }

    fn install_policy(&self, policy: AccessPolicy) -> Result<(), StoreError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("policy write interrupted".into()));
        }
        self.inner.install_policy(policy)
    }

    fn policy(&self, name: &GraphName) -> Result<Option<AccessPolicy>, StoreError> {
        self.inner.policy(name)
    }

    fn names(&self) -> Result<Vec<GraphName>, StoreError> {
        self.inner.names()
    }
}

pub fn in_memory_resolver(lookup: impl EntityLookup + 'static) -> ResourceResolver {
    ResourceResolver::in_memory(ResolverConfig::default(), Arc::new(lookup)).unwrap()
}

pub fn resolver_with_config(config: ResolverConfig, lookup: impl EntityLookup + 'static) -> ResourceResolver {
    ResourceResolver::in_memory(config, Arc::new(lookup)).unwrap()
}

/// Resolver over an in-memory store the caller keeps a handle to
pub fn resolver_with_store(
    lookup: impl EntityLookup + 'static,
) -> (ResourceResolver, Arc<InMemoryGraphStore>) {
    let gate = AccessGate::generate(Duration::from_secs(30));
    let store = Arc::new(InMemoryGraphStore::new(gate.verifying_key()));
    let resolver = ResourceResolver::new(
        ResolverConfig::default(),
        store.clone(),
        gate,
        Arc::new(lookup),
    )
    .unwrap();
    (resolver, store)
}

/// Resolver whose store drops the first policy install
pub fn flaky_policy_resolver() -> (ResourceResolver, Arc<FlakyPolicyStore>) {
    let gate = AccessGate::generate(Duration::from_secs(30));
    let store = Arc::new(FlakyPolicyStore::new(InMemoryGraphStore::new(
        gate.verifying_key(),
    )));
    let resolver = ResourceResolver::new(
        ResolverConfig::default(),
        store.clone(),
        gate,
        Arc::new(paris_lookup()),
    )
    .unwrap();
    (resolver, store)
}

/// Resolver whose store is unreachable
pub fn unavailable_resolver() -> ResourceResolver {
    ResourceResolver::new(
        ResolverConfig::default(),
        Arc::new(UnavailableStore),
        AccessGate::generate(Duration::from_secs(30)),
        Arc::new(paris_lookup()),
    )
    .unwrap()
}

/// Resolver whose store trusts a different key than its gate, so every
/// audit append is rejected
pub fn misconfigured_resolver() -> (ResourceResolver, Arc<InMemoryGraphStore>) {
    let stranger = SigningKey::generate(&mut OsRng);
    let store = Arc::new(InMemoryGraphStore::new(stranger.verifying_key()));
    let resolver = ResourceResolver::new(
        ResolverConfig::default(),
        store.clone(),
        AccessGate::generate(Duration::from_secs(30)),
        Arc::new(paris_lookup()),
    )
    .unwrap();
    (resolver, store)
}

/// Audit entries currently in the resolver's log graph
pub fn log_entries(resolver: &ResourceResolver) -> Vec<AuditEntry> {
    let graph = resolver.audit_log().graph().unwrap();
    AuditEntry::read_all(&graph.collection())
}

/// Response triples (the view's write target) about the root node
pub fn self_description(view: &ResolvedView) -> Vec<Triple> {
    view.view
        .write_target()
        .triples_for_subject(&Subject::from(view.root.clone()))
}

pub fn assert_self_described(view: &ResolvedView, comment: &str) {
    let root = view.root_node();
    let types: Vec<String> = root
        .objects(vocab::rdf::TYPE)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert!(
        types.contains(&format!("<{}>", vocab::service::RESOURCE_RESOLVER.as_str())),
        "root not typed as resolver: {types:?}"
    );
    let comments: Vec<String> = root
        .objects(vocab::rdfs::COMMENT)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert!(
        comments.contains(&format!("\"{comment}\"")),
        "root comment missing: {comments:?}"
    );
}
