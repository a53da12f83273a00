//! Concurrency tests for the resolver.
//!
//! Core guarantees exercised here:
//! - Concurrent first use of the log graph creates it and its policy exactly
//!   once.
//! - K concurrent resolutions append K entries with K distinct identifiers.
//! - Earlier entries survive later appends unchanged.

use proptest::prelude::*;
use resolver_core::{AuditEntry, ResolveRequest};
use resolver_store::{GraphStore, Principal};
use resolver_test_utils::{
    in_memory_resolver, log_entries, node, paris_lookup, paris_request, resolver_with_store,
    CountingLookup, PARIS, REQUEST_URI,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Tenet: concurrent initialization converges on one log graph and one policy.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_initialize_creates_log_once() {
    let (resolver, store) = resolver_with_store(paris_lookup());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.initialize() })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(resolver.store().names().unwrap().len(), 1);
    assert_eq!(store.policy_installs(), 1);
    let auditor = Principal::new("auditor")
        .with_permission(resolver.audit_log().read_permission().clone());
    assert!(resolver.audit_log().entries(&auditor).unwrap().is_empty());
}

/// Tenet: K concurrent resolutions leave exactly K distinct entries.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolutions_append_distinct_entries() {
    const K: usize = 64;
    let lookup = CountingLookup::new(paris_lookup());
    let resolver = in_memory_resolver(lookup);

    let tasks: Vec<_> = (0..K)
        .map(|i| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                resolver
                    .resolve(
                        ResolveRequest::new(REQUEST_URI)
                            .with_iri(PARIS)
                            .with_user_agent(format!("client-{i}")),
                    )
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        let resolved = result.unwrap().unwrap();
        assert!(resolved.warnings.is_empty());
    }

    let entries = log_entries(&resolver);
    assert_eq!(entries.len(), K);

    let ids: HashSet<_> = entries.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids.len(), K);

    let clients: HashSet<_> = entries.iter().map(|e| e.client.clone()).collect();
    assert_eq!(clients.len(), K);
    assert!(entries.iter().all(|e| e.entity == node(PARIS)));
}

/// Tenet: a later append never touches earlier entries.
#[tokio::test]
async fn earlier_entries_are_never_mutated() {
    let resolver = in_memory_resolver(paris_lookup());
    resolver.resolve(paris_request()).await.unwrap();

    let graph = resolver.audit_log().graph().unwrap().collection();
    let before: HashSet<String> = graph.snapshot().iter().map(ToString::to_string).collect();

    for _ in 0..5 {
        resolver.resolve(paris_request()).await.unwrap();
    }

    let after: HashSet<String> = graph.snapshot().iter().map(ToString::to_string).collect();
    assert!(before.is_subset(&after));
    assert_eq!(after.len(), before.len() + 5 * 4);
}

/// Tenet: the lookup is consulted once per request naming an entity.
#[tokio::test]
async fn lookup_called_only_with_identifier() {
    let lookup = Arc::new(CountingLookup::new(paris_lookup()));
    let resolver = resolver_core::ResourceResolver::in_memory(
        resolver_core::ResolverConfig::default(),
        lookup.clone(),
    )
    .unwrap();

    resolver.resolve(ResolveRequest::new(REQUEST_URI)).await.unwrap();
    resolver.resolve(paris_request()).await.unwrap();

    assert_eq!(lookup.calls(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any mix of requests logs exactly those that named an entity, each
    /// with its client descriptor or the unknown marker.
    #[test]
    fn log_matches_requests(requests in prop::collection::vec(
        (any::<bool>(), prop::option::of("[a-z]{1,8}/[0-9]")),
        0..12,
    )) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let resolver = in_memory_resolver(paris_lookup());

        let mut expected_clients = Vec::new();
        for (with_iri, agent) in &requests {
            let mut request = ResolveRequest::new(REQUEST_URI);
            if *with_iri {
                request = request.with_iri(PARIS);
                expected_clients.push(agent.clone().unwrap_or_else(|| "unknown".to_string()));
            }
            if let Some(agent) = agent {
                request = request.with_user_agent(agent.clone());
            }
            runtime.block_on(resolver.resolve(request)).unwrap();
        }

        let entries: Vec<AuditEntry> = log_entries(&resolver);
        prop_assert_eq!(entries.len(), expected_clients.len());

        let mut seen: Vec<String> = entries.into_iter().map(|e| e.client).collect();
        seen.sort();
        expected_clients.sort();
        prop_assert_eq!(seen, expected_clients);
    }
}
