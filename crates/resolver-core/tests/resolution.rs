//! Functional tests for request resolution.
//!
//! Core guarantees exercised here:
//! - A resolved view is exactly the union of the self-description, the
//!   fetched description and the audit log: nothing lost, nothing doubled.
//! - Requests without an entity describe the service and leave the log alone.
//! - Lookup failures and log write failures degrade the response but never
//!   fail it; only an unreachable store does.
//! - Writes through the view land in the response graph, never in the log.

use oxrdf::{Literal, NamedNode, Subject, Term, Triple};
use pretty_assertions::assert_eq;
use resolver_core::{
    ResolveError, ResolveRequest, ResolverConfig, Warning, DEFAULT_LOG_GRAPH,
};
use resolver_graph::vocab;
use resolver_store::{GraphStore, Principal};
use resolver_test_utils::{
    assert_self_described, flaky_policy_resolver, in_memory_resolver, log_entries, misconfigured_resolver, node,
    paris_is_city, paris_lookup, paris_request, resolver_with_config, self_description,
    unavailable_resolver, FailingLookup, SlowLookup, NOWHERE, PARIS, REQUEST_URI,
};
use std::collections::BTreeSet;
use std::time::Duration;

fn as_strings(triples: &[Triple]) -> BTreeSet<String> {
    triples.iter().map(ToString::to_string).collect()
}

/// Tenet: the Paris example composes exactly the expected union.
#[tokio::test]
async fn paris_resolves_to_description_plus_log() {
    let resolver = in_memory_resolver(paris_lookup());
    resolver.initialize().unwrap();

    // A prior request already in the log.
    resolver.resolve(paris_request()).await.unwrap();
    let prior_log = resolver.audit_log().graph().unwrap().collection().snapshot();
    assert_eq!(prior_log.len(), 4);

    let resolved = resolver.resolve(paris_request()).await.unwrap();
    assert_eq!(resolved.status_code(), 200);
    assert!(resolved.warnings.is_empty());

    let root = node(REQUEST_URI);
    let mut expected = as_strings(&[
        paris_is_city(),
        Triple::new(
            root.clone(),
            vocab::rdf::TYPE.into_owned(),
            vocab::service::RESOURCE_RESOLVER.into_owned(),
        ),
        Triple::new(
            root.clone(),
            vocab::rdfs::COMMENT.into_owned(),
            Literal::new_simple_literal("A Resource Resolver"),
        ),
        Triple::new(root, vocab::service::DESCRIBES.into_owned(), node(PARIS)),
    ]);
    let log_now = resolver.audit_log().graph().unwrap().collection().snapshot();
    assert_eq!(log_now.len(), 8);
    expected.extend(as_strings(&log_now));

    assert_eq!(as_strings(&resolved.view.triples()), expected);
    assert_eq!(resolved.view.len(), 12);

    // The new entry references Paris and carries the client descriptor.
    let entries = log_entries(&resolver);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.entity == node(PARIS)));
    assert!(entries.iter().all(|e| e.client == "test-agent/1.0"));
}

/// Tenet: no identifier means self-description only and no audit entry.
#[tokio::test]
async fn missing_iri_describes_service_without_logging() {
    let resolver = in_memory_resolver(paris_lookup());

    let resolved = resolver
        .resolve(ResolveRequest::new(REQUEST_URI).with_user_agent("browser"))
        .await
        .unwrap();

    assert_eq!(resolved.view.write_target().len(), 2);
    assert_eq!(self_description(&resolved).len(), 2);
    assert_self_described(&resolved, "A Resource Resolver");
    assert!(log_entries(&resolver).is_empty());
    assert_eq!(resolved.template, "ServiceEntry");
}

/// Tenet: logging is independent of lookup success.
#[tokio::test]
async fn unknown_entity_is_still_logged() {
    let resolver = in_memory_resolver(paris_lookup());

    let resolved = resolver
        .resolve(ResolveRequest::new(REQUEST_URI).with_iri(NOWHERE))
        .await
        .unwrap();

    assert_eq!(resolved.status_code(), 200);
    assert!(matches!(
        resolved.warnings.as_slice(),
        [Warning::LookupUnavailable { entity, .. }] if entity == NOWHERE
    ));

    // Self-description including the describes link, nothing else.
    assert_eq!(resolved.view.write_target().len(), 3);

    let entries = log_entries(&resolver);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entity, node(NOWHERE));
    assert_eq!(entries[0].client, "unknown");
}

/// Tenet: a failing lookup service degrades, never fails.
#[tokio::test]
async fn lookup_failure_degrades_response() {
    let resolver = in_memory_resolver(FailingLookup);

    let resolved = resolver.resolve(paris_request()).await.unwrap();

    assert!(resolved.is_degraded());
    assert!(!resolved.view.contains(&paris_is_city()));
    assert_eq!(log_entries(&resolver).len(), 1);
}

/// Tenet: a slow lookup is cut off by the configured timeout.
#[tokio::test(start_paused = true)]
async fn slow_lookup_times_out() {
    let config = ResolverConfig::default().with_lookup_timeout(Duration::from_millis(100));
    let resolver = resolver_with_config(config, SlowLookup::new(Duration::from_secs(60)));

    let resolved = resolver.resolve(paris_request()).await.unwrap();

    assert!(matches!(
        resolved.warnings.as_slice(),
        [Warning::LookupUnavailable { reason, .. }] if reason.contains("timed out")
    ));
    assert!(!resolved.view.contains(&paris_is_city()));
    assert_eq!(log_entries(&resolver).len(), 1);
}

/// Tenet: a lookup within the timeout is used.
#[tokio::test(start_paused = true)]
async fn lookup_within_timeout_is_used() {
    let config = ResolverConfig::default().with_lookup_timeout(Duration::from_secs(5));
    let resolver = resolver_with_config(config, SlowLookup::new(Duration::from_millis(50)));

    let resolved = resolver.resolve(paris_request()).await.unwrap();

    assert!(resolved.warnings.is_empty());
    assert!(resolved.view.contains(&paris_is_city()));
}

/// Tenet: an unreachable store is the only fatal failure.
#[tokio::test]
async fn unavailable_store_is_fatal() {
    let resolver = unavailable_resolver();

    assert!(matches!(
        resolver.initialize(),
        Err(ResolveError::StorageFatal(_))
    ));

    let err = resolver.resolve(paris_request()).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.status_code(), 500);
}

/// Tenet: a rejected log write is surfaced but the description still returns.
#[tokio::test]
async fn log_write_failure_keeps_description() {
    let (resolver, store) = misconfigured_resolver();

    let resolved = resolver.resolve(paris_request()).await.unwrap();

    assert_eq!(resolved.status_code(), 200);
    assert!(resolved.view.contains(&paris_is_city()));
    assert!(matches!(
        resolved.warnings.as_slice(),
        [Warning::LogWriteFailure { entity, .. }] if entity == PARIS
    ));

    let log = store.graph(resolver.audit_log().name()).unwrap().collection();
    assert!(log.is_empty());
}

/// Tenet: reads are idempotent without intervening writes.
#[tokio::test]
async fn repeated_reads_agree() {
    let resolver = in_memory_resolver(paris_lookup());
    let resolved = resolver.resolve(paris_request()).await.unwrap();

    let first = as_strings(&resolved.view.triples());
    let second = as_strings(&resolved.view.triples());
    assert_eq!(first, second);
    assert_eq!(resolved.to_ntriples(), resolved.to_ntriples());
}

/// Tenet: writes through the composed view never reach the log graph.
#[tokio::test]
async fn view_writes_stay_in_response_graph() {
    let resolver = in_memory_resolver(paris_lookup());
    let resolved = resolver.resolve(paris_request()).await.unwrap();
    let log_before = resolver.audit_log().graph().unwrap().collection().len();

    resolved.root_node().add_property(
        vocab::rdfs::COMMENT.into_owned(),
        Literal::new_simple_literal("annotated by presenter"),
    );

    assert_eq!(
        resolver.audit_log().graph().unwrap().collection().len(),
        log_before
    );
    assert_eq!(resolved.view.write_target().len(), 5);
}

/// Tenet: the log is read-protected for general callers.
#[tokio::test]
async fn log_graph_is_read_protected() {
    let resolver = in_memory_resolver(paris_lookup());
    resolver.resolve(paris_request()).await.unwrap();

    let name = resolver.audit_log().name().clone();
    assert_eq!(name.as_str(), DEFAULT_LOG_GRAPH);
    assert!(resolver
        .store()
        .open_for_read(&name, &Principal::anonymous())
        .is_err());
    assert!(resolver.audit_log().entries(&Principal::anonymous()).is_err());

    let auditor =
        Principal::new("auditor").with_permission(resolver.audit_log().read_permission().clone());
    assert_eq!(resolver.audit_log().entries(&auditor).unwrap().len(), 1);
}

/// Tenet: invalid identifiers are client errors and are not logged.
#[tokio::test]
async fn invalid_iri_is_a_client_error() {
    let resolver = in_memory_resolver(paris_lookup());
    let err = resolver
        .resolve(ResolveRequest::new(REQUEST_URI).with_iri("Paris"))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::InvalidIri { .. }));
    assert_eq!(err.status_code(), 400);
    assert!(resolver.store().names().unwrap().is_empty());
}

/// Tenet: the root node describes the requested entity.
#[tokio::test]
async fn root_describes_requested_entity() {
    let resolver = in_memory_resolver(paris_lookup());
    let resolved = resolver.resolve(paris_request()).await.unwrap();

    assert_eq!(
        resolved.root_node().objects(vocab::service::DESCRIBES),
        vec![Term::from(NamedNode::new_unchecked(PARIS))]
    );
    assert_eq!(
        resolved.root_node().subject(),
        &Subject::from(node(REQUEST_URI))
    );
}

/// Tenet: a failed policy install never leaves the log readable.
#[tokio::test]
async fn interrupted_policy_install_is_repaired() {
    let (resolver, store) = flaky_policy_resolver();

    let err = resolver.resolve(paris_request()).await.unwrap_err();
    assert!(err.is_fatal());

    let resolved = resolver.resolve(paris_request()).await.unwrap();
    assert!(resolved.warnings.is_empty());

    let name = resolver.audit_log().name().clone();
    assert!(store.policy(&name).unwrap().is_some());
    assert!(matches!(
        store.open_for_read(&name, &Principal::anonymous()),
        Err(resolver_store::StoreError::AccessDenied { .. })
    ));
    assert_eq!(log_entries(&resolver).len(), 1);
}
