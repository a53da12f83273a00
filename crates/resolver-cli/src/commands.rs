//! Subcommand implementations
//!
//! Each command returns its stdout text so it can be tested without a
//! process boundary.

use anyhow::Context;
use resolver_core::{
    ResolveRequest, ResolvedView, ResolverConfig, ResourceResolver, StaticEntityLookup,
};
use resolver_store::Principal;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Request URI used when none is given
pub(crate) const DEFAULT_REQUEST_URI: &str = "http://localhost/example-service";

/// Build an in-memory resolver answering from `fixtures`
pub(crate) fn build_resolver(
    config: ResolverConfig,
    fixtures: Option<&Path>,
) -> anyhow::Result<ResourceResolver> {
    let lookup = match fixtures {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading fixtures {}", path.display()))?;
            let lookup = StaticEntityLookup::from_json(&source)
                .with_context(|| format!("parsing fixtures {}", path.display()))?;
            tracing::info!(entities = lookup.len(), path = %path.display(), "fixtures loaded");
            lookup
        }
        None => StaticEntityLookup::new(),
    };

    let resolver = ResourceResolver::in_memory(config, Arc::new(lookup))?;
    resolver.initialize()?;
    Ok(resolver)
}

/// Resolve one request and render it
pub(crate) async fn resolve(
    resolver: &ResourceResolver,
    request: ResolveRequest,
    json: bool,
) -> anyhow::Result<String> {
    let resolved = resolver.resolve(request).await?;
    for warning in &resolved.warnings {
        tracing::warn!(%warning, "degraded response");
    }

    if json {
        Ok(serde_json::to_string_pretty(&render_json(&resolved))?)
    } else {
        Ok(resolved.to_ntriples())
    }
}

fn render_json(resolved: &ResolvedView) -> serde_json::Value {
    let triples: Vec<String> = resolved.to_ntriples().lines().map(str::to_owned).collect();
    serde_json::json!({
        "request_id": resolved.request_id,
        "status": resolved.status_code(),
        "template": resolved.template,
        "root": resolved.root.as_str(),
        "warnings": resolved.warnings,
        "triples": triples,
    })
}

/// Outcome of a stress run
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StressReport {
    pub(crate) requests: usize,
    pub(crate) succeeded: usize,
    pub(crate) degraded: usize,
    pub(crate) logged: usize,
    pub(crate) elapsed: Duration,
}

impl StressReport {
    pub(crate) fn passed(&self) -> bool {
        self.succeeded == self.requests && self.logged == self.requests
    }
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stress Test Report:")?;
        writeln!(f, "  Requests: {}", self.requests)?;
        writeln!(f, "  Succeeded: {}", self.succeeded)?;
        writeln!(f, "  Degraded: {}", self.degraded)?;
        writeln!(f, "  Audit entries: {}", self.logged)?;
        writeln!(f, "  Elapsed: {:?}", self.elapsed)?;
        write!(f, "  Success: {}", self.passed())
    }
}

/// Run `count` concurrent resolutions of `iri` and check the audit count
pub(crate) async fn stress(
    resolver: &ResourceResolver,
    iri: &str,
    count: usize,
) -> anyhow::Result<StressReport> {
    let auditor = auditor(resolver);
    let before = resolver.audit_log().entries(&auditor)?.len();
    let started = Instant::now();

    let tasks: Vec<_> = (0..count)
        .map(|i| {
            let resolver = resolver.clone();
            let request = ResolveRequest::new(DEFAULT_REQUEST_URI)
                .with_iri(iri)
                .with_user_agent(format!("stress/{i}"));
            tokio::spawn(async move { resolver.resolve(request).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut degraded = 0;
    for joined in futures::future::join_all(tasks).await {
        match joined? {
            Ok(resolved) => {
                succeeded += 1;
                if resolved.is_degraded() {
                    degraded += 1;
                }
            }
            Err(e) => tracing::error!(error = %e, "resolution failed"),
        }
    }

    let logged = resolver.audit_log().entries(&auditor)?.len() - before;
    Ok(StressReport {
        requests: count,
        succeeded,
        degraded,
        logged,
        elapsed: started.elapsed(),
    })
}

/// Resolve each of `iris`, then dump the log graph as N-Triples
pub(crate) async fn dump_log(resolver: &ResourceResolver, iris: &[String]) -> anyhow::Result<String> {
    for iri in iris {
        let request = ResolveRequest::new(DEFAULT_REQUEST_URI)
            .with_iri(iri.as_str())
            .with_user_agent("resource-resolver-cli");
        resolver.resolve(request).await?;
    }

    let auditor = auditor(resolver);
    let collection = resolver
        .store()
        .open_for_read(resolver.audit_log().name(), &auditor)?;
    let mut lines: Vec<String> = collection
        .snapshot()
        .iter()
        .map(|t| format!("{t} ."))
        .collect();
    lines.sort();
    Ok(lines.into_iter().map(|l| l + "\n").collect())
}

fn auditor(resolver: &ResourceResolver) -> Principal {
    Principal::new("resource-resolver-cli")
        .with_permission(resolver.audit_log().read_permission().clone())
}
