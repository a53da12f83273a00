//! The resource resolver service
//!
//! [`ResourceResolver`] is shared across request handlers (clones are cheap)
//! and runs one [`ResolutionSession`] per request. Handlers see only the
//! resolver; the signing credential stays inside the audit log's gate.

use crate::audit::AuditLog;
use crate::config::ResolverConfig;
use crate::error::{ConfigError, ResolveError};
use crate::lookup::EntityLookup;
use crate::response::ResolvedView;
use crate::session::ResolutionSession;
use crate::types::ResolveRequest;
use oxrdf::NamedNode;
use resolver_store::{AccessGate, GraphStore, InMemoryGraphStore};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Resolves entity identifiers into composed graph views
#[derive(Clone)]
pub struct ResourceResolver {
    inner: Arc<Inner>,
}

struct Inner {
    config: ResolverConfig,
    store: Arc<dyn GraphStore>,
    audit: AuditLog,
    lookup: Arc<dyn EntityLookup>,
}

impl ResourceResolver {
    /// Resolver over `store`, logging through `gate`
    ///
    /// `store` must trust `gate`'s verifying key, otherwise every audit
    /// append is rejected and surfaces as a log write warning.
    ///
    /// # Errors
    /// [`ConfigError`] if the configuration is invalid.
    pub fn new(
        config: ResolverConfig,
        store: Arc<dyn GraphStore>,
        gate: AccessGate,
        lookup: Arc<dyn EntityLookup>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let audit = AuditLog::new(
            config.log_graph()?,
            Arc::clone(&store),
            Arc::new(gate),
            config.read_permission_namespace.clone(),
            config.unknown_client_marker.clone(),
        );
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                store,
                audit,
                lookup,
            }),
        })
    }

    /// Resolver over a fresh in-memory store with a generated key
    ///
    /// # Errors
    /// [`ConfigError`] if the configuration is invalid.
    pub fn in_memory(
        config: ResolverConfig,
        lookup: Arc<dyn EntityLookup>,
    ) -> Result<Self, ConfigError> {
        let gate = AccessGate::generate(config.token_ttl());
        let store = Arc::new(InMemoryGraphStore::new(gate.verifying_key()));
        Self::new(config, store, gate, lookup)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.inner.config
    }

    /// Backing graph store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.inner.store
    }

    /// The audit log
    #[inline]
    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.inner.audit
    }

    /// Create the log graph eagerly
    ///
    /// Safe to call any number of times, from any number of tasks; the read
    /// policy is installed once, by whichever call created the graph.
    ///
    /// # Errors
    /// [`ResolveError::StorageFatal`] if the store cannot provide the graph.
    pub fn initialize(&self) -> Result<(), ResolveError> {
        let graph = self.inner.audit.graph()?;
        tracing::info!(graph = %graph.name(), "resolver initialized");
        Ok(())
    }

    /// Resolve one request
    ///
    /// Lookup failures and log write failures degrade the result (see
    /// [`ResolvedView::warnings`]); they never fail it.
    ///
    /// # Errors
    /// [`ResolveError::InvalidIri`] for a malformed request URI or entity IRI,
    /// [`ResolveError::StorageFatal`] if the log graph cannot be obtained.
    pub async fn resolve(&self, request: ResolveRequest) -> Result<ResolvedView, ResolveError> {
        let root = parse_iri(&request.request_uri)?;
        let entity = request.iri.as_deref().map(parse_iri).transpose()?;

        let log_graph = self.inner.audit.graph()?;
        let mut session = ResolutionSession::new(root, entity, request.user_agent);

        let span = tracing::info_span!(
            "resolve",
            request_id = %session.id(),
            entity = session.entity().map(NamedNode::as_str),
        );

        async move {
            if session.entity().is_some() {
                session
                    .fetch_description(self.inner.lookup.as_ref(), self.inner.config.lookup_timeout())
                    .await?;
                session.log(&self.inner.audit)?;
            }

            let resolved = session.compose(log_graph.collection(), &self.inner.config.service_comment)?;
            tracing::info!(
                response_triples = resolved.view.write_target().len(),
                warnings = resolved.warnings.len(),
                "resolved"
            );
            Ok::<_, ResolveError>(resolved)
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for ResourceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceResolver")
            .field("config", &self.inner.config)
            .field("audit", &self.inner.audit)
            .finish_non_exhaustive()
    }
}

fn parse_iri(iri: &str) -> Result<NamedNode, ResolveError> {
    NamedNode::new(iri).map_err(|e| ResolveError::InvalidIri {
        iri: iri.to_string(),
        reason: e.to_string(),
    })
}
