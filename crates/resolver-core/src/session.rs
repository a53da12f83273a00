//! Resolution session
//!
//! One session per request. It owns a fresh transient collection, fills it
//! from the entity lookup, asks the audit log to record the request and
//! finally composes the transient collection with the log graph.
//!
//! ```text
//! Created ──(iri)──▶ DescriptionFetched ──▶ Logged ──▶ Composed
//!    │                        │                          ▲
//!    └──────(no iri)──────────┼──────────────────────────┤
//!                             └──(log write failed)──────┘
//! ```

use crate::audit::{AuditEntry, AuditLog};
use crate::error::{LookupError, SessionError};
use crate::lookup::EntityLookup;
use crate::response::{ResolvedView, Warning, SERVICE_ENTRY_TEMPLATE};
use crate::state::{validate_transition, SessionState};
use crate::types::RequestId;
use oxrdf::{Literal, NamedNode};
use resolver_graph::{vocab, CollectionWriter, TripleCollection, UnionView};
use std::time::Duration;

/// State of one resolution request
#[derive(Debug)]
pub struct ResolutionSession {
    id: RequestId,
    state: SessionState,
    root: NamedNode,
    entity: Option<NamedNode>,
    user_agent: Option<String>,
    transient: CollectionWriter,
    warnings: Vec<Warning>,
}

impl ResolutionSession {
    /// Session in `Created` state with an empty transient collection
    #[must_use]
    pub fn new(root: NamedNode, entity: Option<NamedNode>, user_agent: Option<String>) -> Self {
        Self {
            id: RequestId::new(),
            state: SessionState::Created,
            root,
            entity,
            user_agent,
            transient: CollectionWriter::new(),
            warnings: Vec::new(),
        }
    }

    /// Request identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Requested entity, if any
    #[inline]
    #[must_use]
    pub fn entity(&self) -> Option<&NamedNode> {
        self.entity.as_ref()
    }

    /// Read handle onto the transient collection
    #[inline]
    #[must_use]
    pub fn transient(&self) -> TripleCollection {
        self.transient.collection()
    }

    /// Warnings collected so far
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Fetch the entity description into the transient collection
    ///
    /// Failure, absence and timeout are recorded as a warning and leave the
    /// collection empty; the session still advances. Returns the number of
    /// triples added.
    ///
    /// # Errors
    /// [`SessionError::IllegalTransition`] if not in `Created` or if the
    /// request named no entity.
    pub async fn fetch_description(
        &mut self,
        lookup: &dyn EntityLookup,
        timeout: Duration,
    ) -> Result<usize, SessionError> {
        validate_transition(self.state, SessionState::DescriptionFetched)?;
        let Some(entity) = self.entity.clone() else {
            return Err(SessionError::IllegalTransition {
                from: self.state,
                to: SessionState::DescriptionFetched,
            });
        };

        let outcome = match tokio::time::timeout(timeout, lookup.get_entity(&entity)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::TimedOut {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        let added = match outcome {
            Ok(Some(found)) => self.transient.extend(found.triples()),
            Ok(None) => {
                self.lookup_unavailable(&entity, "entity not known to lookup service".into());
                0
            }
            Err(e) => {
                self.lookup_unavailable(&entity, e.to_string());
                0
            }
        };
        tracing::debug!(request_id = %self.id, entity = %entity, added, "description fetched");

        self.state = SessionState::DescriptionFetched;
        Ok(added)
    }

    /// Record the request in the audit log
    ///
    /// On failure the session stays in `DescriptionFetched` with a
    /// [`Warning::LogWriteFailure`] and `None` is returned.
    ///
    /// # Errors
    /// [`SessionError::IllegalTransition`] if the description was not fetched.
    pub fn log(&mut self, audit: &AuditLog) -> Result<Option<AuditEntry>, SessionError> {
        validate_transition(self.state, SessionState::Logged)?;
        let Some(entity) = self.entity.as_ref() else {
            return Err(SessionError::IllegalTransition {
                from: self.state,
                to: SessionState::Logged,
            });
        };

        match audit.append(entity, self.user_agent.as_deref()) {
            Ok(entry) => {
                self.state = SessionState::Logged;
                Ok(Some(entry))
            }
            Err(e) => {
                tracing::warn!(request_id = %self.id, entity = %entity, error = %e, "audit append failed");
                self.warnings.push(Warning::LogWriteFailure {
                    entity: entity.as_str().to_string(),
                    reason: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Compose the response view over the transient collection and `log_graph`
    ///
    /// Self-description triples are written to the transient collection
    /// through the view's root node.
    ///
    /// # Errors
    /// [`SessionError::IllegalTransition`] if already composed.
    pub fn compose(
        mut self,
        log_graph: TripleCollection,
        service_comment: &str,
    ) -> Result<ResolvedView, SessionError> {
        validate_transition(self.state, SessionState::Composed)?;
        self.state = SessionState::Composed;

        let view = UnionView::compose(self.transient, [log_graph]);
        {
            let node = view.node(self.root.clone());
            node.add_property(
                vocab::rdf::TYPE.into_owned(),
                vocab::service::RESOURCE_RESOLVER.into_owned(),
            );
            node.add_property(
                vocab::rdfs::COMMENT.into_owned(),
                Literal::new_simple_literal(service_comment),
            );
            if let Some(entity) = &self.entity {
                node.add_property(vocab::service::DESCRIBES.into_owned(), entity.clone());
            }
        }

        Ok(ResolvedView {
            request_id: self.id,
            root: self.root,
            template: SERVICE_ENTRY_TEMPLATE,
            view,
            warnings: self.warnings,
        })
    }

    fn lookup_unavailable(&mut self, entity: &NamedNode, reason: String) {
        tracing::warn!(request_id = %self.id, entity = %entity, reason = %reason, "lookup unavailable");
        self.warnings.push(Warning::LookupUnavailable {
            entity: entity.as_str().to_string(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{Entity, MockEntityLookup};
    use oxrdf::Triple;
    use resolver_graph::GraphName;
    use resolver_store::{AccessGate, InMemoryGraphStore};
    use std::sync::Arc;

    fn root() -> NamedNode {
        NamedNode::new_unchecked("http://localhost/example-service")
    }

    fn paris() -> NamedNode {
        NamedNode::new_unchecked("http://example.org/Paris")
    }

    fn paris_is_city() -> Triple {
        Triple::new(
            paris(),
            vocab::rdf::TYPE.into_owned(),
            NamedNode::new_unchecked("http://example.org/City"),
        )
    }

    fn audit_log() -> AuditLog {
        let gate = Arc::new(AccessGate::generate(Duration::from_secs(30)));
        let store = Arc::new(InMemoryGraphStore::new(gate.verifying_key()));
        AuditLog::new(
            GraphName::new("http://example.org/resource-resolver-log.graph").unwrap(),
            store,
            gate,
            "content-graph",
            "unknown",
        )
    }

    fn paris_lookup() -> MockEntityLookup {
        let mut lookup = MockEntityLookup::new();
        lookup
            .expect_get_entity()
            .withf(|iri| iri.as_str() == "http://example.org/Paris")
            .times(1)
            .returning(|_| Ok(Some(Entity::new().with_representation(vec![paris_is_city()]))));
        lookup
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let log = audit_log();
        let mut session = ResolutionSession::new(root(), Some(paris()), Some("curl/8.0".into()));
        assert_eq!(session.state(), SessionState::Created);

        let added = session
            .fetch_description(&paris_lookup(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(session.state(), SessionState::DescriptionFetched);

        let entry = session.log(&log).unwrap().unwrap();
        assert_eq!(entry.entity, paris());
        assert_eq!(session.state(), SessionState::Logged);

        let resolved = session
            .compose(log.graph().unwrap().collection(), "A Resource Resolver")
            .unwrap();
        assert!(resolved.view.contains(&paris_is_city()));
        assert_eq!(resolved.view.write_target().len(), 4);
        assert_eq!(resolved.view.len(), 8);
        assert!(!resolved.is_degraded());
        assert_eq!(resolved.template, "ServiceEntry");
    }

    #[tokio::test]
    async fn lookup_error_becomes_warning() {
        let mut lookup = MockEntityLookup::new();
        lookup
            .expect_get_entity()
            .returning(|_| Err(LookupError::Failed("connection refused".into())));

        let mut session = ResolutionSession::new(root(), Some(paris()), None);
        let added = session
            .fetch_description(&lookup, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(added, 0);
        assert_eq!(session.state(), SessionState::DescriptionFetched);
        assert!(matches!(
            session.warnings(),
            [Warning::LookupUnavailable { reason, .. }] if reason.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn cannot_fetch_without_entity() {
        let lookup = MockEntityLookup::new();
        let mut session = ResolutionSession::new(root(), None, None);
        let err = session
            .fetch_description(&lookup, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::IllegalTransition { .. }));
        assert_eq!(session.state(), SessionState::Created);
    }

    #[test]
    fn cannot_log_before_fetch() {
        let log = audit_log();
        let mut session = ResolutionSession::new(root(), Some(paris()), None);
        assert!(session.log(&log).is_err());
        assert!(log.graph().unwrap().collection().is_empty());
    }

    #[test]
    fn self_description_without_entity() {
        let log = audit_log();
        let session = ResolutionSession::new(root(), None, None);
        let resolved = session
            .compose(log.graph().unwrap().collection(), "A Resource Resolver")
            .unwrap();

        assert_eq!(resolved.view.write_target().len(), 2);
        assert!(resolved
            .root_node()
            .objects(vocab::service::DESCRIBES)
            .is_empty());
    }
}
