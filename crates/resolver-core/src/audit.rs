//! Append-only audit log
//!
//! Every resolution request that names an entity leaves one [`AuditEntry`]
//! in a persistent, read-protected graph. Entries are appended through the
//! [`AccessGate`], so an anonymous caller triggers the write without ever
//! holding write rights itself. Nothing here removes or rewrites triples.

use crate::error::AuditError;
use chrono::{DateTime, SecondsFormat, Utc};
use oxrdf::{BlankNode, Literal, NamedNode, NamedNodeRef, Subject, Term, Triple};
use resolver_graph::{vocab, GraphName, TripleCollection};
use resolver_store::{
    AccessGate, AccessPolicy, GraphStore, Permission, PermissionAction, Principal, StoredGraph,
};
use std::fmt;
use std::sync::Arc;

/// One logged resolution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Anonymous identifier, fresh per entry
    pub id: BlankNode,
    /// When the request was logged
    pub timestamp: DateTime<Utc>,
    /// Client descriptor or the unknown marker
    pub client: String,
    /// Entity the request asked for
    pub entity: NamedNode,
}

impl AuditEntry {
    /// New entry stamped now, with a fresh blank node
    #[must_use]
    pub fn new(entity: NamedNode, client: impl Into<String>) -> Self {
        Self {
            id: BlankNode::default(),
            timestamp: Utc::now(),
            client: client.into(),
            entity,
        }
    }

    /// The four triples that make up the entry
    #[must_use]
    pub fn to_triples(&self) -> Vec<Triple> {
        let subject = Subject::from(self.id.clone());
        vec![
            Triple::new(
                subject.clone(),
                vocab::rdf::TYPE.into_owned(),
                vocab::service::LOGGED_REQUEST.into_owned(),
            ),
            Triple::new(
                subject.clone(),
                vocab::dc::DATE.into_owned(),
                Literal::new_typed_literal(
                    self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                    vocab::xsd::DATE_TIME.into_owned(),
                ),
            ),
            Triple::new(
                subject.clone(),
                vocab::service::USER_AGENT.into_owned(),
                Literal::new_simple_literal(self.client.clone()),
            ),
            Triple::new(
                subject,
                vocab::service::REQUESTED_ENTITY.into_owned(),
                self.entity.clone(),
            ),
        ]
    }

    /// Every well-formed entry in `collection`, oldest first
    ///
    /// Subjects typed `LoggedRequest` but missing a field are skipped.
    #[must_use]
    pub fn read_all(collection: &TripleCollection) -> Vec<AuditEntry> {
        let mut entries: Vec<AuditEntry> = collection
            .snapshot()
            .into_iter()
            .filter(|t| {
                t.predicate.as_ref() == vocab::rdf::TYPE
                    && t.object == Term::from(vocab::service::LOGGED_REQUEST.into_owned())
            })
            .filter_map(|t| match t.subject {
                Subject::BlankNode(id) => Self::read_one(collection, id),
                _ => None,
            })
            .collect();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        entries
    }

    fn read_one(collection: &TripleCollection, id: BlankNode) -> Option<AuditEntry> {
        let subject = Subject::from(id.clone());

        let date = first_literal(collection, &subject, vocab::dc::DATE)?;
        let timestamp = DateTime::parse_from_rfc3339(date.value())
            .ok()?
            .with_timezone(&Utc);
        let client = first_literal(collection, &subject, vocab::service::USER_AGENT)?
            .value()
            .to_string();
        let entity = match collection
            .objects(&subject, vocab::service::REQUESTED_ENTITY)
            .into_iter()
            .next()?
        {
            Term::NamedNode(n) => n,
            _ => return None,
        };

        Some(AuditEntry {
            id,
            timestamp,
            client,
            entity,
        })
    }
}

fn first_literal(
    collection: &TripleCollection,
    subject: &Subject,
    predicate: NamedNodeRef<'_>,
) -> Option<Literal> {
    match collection.objects(subject, predicate).into_iter().next() {
        Some(Term::Literal(l)) => Some(l),
        _ => None,
    }
}

/// The persistent audit log graph
///
/// Holds the gate; request handlers hold the log, never the credential.
pub struct AuditLog {
    name: GraphName,
    store: Arc<dyn GraphStore>,
    gate: Arc<AccessGate>,
    read_permission: Permission,
    unknown_client_marker: String,
}

impl AuditLog {
    /// Log stored under `name` in `store`, written through `gate`
    #[must_use]
    pub fn new(
        name: GraphName,
        store: Arc<dyn GraphStore>,
        gate: Arc<AccessGate>,
        read_permission_namespace: impl Into<String>,
        unknown_client_marker: impl Into<String>,
    ) -> Self {
        let read_permission =
            Permission::new(read_permission_namespace, name.clone(), PermissionAction::Read);
        Self {
            name,
            store,
            gate,
            read_permission,
            unknown_client_marker: unknown_client_marker.into(),
        }
    }

    /// Log graph name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &GraphName {
        &self.name
    }

    /// Permission a principal needs to read the log
    #[inline]
    #[must_use]
    pub fn read_permission(&self) -> &Permission {
        &self.read_permission
    }

    /// Obtain the log graph, creating it on first use
    ///
    /// The graph is created together with its read policy. A log graph found
    /// without a policy, left behind by an earlier failed install, gets the
    /// policy reinstalled before it is handed out.
    ///
    /// # Errors
    /// [`AuditError::Graph`] if the store fails, [`AuditError::Policy`] if
    /// the policy could not be installed.
    pub fn graph(&self) -> Result<StoredGraph, AuditError> {
        let policy = AccessPolicy::new(self.name.clone(), self.read_permission.clone());
        let acquired = self
            .store
            .get_or_create_with_policy(&self.name, policy.clone())
            .map_err(AuditError::Graph)?;

        if !acquired.created && self.store.policy(&self.name).map_err(AuditError::Policy)?.is_none() {
            tracing::warn!(graph = %self.name, "log graph has no policy, reinstalling");
            if let Err(e) = self.store.install_policy(policy) {
                tracing::error!(graph = %self.name, error = %e, "log graph left without policy");
                return Err(AuditError::Policy(e));
            }
        }
        Ok(acquired.graph)
    }

    /// Append one entry for `entity`
    ///
    /// A missing `client` is recorded as the unknown marker so every entry
    /// has the same shape.
    ///
    /// # Errors
    /// [`AuditError::Graph`] / [`AuditError::Policy`] as for [`Self::graph`],
    /// [`AuditError::Append`] if the privileged write is refused.
    pub fn append(&self, entity: &NamedNode, client: Option<&str>) -> Result<AuditEntry, AuditError> {
        let graph = self.graph()?;
        let client = client.unwrap_or(self.unknown_client_marker.as_str());
        let entry = AuditEntry::new(entity.clone(), client);
        let triples = entry.to_triples();

        self.gate
            .run_privileged(&self.name, |scope| scope.append(&graph, &triples))
            .map_err(AuditError::Append)?;

        tracing::info!(graph = %self.name, entity = %entity, client, "request logged");
        Ok(entry)
    }

    /// Entries visible to `principal`
    ///
    /// # Errors
    /// [`AuditError::Read`] if the principal lacks the read permission.
    pub fn entries(&self, principal: &Principal) -> Result<Vec<AuditEntry>, AuditError> {
        self.graph()?;
        let collection = self
            .store
            .open_for_read(&self.name, principal)
            .map_err(AuditError::Read)?;
        Ok(AuditEntry::read_all(&collection))
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("name", &self.name)
            .field("store", &self.store)
            .field("read_permission", &self.read_permission)
            .finish_non_exhaustive()
    }
}
