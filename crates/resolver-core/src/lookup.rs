//! Entity lookup collaborator
//!
//! The resolver does not resolve entities itself. It asks an
//! [`EntityLookup`] for a description and treats every failure, timeout or
//! absence the same way: no description available.

use crate::error::LookupError;
use async_trait::async_trait;
use oxrdf::{Literal, NamedNode, Subject, Term, Triple};
use serde::Deserialize;
use std::collections::HashMap;

/// Description of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    /// Triples describing the entity itself
    pub representation: Option<Vec<Triple>>,
    /// Triples about the description (provenance, site, ...)
    pub metadata: Option<Vec<Triple>>,
}

impl Entity {
    /// Entity with neither representation nor metadata
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With representation triples
    #[inline]
    #[must_use]
    pub fn with_representation(mut self, triples: Vec<Triple>) -> Self {
        self.representation = Some(triples);
        self
    }

    /// With metadata triples
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, triples: Vec<Triple>) -> Self {
        self.metadata = Some(triples);
        self
    }

    /// Representation followed by metadata
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.representation
            .iter()
            .chain(self.metadata.iter())
            .flatten()
    }
}

/// Resolves an entity identifier to its description
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityLookup: Send + Sync {
    /// Fetch the entity, or `None` if the service does not know it
    async fn get_entity(&self, iri: &NamedNode) -> Result<Option<Entity>, LookupError>;
}

/// Lookup answering from a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticEntityLookup {
    entities: HashMap<NamedNode, Entity>,
}

impl StaticEntityLookup {
    /// Empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With one entity
    #[must_use]
    pub fn with_entity(mut self, iri: NamedNode, entity: Entity) -> Self {
        self.entities.insert(iri, entity);
        self
    }

    /// Number of known entities
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Load a table from JSON fixtures
    ///
    /// The document maps entity IRIs to `representation` / `metadata` arrays
    /// of `[subject, predicate, object]` triples. Subjects and predicates are
    /// IRIs; an object is either an IRI string or
    /// `{"literal": "...", "datatype": "...", "language": "..."}`.
    ///
    /// ```json
    /// {
    ///   "http://example.org/Paris": {
    ///     "representation": [
    ///       ["http://example.org/Paris",
    ///        "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
    ///        "http://example.org/City"]
    ///     ]
    ///   }
    /// }
    /// ```
    ///
    /// # Errors
    /// [`LookupError::Failed`] on malformed JSON or invalid IRIs.
    pub fn from_json(source: &str) -> Result<Self, LookupError> {
        let fixtures: HashMap<String, EntityFixture> = serde_json::from_str(source)
            .map_err(|e| LookupError::Failed(format!("invalid fixtures: {e}")))?;

        let mut lookup = Self::new();
        for (iri, fixture) in fixtures {
            let entity = Entity {
                representation: fixture.representation.map(convert_triples).transpose()?,
                metadata: fixture.metadata.map(convert_triples).transpose()?,
            };
            lookup.entities.insert(named_node(&iri)?, entity);
        }
        Ok(lookup)
    }
}

#[async_trait]
impl EntityLookup for StaticEntityLookup {
    async fn get_entity(&self, iri: &NamedNode) -> Result<Option<Entity>, LookupError> {
        Ok(self.entities.get(iri).cloned())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityFixture {
    #[serde(default)]
    representation: Option<Vec<(String, String, ObjectFixture)>>,
    #[serde(default)]
    metadata: Option<Vec<(String, String, ObjectFixture)>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObjectFixture {
    Iri(String),
    Literal {
        literal: String,
        #[serde(default)]
        datatype: Option<String>,
        #[serde(default)]
        language: Option<String>,
    },
}

fn named_node(iri: &str) -> Result<NamedNode, LookupError> {
    NamedNode::new(iri).map_err(|e| LookupError::Failed(format!("invalid IRI {iri:?}: {e}")))
}

fn convert_triples(rows: Vec<(String, String, ObjectFixture)>) -> Result<Vec<Triple>, LookupError> {
    rows.into_iter()
        .map(|(s, p, o)| {
            let subject = Subject::from(named_node(&s)?);
            let predicate = named_node(&p)?;
            let object = match o {
                ObjectFixture::Iri(iri) => Term::from(named_node(&iri)?),
                ObjectFixture::Literal {
                    literal,
                    datatype: Some(datatype),
                    ..
                } => Term::from(Literal::new_typed_literal(literal, named_node(&datatype)?)),
                ObjectFixture::Literal {
                    literal,
                    language: Some(language),
                    datatype: None,
                } => Term::from(
                    Literal::new_language_tagged_literal(literal, language)
                        .map_err(|e| LookupError::Failed(format!("invalid language tag: {e}")))?,
                ),
                ObjectFixture::Literal { literal, .. } => {
                    Term::from(Literal::new_simple_literal(literal))
                }
            };
            Ok(Triple::new(subject, predicate, object))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_graph::vocab;

    fn paris() -> NamedNode {
        NamedNode::new_unchecked("http://example.org/Paris")
    }

    #[tokio::test]
    async fn static_lookup_answers_known_entities() {
        let city = Triple::new(
            paris(),
            vocab::rdf::TYPE.into_owned(),
            NamedNode::new_unchecked("http://example.org/City"),
        );
        let lookup = StaticEntityLookup::new()
            .with_entity(paris(), Entity::new().with_representation(vec![city.clone()]));

        let found = lookup.get_entity(&paris()).await.unwrap().unwrap();
        assert_eq!(found.triples().collect::<Vec<_>>(), vec![&city]);

        let missing = NamedNode::new_unchecked("http://example.org/Nowhere");
        assert!(lookup.get_entity(&missing).await.unwrap().is_none());
    }

    #[test]
    fn triples_chain_representation_and_metadata() {
        let a = Triple::new(paris(), vocab::rdf::TYPE.into_owned(), paris());
        let b = Triple::new(
            paris(),
            vocab::rdfs::COMMENT.into_owned(),
            Literal::new_simple_literal("cached"),
        );
        let entity = Entity::new()
            .with_representation(vec![a.clone()])
            .with_metadata(vec![b.clone()]);
        assert_eq!(entity.triples().cloned().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(Entity::new().triples().count(), 0);
    }

    #[test]
    fn fixtures_parse_iris_and_literals() {
        let lookup = StaticEntityLookup::from_json(
            r#"{
                "http://example.org/Paris": {
                    "representation": [
                        ["http://example.org/Paris",
                         "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
                         "http://example.org/City"],
                        ["http://example.org/Paris",
                         "http://www.w3.org/2000/01/rdf-schema#label",
                         {"literal": "Paris", "language": "fr"}]
                    ],
                    "metadata": [
                        ["http://example.org/Paris",
                         "http://example.org/population",
                         {"literal": "2102650", "datatype": "http://www.w3.org/2001/XMLSchema#integer"}]
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(lookup.len(), 1);
        let entity = lookup.entities.get(&paris()).unwrap();
        assert_eq!(entity.representation.as_ref().unwrap().len(), 2);
        assert_eq!(entity.metadata.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn fixtures_reject_bad_iris() {
        let err = StaticEntityLookup::from_json(r#"{"not an iri": {}}"#).unwrap_err();
        assert!(matches!(err, LookupError::Failed(_)));
    }

    #[tokio::test]
    async fn mock_lookup_can_fail() {
        let mut mock = MockEntityLookup::new();
        mock.expect_get_entity()
            .times(1)
            .returning(|_| Err(LookupError::Failed("service down".into())));

        let result = mock.get_entity(&paris()).await;
        assert_eq!(result, Err(LookupError::Failed("service down".into())));
    }
}
