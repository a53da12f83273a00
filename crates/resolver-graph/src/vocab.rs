//! Vocabulary used by the resolver
//!
//! The `service` namespace holds the terms the resolver itself defines; the
//! other modules re-export the standard terms it relies on.

/// Terms of the resolver's own ontology
pub mod service {
    use oxrdf::NamedNodeRef;

    /// Namespace IRI
    pub const NAMESPACE: &str = "http://stanbol.apache.org/example/ontology#";

    /// Class of the resolver service node
    pub const RESOURCE_RESOLVER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://stanbol.apache.org/example/ontology#ResourceResolver");

    /// Class of audit entries
    pub const LOGGED_REQUEST: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://stanbol.apache.org/example/ontology#LoggedRequest");

    /// Links the service node to the entity it describes
    pub const DESCRIBES: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://stanbol.apache.org/example/ontology#describes");

    /// Client descriptor of a logged request
    pub const USER_AGENT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://stanbol.apache.org/example/ontology#userAgent");

    /// Entity a logged request asked for
    pub const REQUESTED_ENTITY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://stanbol.apache.org/example/ontology#requestedEntity");
}

/// Dublin Core elements
pub mod dc {
    use oxrdf::NamedNodeRef;

    /// `dc:date`
    pub const DATE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/elements/1.1/date");
}

pub use oxrdf::vocab::{rdf, rdfs, xsd};
