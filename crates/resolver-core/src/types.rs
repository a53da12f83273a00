//! Request types

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub Ulid);

impl RequestId {
    /// Generate new request ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound resolution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// The request's own URI; becomes the root node of the response
    pub request_uri: String,
    /// Entity to resolve; `None` asks the service to describe itself
    pub iri: Option<String>,
    /// Client descriptor, typically the `User-Agent` header
    pub user_agent: Option<String>,
}

impl ResolveRequest {
    /// Self-description request addressed to `request_uri`
    #[inline]
    #[must_use]
    pub fn new(request_uri: impl Into<String>) -> Self {
        Self {
            request_uri: request_uri.into(),
            iri: None,
            user_agent: None,
        }
    }

    /// With entity to resolve
    #[inline]
    #[must_use]
    pub fn with_iri(mut self, iri: impl Into<String>) -> Self {
        self.iri = Some(iri.into());
        self
    }

    /// With client descriptor
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
