//! Resolver Core
//!
//! Resolves an entity identifier against an external lookup, records the
//! request in an access-controlled audit log and returns one union view over
//! the request-scoped description and the log.
//!
//! # Core Concepts
//!
//! - [`ResourceResolver`]: shared service, one session per request
//! - [`ResolutionSession`]: `Created → DescriptionFetched → Logged → Composed`
//! - [`AuditLog`]: append-only log graph written through an [`AccessGate`](resolver_store::AccessGate)
//! - [`EntityLookup`]: the external description source
//!
//! # Example
//!
//! ```rust
//! use resolver_core::{ResolveRequest, ResolverConfig, ResourceResolver, StaticEntityLookup};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = ResourceResolver::in_memory(
//!     ResolverConfig::default(),
//!     Arc::new(StaticEntityLookup::new()),
//! )?;
//! resolver.initialize()?;
//!
//! let request = ResolveRequest::new("http://localhost/example-service")
//!     .with_iri("http://example.org/Paris")
//!     .with_user_agent("curl/8.0");
//! let resolved = resolver.resolve(request).await?;
//!
//! assert_eq!(resolved.status_code(), 200);
//! println!("{}", resolved.to_ntriples());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod audit;
pub mod config;
pub mod error;
pub mod lookup;
pub mod response;
pub mod service;
pub mod session;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use audit::{AuditEntry, AuditLog};
pub use config::{ResolverConfig, DEFAULT_LOG_GRAPH};
pub use error::{AuditError, ConfigError, LookupError, ResolveError, SessionError};
pub use lookup::{Entity, EntityLookup, StaticEntityLookup};
pub use response::{ResolvedView, Warning, SERVICE_ENTRY_TEMPLATE};
pub use service::ResourceResolver;
pub use session::ResolutionSession;
pub use state::{validate_transition, SessionState};
pub use types::{RequestId, ResolveRequest};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the resolver
    pub use crate::{
        AuditEntry, Entity, EntityLookup, ResolveError, ResolveRequest, ResolvedView,
        ResolverConfig, ResourceResolver, Warning,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
