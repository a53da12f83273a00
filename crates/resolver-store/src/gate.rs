//! Privileged execution
//!
//! The [`AccessGate`] is the only holder of the signing key. Code that must
//! append to a protected graph runs inside [`AccessGate::run_privileged`],
//! which mints a short-lived capability for exactly one graph and hands the
//! action a [`PrivilegedScope`]. The scope never exposes the token, so the
//! grant cannot outlive the call. The elevation is released on every exit
//! path, including panics.

use crate::error::StoreError;
use crate::store::StoredGraph;
use crate::token::{now_secs, CapabilityToken, Operation};
use ed25519_dalek::{SigningKey, VerifyingKey};
use oxrdf::Triple;
use rand::rngs::OsRng;
use resolver_graph::GraphName;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Issues scoped write capabilities
pub struct AccessGate {
    signing_key: SigningKey,
    token_ttl: Duration,
    elevations: AtomicUsize,
}

impl AccessGate {
    /// Gate signing with `signing_key`; a zero `token_ttl` mints non-expiring tokens
    #[must_use]
    pub fn new(signing_key: SigningKey, token_ttl: Duration) -> Self {
        Self {
            signing_key,
            token_ttl,
            elevations: AtomicUsize::new(0),
        }
    }

    /// Gate with a freshly generated key
    #[must_use]
    pub fn generate(token_ttl: Duration) -> Self {
        let mut csprng = OsRng;
        Self::new(SigningKey::generate(&mut csprng), token_ttl)
    }

    /// Key stores must trust to accept this gate's capabilities
    #[inline]
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Number of privileged scopes currently open
    #[inline]
    #[must_use]
    pub fn active_elevations(&self) -> usize {
        self.elevations.load(Ordering::SeqCst)
    }

    /// Run `action` with append rights on `graph`
    ///
    /// Whatever `action` returns is passed through unchanged; an `Err`
    /// returned by it is not swallowed. The elevation ends when this
    /// function returns or unwinds.
    pub fn run_privileged<T>(
        &self,
        graph: &GraphName,
        action: impl FnOnce(&PrivilegedScope<'_>) -> T,
    ) -> T {
        let _elevation = Elevation::enter(&self.elevations);

        let expires_at = if self.token_ttl.is_zero() {
            0
        } else {
            now_secs().saturating_add(self.token_ttl.as_secs().max(1))
        };
        let token = CapabilityToken::sign(graph.clone(), Operation::Append, &self.signing_key, expires_at);
        tracing::debug!(graph = %graph, token = %token.token_id, "privileged scope entered");

        let scope = PrivilegedScope { token: &token };
        action(&scope)
    }
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("token_ttl", &self.token_ttl)
            .field("active_elevations", &self.active_elevations())
            .finish_non_exhaustive()
    }
}

/// Capability available only inside [`AccessGate::run_privileged`]
pub struct PrivilegedScope<'a> {
    token: &'a CapabilityToken,
}

impl PrivilegedScope<'_> {
    /// Graph this scope may write
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &GraphName {
        &self.token.graph
    }

    /// Append to `target` under this scope's capability
    ///
    /// # Errors
    /// [`StoreError::WriteRejected`] if `target` is not the graph this scope
    /// was opened for, or if it trusts a different key.
    pub fn append(&self, target: &StoredGraph, triples: &[Triple]) -> Result<usize, StoreError> {
        target.append(self.token, triples)
    }
}

impl fmt::Debug for PrivilegedScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivilegedScope")
            .field("graph", &self.token.graph)
            .finish_non_exhaustive()
    }
}

/// Restores the elevation count on drop
struct Elevation<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> Elevation<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for Elevation<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
