//! Signed capability tokens
//!
//! A token grants one [`Operation`] on one graph until it expires. The
//! signature covers every field, so a token cannot be retargeted or
//! extended without the gate's signing key.

use resolver_graph::GraphName;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

/// Operation a capability token is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Grow-only append of triples
    Append,
}

impl Operation {
    /// Wire name, covered by the signature
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Append => "append",
        }
    }
}

/// Signed grant to perform one operation on one graph
#[derive(Debug, Clone)]
pub struct CapabilityToken {
    /// Unique id, used to correlate log lines
    pub token_id: Ulid,
    /// Graph the grant applies to
    pub graph: GraphName,
    /// Operation the grant allows
    pub operation: Operation,
    /// Unix timestamp when token was issued
    pub issued_at: u64,
    /// Token expiration timestamp (0 = no expiration)
    pub expires_at: u64,
    /// Ed25519 signature over all other fields
    pub signature: Signature,
}

impl CapabilityToken {
    /// Issue a token for `operation` on `graph`, signed with `signing_key`
    ///
    /// `expires_at` is a Unix timestamp; 0 means the token never expires.
    pub fn sign(
        graph: GraphName,
        operation: Operation,
        signing_key: &SigningKey,
        expires_at: u64,
    ) -> Self {
        let token_id = Ulid::new();
        let issued_at = now_secs();

        let message = token_message(token_id, &graph, operation, issued_at, expires_at);
        let sig: Signature = signing_key.sign(&message);
        Self {
            token_id,
            graph,
            operation,
            issued_at,
            expires_at,
            signature: sig,
        }
    }

    /// Check the signature against `verifying_key`
    ///
    /// Expiry is not checked here; see [`CapabilityToken::is_expired`].
    #[must_use]
    pub fn verify(&self, verifying_key: &VerifyingKey) -> bool {
        let message = token_message(
            self.token_id,
            &self.graph,
            self.operation,
            self.issued_at,
            self.expires_at,
        );
        verifying_key.verify(&message, &self.signature).is_ok()
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        if self.expires_at == 0 {
            return false;
        }
        now_secs() > self.expires_at
    }

    /// Check if token is bound to a specific graph
    pub fn is_bound_to_graph(&self, graph: &GraphName) -> bool {
        &self.graph == graph
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn token_message(
    token_id: Ulid,
    graph: &GraphName,
    operation: Operation,
    issued_at: u64,
    expires_at: u64,
) -> Vec<u8> {
    let graph = graph.as_str();
    let op = operation.as_str();
    let mut msg = Vec::with_capacity(16 + graph.len() + 1 + op.len() + 8 + 8);
    msg.extend_from_slice(&token_id.to_bytes());
    msg.extend_from_slice(graph.as_bytes());
    msg.push(0);
    msg.extend_from_slice(op.as_bytes());
    msg.extend_from_slice(&issued_at.to_le_bytes());
    msg.extend_from_slice(&expires_at.to_le_bytes());
    msg
}
