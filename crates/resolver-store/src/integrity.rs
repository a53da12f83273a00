//! Token Integrity Verification
//!
//! Runtime checks a store performs before accepting a privileged append.
//! This is not policy evaluation: who may trigger a write was decided when
//! the gate minted the token.
//!
//! Runtime checks performed:
//! - Cryptographic signature verification
//! - Token expiration
//! - Graph and operation binding

use crate::error::TokenError;
use crate::token::{CapabilityToken, Operation};
use ed25519_dalek::VerifyingKey;
use resolver_graph::GraphName;

/// Token integrity verifier
pub struct TokenIntegrity;

impl TokenIntegrity {
    /// Verify signature and expiry
    pub fn verify_integrity(
        token: &CapabilityToken,
        verifying_key: &VerifyingKey,
    ) -> Result<(), TokenError> {
        if !token.verify(verifying_key) {
            return Err(TokenError::InvalidSignature);
        }
        if token.is_expired() {
            return Err(TokenError::Expired {
                expires_at: token.expires_at,
            });
        }
        Ok(())
    }

    /// Verify token is bound to the graph being written
    pub fn verify_graph_binding(
        token: &CapabilityToken,
        expected: &GraphName,
    ) -> Result<(), TokenError> {
        if token.is_bound_to_graph(expected) {
            Ok(())
        } else {
            Err(TokenError::GraphMismatch {
                expected: expected.clone(),
                actual: token.graph.clone(),
            })
        }
    }

    /// Verify token is bound to the operation being performed
    pub fn verify_operation_binding(
        token: &CapabilityToken,
        operation: Operation,
    ) -> Result<(), TokenError> {
        if token.operation == operation {
            Ok(())
        } else {
            Err(TokenError::OperationMismatch {
                expected: operation.as_str(),
                actual: token.operation.as_str(),
            })
        }
    }

    /// Full verification: integrity + graph binding + operation binding
    pub fn verify_full(
        token: &CapabilityToken,
        verifying_key: &VerifyingKey,
        graph: &GraphName,
        operation: Operation,
    ) -> Result<(), TokenError> {
        Self::verify_integrity(token, verifying_key)?;
        Self::verify_graph_binding(token, graph)?;
        Self::verify_operation_binding(token, operation)
    }
}
