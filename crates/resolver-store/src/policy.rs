//! Access policies
//!
//! A policy ties a graph to the permission a principal needs to read it.
//! Permissions live in a namespace (e.g. `content-graph`) so that policies
//! installed by this service line up with permissions granted elsewhere.

use resolver_graph::GraphName;
use std::collections::BTreeSet;
use std::fmt;

/// Namespace for permissions over stored content graphs
pub const CONTENT_GRAPH_NAMESPACE: &str = "content-graph";

/// What a permission allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionAction {
    /// Read triples
    Read,
    /// Read and write triples
    ReadWrite,
}

impl PermissionAction {
    /// Whether holding `self` satisfies a requirement of `required`
    #[inline]
    #[must_use]
    pub fn implies(self, required: PermissionAction) -> bool {
        match (self, required) {
            (PermissionAction::ReadWrite, _) => true,
            (PermissionAction::Read, PermissionAction::Read) => true,
            (PermissionAction::Read, PermissionAction::ReadWrite) => false,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PermissionAction::Read => "read",
            PermissionAction::ReadWrite => "readwrite",
        }
    }
}

/// Permission over one graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission {
    /// Permission namespace
    pub namespace: String,
    /// Graph the permission applies to
    pub graph: GraphName,
    /// Allowed action
    pub action: PermissionAction,
}

impl Permission {
    /// Create a permission
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, graph: GraphName, action: PermissionAction) -> Self {
        Self {
            namespace: namespace.into(),
            graph,
            action,
        }
    }

    /// Read permission in the content-graph namespace
    #[inline]
    #[must_use]
    pub fn content_graph_read(graph: GraphName) -> Self {
        Self::new(CONTENT_GRAPH_NAMESPACE, graph, PermissionAction::Read)
    }

    /// Whether holding `self` satisfies `required`
    #[must_use]
    pub fn implies(&self, required: &Permission) -> bool {
        self.namespace == required.namespace
            && self.graph == required.graph
            && self.action.implies(required.action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.graph, self.action.as_str())
    }
}

/// Read requirement attached to a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Protected graph
    pub graph: GraphName,
    /// Permission a reader must hold
    pub read_permission: Permission,
}

impl AccessPolicy {
    /// Policy requiring `read_permission` to read `graph`
    #[inline]
    #[must_use]
    pub fn new(graph: GraphName, read_permission: Permission) -> Self {
        Self {
            graph,
            read_permission,
        }
    }

    /// Whether `principal` may read the graph
    #[must_use]
    pub fn permits_read(&self, principal: &Principal) -> bool {
        principal.holds(&self.read_permission)
    }
}

/// A caller and the permissions it holds
///
/// Principals are never elevated. Privileged writes use a capability minted
/// by the access gate instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    permissions: BTreeSet<Permission>,
}

impl Principal {
    /// Named principal without permissions
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: BTreeSet::new(),
        }
    }

    /// The unauthenticated caller
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    /// With an additional permission
    #[inline]
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    /// Principal name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether any held permission implies `required`
    #[must_use]
    pub fn holds(&self, required: &Permission) -> bool {
        self.permissions.iter().any(|p| p.implies(required))
    }

    /// Held permissions
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> GraphName {
        GraphName::new("http://example.org/resource-resolver-log.graph").unwrap()
    }

    #[test]
    fn anonymous_cannot_read_protected_graph() {
        let policy = AccessPolicy::new(log(), Permission::content_graph_read(log()));
        assert!(!policy.permits_read(&Principal::anonymous()));
    }

    #[test]
    fn readwrite_implies_read() {
        let policy = AccessPolicy::new(log(), Permission::content_graph_read(log()));
        let admin = Principal::new("admin").with_permission(Permission::new(
            CONTENT_GRAPH_NAMESPACE,
            log(),
            PermissionAction::ReadWrite,
        ));
        assert!(policy.permits_read(&admin));
    }

    #[test]
    fn permission_is_scoped_to_namespace_and_graph() {
        let other = GraphName::new("http://example.org/other.graph").unwrap();
        let policy = AccessPolicy::new(log(), Permission::content_graph_read(log()));

        let wrong_graph = Principal::new("a").with_permission(Permission::content_graph_read(other));
        let wrong_ns = Principal::new("b").with_permission(Permission::new(
            "system",
            log(),
            PermissionAction::ReadWrite,
        ));

        assert!(!policy.permits_read(&wrong_graph));
        assert!(!policy.permits_read(&wrong_ns));
    }

    #[test]
    fn permission_display() {
        let p = Permission::content_graph_read(log());
        assert_eq!(
            p.to_string(),
            "content-graph:http://example.org/resource-resolver-log.graph:read"
        );
    }
}
