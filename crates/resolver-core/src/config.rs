//! Resolver configuration
//!
//! Layering, lowest to highest precedence:
//! 1. [`ResolverConfig::default`]
//! 2. a TOML file ([`ResolverConfig::from_file`])
//! 3. `RESOLVER_*` environment variables ([`ResolverConfig::with_env_overrides`])

use crate::error::ConfigError;
use resolver_graph::GraphName;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default name of the persistent audit log graph
pub const DEFAULT_LOG_GRAPH: &str = "http://example.org/resource-resolver-log.graph";

/// Longest accepted capability lifetime, one day
pub const MAX_TOKEN_TTL_SECS: u64 = 86_400;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "RESOLVER_";

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// IRI of the audit log graph
    pub log_graph_name: String,
    /// Entity lookup timeout in milliseconds
    pub lookup_timeout_ms: u64,
    /// Lifetime of privileged append capabilities in seconds (0 = no expiry)
    pub token_ttl_secs: u64,
    /// Recorded when a request carries no client descriptor
    pub unknown_client_marker: String,
    /// `rdfs:comment` attached to the service node
    pub service_comment: String,
    /// Permission namespace guarding reads of the log graph
    pub read_permission_namespace: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            log_graph_name: DEFAULT_LOG_GRAPH.to_string(),
            lookup_timeout_ms: 5_000,
            token_ttl_secs: 30,
            unknown_client_marker: "unknown".to_string(),
            service_comment: "A Resource Resolver".to_string(),
            read_permission_namespace: resolver_store::CONTENT_GRAPH_NAMESPACE.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing fields keep their defaults
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML or unknown fields.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `RESOLVER_*` variables from the process environment
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] if a variable cannot be parsed.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply `RESOLVER_*` overrides from any key/value source
    ///
    /// Keys without the prefix are ignored, as are unknown `RESOLVER_*` keys.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] if a value cannot be parsed.
    pub fn apply_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.into();
            match field {
                "LOG_GRAPH" => self.log_graph_name = value,
                "LOOKUP_TIMEOUT_MS" => self.lookup_timeout_ms = parse_u64(key.as_ref(), &value)?,
                "TOKEN_TTL_SECS" => self.token_ttl_secs = parse_u64(key.as_ref(), &value)?,
                "UNKNOWN_CLIENT" => self.unknown_client_marker = value,
                "SERVICE_COMMENT" => self.service_comment = value,
                "READ_PERMISSION_NAMESPACE" => self.read_permission_namespace = value,
                _ => tracing::debug!(key = key.as_ref(), "ignoring unknown override"),
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Check field values that serde cannot
    ///
    /// # Errors
    /// [`ConfigError::GraphName`] for a bad log graph IRI,
    /// [`ConfigError::InvalidValue`] for a zero lookup timeout or a token
    /// lifetime above [`MAX_TOKEN_TTL_SECS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_graph()?;
        if self.lookup_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "lookup_timeout_ms".into(),
                value: "0".into(),
                reason: "timeout must be positive".into(),
            });
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "token_ttl_secs".into(),
                value: self.token_ttl_secs.to_string(),
                reason: format!("must not exceed {MAX_TOKEN_TTL_SECS} seconds"),
            });
        }
        Ok(())
    }

    /// Log graph name as a validated IRI
    ///
    /// # Errors
    /// [`ConfigError::GraphName`] if `log_graph_name` is not an absolute IRI.
    pub fn log_graph(&self) -> Result<GraphName, ConfigError> {
        Ok(GraphName::new(self.log_graph_name.clone())?)
    }

    /// Lookup timeout
    #[inline]
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Capability lifetime
    #[inline]
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// With log graph name
    #[inline]
    #[must_use]
    pub fn with_log_graph_name(mut self, name: impl Into<String>) -> Self {
        self.log_graph_name = name.into();
        self
    }

    /// With lookup timeout
    #[inline]
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With capability lifetime
    #[inline]
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl_secs = ttl.as_secs();
        self
    }

    /// With unknown client marker
    #[inline]
    #[must_use]
    pub fn with_unknown_client_marker(mut self, marker: impl Into<String>) -> Self {
        self.unknown_client_marker = marker.into();
        self
    }

    /// With service comment
    #[inline]
    #[must_use]
    pub fn with_service_comment(mut self, comment: impl Into<String>) -> Self {
        self.service_comment = comment.into();
        self
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_graph().unwrap().as_str(), DEFAULT_LOG_GRAPH);
        assert_eq!(config.unknown_client_marker, "unknown");
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn toml_overrides_some_fields() {
        let config = ResolverConfig::from_toml_str(
            r#"
            lookup_timeout_ms = 250
            service_comment = "Test Resolver"
            "#,
        )
        .unwrap();

        assert_eq!(config.lookup_timeout_ms, 250);
        assert_eq!(config.service_comment, "Test Resolver");
        assert_eq!(config.log_graph_name, DEFAULT_LOG_GRAPH);
    }

    #[test]
    fn unknown_toml_field_is_rejected() {
        let err = ResolverConfig::from_toml_str("no_such_field = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_log_graph_is_rejected() {
        let err = ResolverConfig::from_toml_str(r#"log_graph_name = "relative/path""#).unwrap_err();
        assert!(matches!(err, ConfigError::GraphName(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let config = ResolverConfig::default()
            .apply_overrides([
                ("RESOLVER_LOOKUP_TIMEOUT_MS", "100"),
                ("RESOLVER_UNKNOWN_CLIENT", "n/a"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();

        assert_eq!(config.lookup_timeout_ms, 100);
        assert_eq!(config.unknown_client_marker, "n/a");
    }

    #[test]
    fn unparsable_override_is_reported() {
        let err = ResolverConfig::default()
            .apply_overrides([("RESOLVER_TOKEN_TTL_SECS", "soon")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "RESOLVER_TOKEN_TTL_SECS"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ResolverConfig::default()
            .apply_overrides([("RESOLVER_LOOKUP_TIMEOUT_MS", "0")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn token_ttl_is_bounded() {
        let at_limit = ResolverConfig::default()
            .apply_overrides([("RESOLVER_TOKEN_TTL_SECS", MAX_TOKEN_TTL_SECS.to_string())])
            .unwrap();
        assert_eq!(at_limit.token_ttl_secs, MAX_TOKEN_TTL_SECS);

        let err = ResolverConfig::default()
            .apply_overrides([("RESOLVER_TOKEN_TTL_SECS", u64::MAX.to_string())])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "token_ttl_secs"));

        let err = ResolverConfig::from_toml_str("token_ttl_secs = 86401").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolver.toml");
        std::fs::write(&path, "token_ttl_secs = 5\n").unwrap();

        let config = ResolverConfig::from_file(&path).unwrap();
        assert_eq!(config.token_ttl(), Duration::from_secs(5));

        let missing = ResolverConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
