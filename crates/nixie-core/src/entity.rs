//! Entity identifiers
//!
//! TigerStyle: Explicit validation on construction, immutable after creation.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the twin entity a signal targets
///
/// Entity ids consist of a namespace and a name (`namespace:name`), providing
/// logical grouping and unique identification across the platform.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntityId {
    namespace: String,
    name: String,
}

impl EntityId {
    /// Create a new EntityId with validation
    ///
    /// # Errors
    /// Returns error if namespace or name is empty, exceeds length limits,
    /// or contains invalid characters.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();

        if namespace.is_empty() || name.is_empty() {
            return Err(Error::InvalidEntityId {
                entity_id: format!("{}:{}", namespace, name),
                reason: "namespace and name must not be empty".into(),
            });
        }

        if namespace.len() > ENTITY_NAMESPACE_LENGTH_BYTES_MAX {
            return Err(Error::InvalidEntityId {
                entity_id: format!("{}:{}", namespace, name),
                reason: format!(
                    "namespace length {} exceeds limit {}",
                    namespace.len(),
                    ENTITY_NAMESPACE_LENGTH_BYTES_MAX
                ),
            });
        }

        if name.len() > ENTITY_NAME_LENGTH_BYTES_MAX {
            return Err(Error::InvalidEntityId {
                entity_id: format!("{}:{}", namespace, name),
                reason: format!(
                    "name length {} exceeds limit {}",
                    name.len(),
                    ENTITY_NAME_LENGTH_BYTES_MAX
                ),
            });
        }

        // Namespace is also a routing key, so it stays strict; names allow ':'
        // for nested entity paths.
        let valid = |s: &str, extra: &[char]| {
            s.chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.' || extra.contains(&c))
        };

        if !valid(&namespace, &[]) {
            return Err(Error::InvalidEntityId {
                entity_id: format!("{}:{}", namespace, name),
                reason: "namespace contains invalid characters".into(),
            });
        }

        if !valid(&name, &[':']) {
            return Err(Error::InvalidEntityId {
                entity_id: format!("{}:{}", namespace, name),
                reason: "name contains invalid characters".into(),
            });
        }

        Ok(Self { namespace, name })
    }

    /// Parse an EntityId from its qualified `namespace:name` form
    ///
    /// # Errors
    /// Returns error if the separator is missing or either part is invalid.
    pub fn parse(qualified: &str) -> Result<Self> {
        let (namespace, name) = qualified.split_once(':').ok_or_else(|| Error::InvalidEntityId {
            entity_id: qualified.to_string(),
            reason: "missing ':' separator".into(),
        })?;
        Self::new(namespace, name)
    }

    /// Get the namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get the name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the full qualified form (namespace:name)
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}
