//! Entity ID type: the `domain.object_id` key the REST API addresses states by

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("'{0}' must contain exactly one '.' separator")]
    InvalidFormat(String),

    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("object_id cannot be empty")]
    EmptyObjectId,

    #[error("invalid domain '{0}' (lowercase alphanumeric and underscores, no leading/trailing or double underscores)")]
    InvalidDomain(String),

    #[error("invalid object_id '{0}' (lowercase alphanumeric and underscores, no leading/trailing underscore)")]
    InvalidObjectId(String),
}

/// A Home Assistant entity ID such as `switch.emergency_door_open_acknowledged`
///
/// Serialized as the plain `domain.object_id` string, which is what
/// `/api/states` returns and what service calls expect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    /// Build an entity ID from its two parts, validating both
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        if domain.is_empty() {
            return Err(EntityIdError::EmptyDomain);
        }
        if object_id.is_empty() {
            return Err(EntityIdError::EmptyObjectId);
        }
        if domain.contains("__") || !is_slug(&domain) {
            return Err(EntityIdError::InvalidDomain(domain));
        }
        if !is_slug(&object_id) {
            return Err(EntityIdError::InvalidObjectId(object_id));
        }

        Ok(Self { domain, object_id })
    }

    /// Build from parts already known to be valid slugs
    pub(crate) fn from_valid_parts(domain: &str, object_id: String) -> Self {
        Self {
            domain: domain.to_string(),
            object_id,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// True when the full `domain.object_id` string starts with `prefix`
    pub fn starts_with(&self, prefix: &str) -> bool {
        match prefix.split_once('.') {
            Some((domain, object_prefix)) => {
                self.domain == domain && self.object_id.starts_with(object_prefix)
            }
            None => self.domain.starts_with(prefix),
        }
    }
}

/// Lowercase alphanumeric plus underscores, not starting or ending with `_`
pub(crate) fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('_')
        && !s.ends_with('_')
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(domain), Some(object_id), None) => Self::new(domain, object_id),
            _ => Err(EntityIdError::InvalidFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}
