//! Reference to a remotely observed value

use std::fmt;

use ea_core::EntityId;

/// An entity's state, or one attribute of it
///
/// Immutable once built; cheap to clone and share between concurrent waits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservableRef {
    entity_id: EntityId,
    attribute: Option<String>,
}

impl ObservableRef {
    /// Observe the entity's state string
    pub fn state(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            attribute: None,
        }
    }

    /// Observe one attribute of the entity
    pub fn attribute(entity_id: EntityId, attribute: impl Into<String>) -> Self {
        Self {
            entity_id,
            attribute: Some(attribute.into()),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute.as_deref()
    }
}

impl fmt::Display for ObservableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "{}.{}", self.entity_id, attribute),
            None => write!(f, "{}", self.entity_id),
        }
    }
}
