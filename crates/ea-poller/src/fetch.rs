//! The collaborator that resolves an [`ObservableRef`] to its current value

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{FetchError, ObservableRef};

/// Resolves a reference to its current value
///
/// State refs resolve to a JSON string. Attribute refs resolve to the
/// attribute's value, or `null` when the entity exists without it.
/// Missing entities must be reported as [`FetchError::NotFound`] so the
/// poller can keep waiting for them to be created.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, target: &ObservableRef) -> Result<Value, FetchError>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    async fn fetch(&self, target: &ObservableRef) -> Result<Value, FetchError> {
        (**self).fetch(target).await
    }
}
