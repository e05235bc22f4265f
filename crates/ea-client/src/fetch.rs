//! `HaClient` as the poller's fetch capability

use async_trait::async_trait;
use ea_poller::{Fetch, FetchError, ObservableRef, Value};

use crate::{ClientError, HaClient};

#[async_trait]
impl Fetch for HaClient {
    async fn fetch(&self, target: &ObservableRef) -> Result<Value, FetchError> {
        let state = self
            .get_state(target.entity_id())
            .await
            .map_err(to_fetch_error)?;

        Ok(match target.attribute_name() {
            Some(name) => state.attributes.get(name).cloned().unwrap_or(Value::Null),
            None => Value::String(state.state),
        })
    }
}

/// Only a 404 is retryable; request timeouts surface as cancellation
fn to_fetch_error(err: ClientError) -> FetchError {
    match err {
        ClientError::NotFound { path } => FetchError::NotFound(path),
        err if err.is_timeout() => FetchError::Cancelled(err.to_string()),
        err => FetchError::Other(err.to_string()),
    }
}
