use std::sync::Arc;

use swarmdesk_sdk::{ChainState, DurationSecs, PostageBatch};
use tracing::info;

use crate::error::DriveError;
use crate::store::DriveStore;

/// Buys, extends and prices postage stamps.
pub struct StampManager {
    store: Arc<DriveStore>,
}

impl StampManager {
    pub fn new(store: Arc<DriveStore>) -> Self {
        Self { store }
    }

    /// Cost quote for `size_bytes` kept for `duration`, as returned by the node.
    pub async fn estimate_cost(
        &self,
        size_bytes: u64,
        duration: DurationSecs,
    ) -> Result<String, DriveError> {
        validate_purchase(size_bytes, duration)?;
        Ok(self.store.node().get_storage_cost(size_bytes, duration).await?)
    }

    /// Buys a new stamp and refreshes the store. Returns the batch id.
    pub async fn buy(
        &self,
        size_bytes: u64,
        duration: DurationSecs,
        label: &str,
    ) -> Result<String, DriveError> {
        validate_purchase(size_bytes, duration)?;
        let batch_id = self
            .store
            .node()
            .buy_storage(size_bytes, duration, label)
            .await?;
        info!(batch = %batch_id, size_bytes, duration, "stamp purchased");
        self.store.refresh().await?;
        Ok(batch_id)
    }

    /// Grows a stamp's capacity, its lifetime, or both.
    pub async fn extend(
        &self,
        batch_id: &str,
        size_bytes: Option<u64>,
        duration: Option<DurationSecs>,
    ) -> Result<(), DriveError> {
        if size_bytes.is_none() && duration.is_none() {
            return Err(DriveError::InvalidRequest(
                "extend needs a size or a duration".into(),
            ));
        }
        if size_bytes == Some(0) || duration == Some(0) {
            return Err(DriveError::InvalidRequest(
                "extension amounts must be positive".into(),
            ));
        }
        if self.store.stamp(batch_id).is_none() {
            return Err(DriveError::UnknownStamp(batch_id.to_string()));
        }

        self.store
            .node()
            .extend_storage(batch_id, size_bytes, duration)
            .await?;
        info!(batch = %batch_id, ?size_bytes, ?duration, "stamp extended");
        self.store.refresh().await
    }

    pub async fn chain_state(&self) -> Result<ChainState, DriveError> {
        Ok(self.store.node().get_chain_state().await?)
    }

    pub fn stamps(&self) -> Vec<PostageBatch> {
        self.store.stamps()
    }
}

fn validate_purchase(size_bytes: u64, duration: DurationSecs) -> Result<(), DriveError> {
    if size_bytes == 0 {
        return Err(DriveError::InvalidRequest("size must be positive".into()));
    }
    if duration == 0 {
        return Err(DriveError::InvalidRequest("duration must be positive".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockFm, MockNode, batch};

    async fn setup(batches: Vec<PostageBatch>) -> (Arc<MockNode>, StampManager) {
        let node = Arc::new(MockNode::with(batches));
        let store = Arc::new(DriveStore::new(Arc::new(MockFm::default()), node.clone()));
        store.refresh().await.unwrap();
        (node, StampManager::new(store))
    }

    #[tokio::test]
    async fn buy_refreshes_stamps() {
        let (_, stamps) = setup(vec![]).await;
        let id = stamps.buy(1 << 30, 86_400, "photos").await.unwrap();
        let list = stamps.stamps();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].batch_id, id);
        assert_eq!(list[0].label, "photos");
    }

    #[tokio::test]
    async fn rejects_zero_amounts() {
        let (_, stamps) = setup(vec![]).await;
        assert!(matches!(
            stamps.buy(0, 10, "x").await,
            Err(DriveError::InvalidRequest(_))
        ));
        assert!(matches!(
            stamps.estimate_cost(10, 0).await,
            Err(DriveError::InvalidRequest(_))
        ));
        assert_eq!(stamps.estimate_cost(10, 3).await.unwrap(), "30");
    }

    #[tokio::test]
    async fn extend_checks_arguments_and_batch() {
        let (node, stamps) = setup(vec![batch("b1", true)]).await;

        assert!(matches!(
            stamps.extend("b1", None, None).await,
            Err(DriveError::InvalidRequest(_))
        ));
        assert!(matches!(
            stamps.extend("zz", Some(1), None).await,
            Err(DriveError::UnknownStamp(_))
        ));

        stamps.extend("b1", None, Some(3600)).await.unwrap();
        assert_eq!(
            node.extended.lock().unwrap().as_slice(),
            &[("b1".to_string(), None, Some(3600))]
        );
    }

    #[tokio::test]
    async fn chain_state_passthrough() {
        let (_, stamps) = setup(vec![]).await;
        assert_eq!(stamps.chain_state().await.unwrap().block, 42);
    }
}
