use async_trait::async_trait;

use super::DatasetPersister;
use crate::error::PersistError;
use crate::models::ChatDataset;

/// Keeps every persisted dataset in memory.
///
/// There is no deduplication: persisting the same export twice stores it
/// twice.
#[derive(Debug, Default)]
pub struct InMemoryPersister {
    datasets: Vec<ChatDataset>,
}

impl InMemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasets(&self) -> &[ChatDataset] {
        &self.datasets
    }

    pub fn into_datasets(self) -> Vec<ChatDataset> {
        self.datasets
    }

    pub fn total_messages(&self) -> usize {
        self.datasets.iter().map(ChatDataset::total_messages).sum()
    }

    pub fn clear(&mut self) {
        self.datasets.clear();
    }
}

#[async_trait]
impl DatasetPersister for InMemoryPersister {
    async fn persist(&mut self, dataset: ChatDataset) -> Result<(), PersistError> {
        self.datasets.push(dataset);
        Ok(())
    }
}
