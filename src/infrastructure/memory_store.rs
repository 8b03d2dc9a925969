// In-memory repository implementations
use crate::application::error::EngineResult;
use crate::application::repositories::{
    DatasetFilter, DatasetRepository, DatasetSummary, RunFilter, RunRepository, RunSummary,
};
use crate::domain::correlation::CorrelationRun;
use crate::domain::dataset::TestDataset;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Dataset store backed by a `RwLock`ed map: concurrent reads, serialized
/// writes. Each entity kind has its own lock so work on distinct kinds never
/// contends.
#[derive(Default)]
pub struct InMemoryDatasetRepository {
    datasets: RwLock<HashMap<String, TestDataset>>,
}

impl InMemoryDatasetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatasetRepository for InMemoryDatasetRepository {
    async fn insert(&self, dataset: TestDataset) -> EngineResult<()> {
        self.datasets.write().await.insert(dataset.id.clone(), dataset);
        Ok(())
    }

    async fn get(&self, id: &str) -> EngineResult<Option<TestDataset>> {
        Ok(self.datasets.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &DatasetFilter) -> EngineResult<Vec<DatasetSummary>> {
        let datasets = self.datasets.read().await;
        let mut summaries: Vec<DatasetSummary> = datasets
            .values()
            .filter(|d| {
                filter.device_id.as_deref().is_none_or(|id| d.device_id == id)
                    && filter.test_type.is_none_or(|t| d.test_type == t)
            })
            .map(DatasetSummary::of)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> EngineResult<bool> {
        Ok(self.datasets.write().await.remove(id).is_some())
    }
}

/// Run store. Runs are terminal when inserted and never updated.
#[derive(Default)]
pub struct InMemoryRunRepository {
    runs: RwLock<HashMap<String, CorrelationRun>>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn insert(&self, run: CorrelationRun) -> EngineResult<()> {
        self.runs.write().await.insert(run.id.clone(), run);
        Ok(())
    }

    async fn get(&self, id: &str) -> EngineResult<Option<CorrelationRun>> {
        Ok(self.runs.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &RunFilter) -> EngineResult<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let mut summaries: Vec<RunSummary> = runs
            .values()
            .filter(|r| {
                filter
                    .test_dataset_id
                    .as_deref()
                    .is_none_or(|id| r.test_dataset_id == id)
            })
            .map(RunSummary::of)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }
}
