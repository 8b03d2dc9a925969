// Repository traits for dataset and correlation run storage
use crate::application::error::EngineResult;
use crate::domain::correlation::{CorrelationRun, CorrelationSummary, RunStatus};
use crate::domain::dataset::{TestDataset, TestType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Listing view of a dataset: metadata plus the sample count, never the
/// samples themselves.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub id: String,
    pub device_id: String,
    pub test_type: TestType,
    pub temperature: Option<f64>,
    pub voltage_range: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sample_count: usize,
}

impl DatasetSummary {
    pub fn of(dataset: &TestDataset) -> Self {
        Self {
            id: dataset.id.clone(),
            device_id: dataset.device_id.clone(),
            test_type: dataset.test_type,
            temperature: dataset.temperature,
            voltage_range: dataset.voltage_range.clone(),
            description: dataset.description.clone(),
            created_at: dataset.created_at,
            sample_count: dataset.sample_count(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatasetFilter {
    pub device_id: Option<String>,
    pub test_type: Option<TestType>,
}

/// Listing view of a correlation run: identity, status and summary, without
/// the per-parameter results.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub test_dataset_id: String,
    pub status: RunStatus,
    pub summary: CorrelationSummary,
}

impl RunSummary {
    pub fn of(run: &CorrelationRun) -> Self {
        Self {
            id: run.id.clone(),
            created_at: run.created_at,
            test_dataset_id: run.test_dataset_id.clone(),
            status: run.status,
            summary: run.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub test_dataset_id: Option<String>,
}

#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Store a newly ingested dataset. Ids are caller-assigned and unique.
    async fn insert(&self, dataset: TestDataset) -> EngineResult<()>;

    async fn get(&self, id: &str) -> EngineResult<Option<TestDataset>>;

    /// Summaries matching the filter, newest first. Read-only and restartable.
    async fn list(&self, filter: &DatasetFilter) -> EngineResult<Vec<DatasetSummary>>;

    /// Remove a dataset. Returns false when the id is unknown. Never touches
    /// correlation runs that reference the dataset.
    async fn delete(&self, id: &str) -> EngineResult<bool>;
}

#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Persist a terminal run. Runs are immutable once stored.
    async fn insert(&self, run: CorrelationRun) -> EngineResult<()>;

    async fn get(&self, id: &str) -> EngineResult<Option<CorrelationRun>>;

    /// Summaries matching the filter, most recent first.
    async fn list(&self, filter: &RunFilter) -> EngineResult<Vec<RunSummary>>;
}
