// Dataset service - Use cases for ingesting and managing test data
use crate::application::error::{EngineError, EngineResult};
use crate::application::repositories::{DatasetFilter, DatasetRepository, DatasetSummary};
use crate::domain::dataset::{TestDataset, TestType};
use crate::infrastructure::payload::{parse_samples, IngestPayload};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Caller-supplied metadata accompanying an ingestion payload. The test type
/// arrives as free text and is rejected here when unrecognized.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestMetadata {
    pub device_id: String,
    pub test_type: String,
    pub temperature: Option<f64>,
    pub voltage_range: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct DatasetService {
    repository: Arc<dyn DatasetRepository>,
}

impl DatasetService {
    pub fn new(repository: Arc<dyn DatasetRepository>) -> Self {
        Self { repository }
    }

    /// Validate, parse and store one dataset. All-or-nothing: any failure
    /// leaves no partial dataset behind.
    pub async fn ingest(
        &self,
        metadata: IngestMetadata,
        payload: IngestPayload,
    ) -> EngineResult<TestDataset> {
        let device_id = metadata.device_id.trim();
        if device_id.is_empty() {
            return Err(EngineError::Validation("device_id is required".to_string()));
        }
        let test_type = TestType::parse(&metadata.test_type).ok_or_else(|| {
            EngineError::Validation(format!("unrecognized test_type: {}", metadata.test_type))
        })?;

        let samples = parse_samples(test_type, &payload)?;
        if samples.is_empty() {
            return Err(EngineError::Validation(
                "dataset contains no samples".to_string(),
            ));
        }

        let dataset = TestDataset {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            test_type,
            temperature: metadata.temperature,
            voltage_range: metadata.voltage_range,
            description: metadata.description,
            created_at: Utc::now(),
            samples,
        };

        self.repository.insert(dataset.clone()).await?;
        tracing::debug!(
            dataset_id = %dataset.id,
            device_id = %dataset.device_id,
            test_type = dataset.test_type.as_str(),
            samples = dataset.sample_count(),
            "dataset ingested"
        );
        Ok(dataset)
    }

    /// Sequential batch ingestion with partial-failure semantics: one outcome
    /// per item, the batch never aborts on a bad item.
    pub async fn ingest_batch(
        &self,
        items: Vec<(IngestMetadata, IngestPayload)>,
    ) -> Vec<EngineResult<TestDataset>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for (index, (metadata, payload)) in items.into_iter().enumerate() {
            let outcome = self.ingest(metadata, payload).await;
            if let Err(e) = &outcome {
                tracing::warn!(item = index, error = %e, "batch ingestion item failed");
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    pub async fn get(&self, id: &str) -> EngineResult<TestDataset> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| EngineError::dataset_not_found(id))
    }

    pub async fn list(&self, filter: &DatasetFilter) -> EngineResult<Vec<DatasetSummary>> {
        self.repository.list(filter).await
    }

    /// Delete a dataset. Historical correlation runs referencing it are an
    /// immutable audit trail and stay untouched.
    pub async fn delete(&self, id: &str) -> EngineResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(EngineError::dataset_not_found(id))
        }
    }
}
