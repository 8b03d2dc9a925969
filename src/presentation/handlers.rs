// HTTP request handlers
use crate::application::correlation_service::CorrelationRequest;
use crate::application::dataset_service::IngestMetadata;
use crate::application::error::{EngineError, EngineResult};
use crate::application::repositories::{DatasetFilter, DatasetSummary, RunFilter};
use crate::domain::dataset::{TestDataset, TestType};
use crate::infrastructure::http_response::{error_body, ApiError};
use crate::infrastructure::payload::IngestPayload;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Ingestion body: metadata plus exactly one payload shape — a delimited
/// `payload` string or a structured `data` array.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(flatten)]
    pub metadata: IngestMetadata,
    pub payload: Option<String>,
    pub data: Option<Vec<serde_json::Value>>,
}

impl IngestRequest {
    fn into_parts(self) -> EngineResult<(IngestMetadata, IngestPayload)> {
        let payload = match (self.payload, self.data) {
            (Some(text), None) => IngestPayload::Delimited(text),
            (None, Some(records)) => IngestPayload::Structured(records),
            (Some(_), Some(_)) => {
                return Err(EngineError::Validation(
                    "provide either payload or data, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(EngineError::Validation(
                    "one of payload or data is required".to_string(),
                ));
            }
        };
        Ok((self.metadata, payload))
    }
}

pub async fn ingest_dataset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (metadata, payload) = request.into_parts()?;
    let dataset = state.dataset_service.ingest(metadata, payload).await?;
    Ok((StatusCode::CREATED, Json(DatasetSummary::of(&dataset))))
}

#[derive(Debug, Deserialize)]
pub struct IngestBatchRequest {
    pub items: Vec<IngestRequest>,
}

pub async fn ingest_datasets_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestBatchRequest>,
) -> Json<Vec<serde_json::Value>> {
    // Items that fail to split into parts join the batch as immediate errors
    // so outcome positions line up with the submitted items.
    let mut early: Vec<Option<EngineError>> = Vec::new();
    let mut parsed = Vec::new();
    for item in request.items {
        match item.into_parts() {
            Ok(parts) => {
                early.push(None);
                parsed.push(parts);
            }
            Err(e) => early.push(Some(e)),
        }
    }

    let mut results = state.dataset_service.ingest_batch(parsed).await.into_iter();
    let body = early
        .into_iter()
        .map(|slot| match slot {
            Some(e) => batch_error(&e),
            None => match results.next() {
                Some(Ok(dataset)) => batch_ok(serde_json::json!(DatasetSummary::of(&dataset))),
                Some(Err(e)) => batch_error(&e),
                None => batch_error(&EngineError::Validation("missing outcome".to_string())),
            },
        })
        .collect();
    Json(body)
}

fn batch_ok(value: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "status": "ok", "result": value })
}

fn batch_error(err: &EngineError) -> serde_json::Value {
    let Json(envelope) = error_body(err);
    serde_json::json!({ "status": "error", "result": envelope })
}

#[derive(Debug, Deserialize)]
pub struct DatasetListQuery {
    pub device_id: Option<String>,
    pub test_type: Option<String>,
}

pub async fn list_datasets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DatasetListQuery>,
) -> Result<Json<Vec<DatasetSummary>>, ApiError> {
    let test_type = match query.test_type.as_deref() {
        Some(s) => Some(
            TestType::parse(s)
                .ok_or_else(|| EngineError::Validation(format!("unrecognized test_type: {s}")))?,
        ),
        None => None,
    };
    let filter = DatasetFilter { device_id: query.device_id, test_type };
    Ok(Json(state.dataset_service.list(&filter).await?))
}

pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TestDataset>, ApiError> {
    Ok(Json(state.dataset_service.get(&id).await?))
}

pub async fn delete_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.dataset_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_correlation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CorrelationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let run = state.correlation_service.create_run(request).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

#[derive(Debug, Deserialize)]
pub struct CorrelationBatchRequest {
    pub items: Vec<CorrelationRequest>,
}

pub async fn create_correlations_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CorrelationBatchRequest>,
) -> Json<Vec<serde_json::Value>> {
    let outcomes = state.correlation_service.create_runs_batch(request.items).await;
    Json(
        outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok(run) => batch_ok(serde_json::json!(run)),
                Err(e) => batch_error(&e),
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
pub struct RunListQuery {
    pub test_dataset_id: Option<String>,
}

pub async fn list_correlations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = RunFilter { test_dataset_id: query.test_dataset_id };
    Ok(Json(state.correlation_service.list_runs(&filter).await?))
}

pub async fn get_correlation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.correlation_service.get_run(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct QuickValidateRequest {
    pub test_dataset_id: String,
    pub parameters: BTreeMap<String, f64>,
}

/// What-if check: computes the summary with engine defaults and persists
/// nothing.
pub async fn quick_validate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuickValidateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .correlation_service
        .quick_validate(&request.test_dataset_id, &request.parameters)
        .await?;
    Ok(Json(summary))
}
