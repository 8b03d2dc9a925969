// Correlation run registry - Accepts requests, runs the engine, persists runs
use crate::application::correlation_engine::correlate;
use crate::application::error::{EngineError, EngineResult};
use crate::application::extraction::extract_parameters;
use crate::application::repositories::{DatasetRepository, RunFilter, RunRepository, RunSummary};
use crate::domain::correlation::{CorrelationRun, CorrelationSummary, RunStatus};
use crate::infrastructure::config::EngineSettings;
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// One correlation request. Tolerance and confidence fall back to the
/// configured engine defaults when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationRequest {
    pub test_dataset_id: String,
    pub extracted_parameters: BTreeMap<String, f64>,
    pub tolerance_percentage: Option<f64>,
    pub confidence_threshold: Option<f64>,
}

#[derive(Clone)]
pub struct CorrelationService {
    datasets: Arc<dyn DatasetRepository>,
    runs: Arc<dyn RunRepository>,
    settings: EngineSettings,
}

impl CorrelationService {
    pub fn new(
        datasets: Arc<dyn DatasetRepository>,
        runs: Arc<dyn RunRepository>,
        settings: EngineSettings,
    ) -> Self {
        Self { datasets, runs, settings }
    }

    /// Accept a request, run the engine synchronously and persist a terminal
    /// run. The dataset is resolved before any extraction work so an unknown
    /// id fails fast with `NotFound` and persists nothing. Extraction failure
    /// after resolution is recorded as a `failed` run.
    pub async fn create_run(&self, request: CorrelationRequest) -> EngineResult<CorrelationRun> {
        let (tolerance, confidence) = self.resolve_bounds(&request)?;
        if request.extracted_parameters.is_empty() {
            return Err(EngineError::Validation(
                "extracted_parameters must not be empty".to_string(),
            ));
        }

        let dataset = self
            .datasets
            .get(&request.test_dataset_id)
            .await?
            .ok_or_else(|| EngineError::dataset_not_found(&request.test_dataset_id))?;

        let mut run = CorrelationRun {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            test_dataset_id: dataset.id.clone(),
            tolerance_percentage: tolerance,
            confidence_threshold: confidence,
            status: RunStatus::Completed,
            error: None,
            results: Vec::new(),
            unmatched: Vec::new(),
            summary: empty_summary(),
        };

        match extract_parameters(&dataset) {
            Ok(measured) => {
                let output =
                    correlate(&request.extracted_parameters, &measured, tolerance, confidence);
                run.results = output.results;
                run.unmatched = output.unmatched;
                run.summary = output.summary;
            }
            Err(e @ EngineError::InsufficientData { .. }) => {
                run.status = RunStatus::Failed;
                run.error = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        self.runs.insert(run.clone()).await?;
        tracing::debug!(
            run_id = %run.id,
            dataset_id = %run.test_dataset_id,
            status = ?run.status,
            matched = run.summary.matched_count,
            "correlation run persisted"
        );
        Ok(run)
    }

    /// Sequential batch submission with partial-failure semantics.
    pub async fn create_runs_batch(
        &self,
        requests: Vec<CorrelationRequest>,
    ) -> Vec<EngineResult<CorrelationRun>> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            let outcome = self.create_run(request).await;
            if let Err(e) = &outcome {
                tracing::warn!(item = index, error = %e, "batch correlation item failed");
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    pub async fn get_run(&self, id: &str) -> EngineResult<CorrelationRun> {
        self.runs
            .get(id)
            .await?
            .ok_or_else(|| EngineError::run_not_found(id))
    }

    pub async fn list_runs(&self, filter: &RunFilter) -> EngineResult<Vec<RunSummary>> {
        self.runs.list(filter).await
    }

    /// Interactive what-if check: same computation as `create_run` with the
    /// engine defaults, returning only the summary. Never persists anything.
    pub async fn quick_validate(
        &self,
        test_dataset_id: &str,
        parameters: &BTreeMap<String, f64>,
    ) -> EngineResult<CorrelationSummary> {
        if parameters.is_empty() {
            return Err(EngineError::Validation(
                "parameters must not be empty".to_string(),
            ));
        }
        let dataset = self
            .datasets
            .get(test_dataset_id)
            .await?
            .ok_or_else(|| EngineError::dataset_not_found(test_dataset_id))?;

        let measured = extract_parameters(&dataset)?;
        let output = correlate(
            parameters,
            &measured,
            self.settings.default_tolerance_percentage,
            self.settings.default_confidence_threshold,
        );
        Ok(output.summary)
    }

    fn resolve_bounds(&self, request: &CorrelationRequest) -> EngineResult<(f64, f64)> {
        let tolerance = request
            .tolerance_percentage
            .unwrap_or(self.settings.default_tolerance_percentage);
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(EngineError::Validation(
                "tolerance_percentage must be greater than zero".to_string(),
            ));
        }

        let confidence = request
            .confidence_threshold
            .unwrap_or(self.settings.default_confidence_threshold);
        if !confidence.is_finite() || confidence <= 0.0 || confidence > 1.0 {
            return Err(EngineError::Validation(
                "confidence_threshold must lie in (0, 1]".to_string(),
            ));
        }

        Ok((tolerance, confidence))
    }
}

fn empty_summary() -> CorrelationSummary {
    CorrelationSummary {
        total_parameters: 0,
        matched_count: 0,
        unmatched_count: 0,
        within_tolerance_count: 0,
        average_correlation_score: None,
        average_error_percentage: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dataset_service::{DatasetService, IngestMetadata};
    use crate::domain::correlation::ErrorPercentage;
    use crate::infrastructure::memory_store::{InMemoryDatasetRepository, InMemoryRunRepository};
    use crate::infrastructure::payload::IngestPayload;

    struct Fixture {
        datasets: DatasetService,
        correlations: CorrelationService,
    }

    fn fixture() -> Fixture {
        let dataset_repo = Arc::new(InMemoryDatasetRepository::new());
        let run_repo = Arc::new(InMemoryRunRepository::new());
        Fixture {
            datasets: DatasetService::new(dataset_repo.clone()),
            correlations: CorrelationService::new(
                dataset_repo,
                run_repo,
                EngineSettings::default(),
            ),
        }
    }

    async fn ingest_iv(fixture: &Fixture) -> String {
        let metadata = IngestMetadata {
            device_id: "IRF540N".to_string(),
            test_type: "iv_curve".to_string(),
            temperature: Some(25.0),
            voltage_range: None,
            description: None,
        };
        let payload = IngestPayload::Delimited("0,5,0\n1,5,0.1\n2,5,0.2\n".to_string());
        fixture.datasets.ingest(metadata, payload).await.unwrap().id
    }

    fn params(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn request(dataset_id: &str, pairs: &[(&str, f64)]) -> CorrelationRequest {
        CorrelationRequest {
            test_dataset_id: dataset_id.to_string(),
            extracted_parameters: params(pairs),
            tolerance_percentage: None,
            confidence_threshold: None,
        }
    }

    #[tokio::test]
    async fn id_max_scenario_scores_perfectly() {
        let fixture = fixture();
        let dataset_id = ingest_iv(&fixture).await;

        let run = fixture
            .correlations
            .create_run(request(&dataset_id, &[("id_max", 0.2)]))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        let r = run.results.iter().find(|r| r.parameter_name == "id_max").unwrap();
        assert_eq!(r.error_percentage, ErrorPercentage::Defined(0.0));
        assert_eq!(r.correlation_score, 1.0);
        assert!(r.within_tolerance);
    }

    #[tokio::test]
    async fn unknown_dataset_fails_fast_and_persists_nothing() {
        let fixture = fixture();

        let err = fixture
            .correlations
            .create_run(request("no-such-id", &[("vth", 2.5)]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let runs = fixture.correlations.list_runs(&RunFilter::default()).await.unwrap();
        assert!(runs.is_empty());
    }

    #[tokio::test]
    async fn invalid_bounds_are_rejected() {
        let fixture = fixture();
        let dataset_id = ingest_iv(&fixture).await;

        let mut bad_tolerance = request(&dataset_id, &[("vth", 2.5)]);
        bad_tolerance.tolerance_percentage = Some(0.0);
        assert!(matches!(
            fixture.correlations.create_run(bad_tolerance).await.unwrap_err(),
            EngineError::Validation(_)
        ));

        let mut bad_confidence = request(&dataset_id, &[("vth", 2.5)]);
        bad_confidence.confidence_threshold = Some(1.5);
        assert!(matches!(
            fixture.correlations.create_run(bad_confidence).await.unwrap_err(),
            EngineError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn repeated_requests_yield_identical_results() {
        let fixture = fixture();
        let dataset_id = ingest_iv(&fixture).await;

        let first = fixture
            .correlations
            .create_run(request(&dataset_id, &[("vth", 1.1), ("id_max", 0.19)]))
            .await
            .unwrap();
        let second = fixture
            .correlations
            .create_run(request(&dataset_id, &[("vth", 1.1), ("id_max", 0.19)]))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.results, second.results);
        assert_eq!(first.unmatched, second.unmatched);
        assert_eq!(first.summary, second.summary);
    }

    #[tokio::test]
    async fn dataset_deletion_leaves_persisted_runs_intact() {
        let fixture = fixture();
        let dataset_id = ingest_iv(&fixture).await;

        let run = fixture
            .correlations
            .create_run(request(&dataset_id, &[("id_max", 0.2)]))
            .await
            .unwrap();

        fixture.datasets.delete(&dataset_id).await.unwrap();

        let fetched = fixture.correlations.get_run(&run.id).await.unwrap();
        assert_eq!(fetched.results, run.results);
        assert_eq!(fetched.summary, run.summary);

        // A new correlation against the deleted dataset now reports NotFound.
        let err = fixture
            .correlations
            .create_run(request(&dataset_id, &[("id_max", 0.2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn insufficient_extraction_persists_a_failed_run() {
        let fixture = fixture();
        let metadata = IngestMetadata {
            device_id: "IRF540N".to_string(),
            test_type: "temperature".to_string(),
            temperature: None,
            voltage_range: None,
            description: None,
        };
        let payload = IngestPayload::Delimited("25,2.5\n".to_string());
        let dataset_id = fixture.datasets.ingest(metadata, payload).await.unwrap().id;

        let run = fixture
            .correlations
            .create_run(request(&dataset_id, &[("temp_coefficient", 0.1)]))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.error.is_some());
        assert!(run.results.is_empty());

        // Failed runs are part of the audit trail too.
        let fetched = fixture.correlations.get_run(&run.id).await.unwrap();
        assert_eq!(fetched.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn quick_validate_returns_summary_without_persisting() {
        let fixture = fixture();
        let dataset_id = ingest_iv(&fixture).await;

        let summary = fixture
            .correlations
            .quick_validate(&dataset_id, &params(&[("id_max", 0.2), ("qg", 60.0)]))
            .await
            .unwrap();

        assert_eq!(summary.within_tolerance_count, 1);
        // qg on the extracted side; vth, rds_on, vds_max on the measured side.
        assert_eq!(summary.unmatched_count, 4);
        assert_eq!(summary.total_parameters, 5);
        assert!(fixture
            .correlations
            .list_runs(&RunFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn batch_correlation_isolates_item_failures() {
        let fixture = fixture();
        let dataset_id = ingest_iv(&fixture).await;

        let outcomes = fixture
            .correlations
            .create_runs_batch(vec![
                request(&dataset_id, &[("id_max", 0.2)]),
                request("missing", &[("id_max", 0.2)]),
                request(&dataset_id, &[("vth", 1.0)]),
            ])
            .await;

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 2);
        assert!(outcomes[1].is_err());
    }

    #[tokio::test]
    async fn runs_list_most_recent_first() {
        let fixture = fixture();
        let dataset_id = ingest_iv(&fixture).await;

        let first = fixture
            .correlations
            .create_run(request(&dataset_id, &[("id_max", 0.2)]))
            .await
            .unwrap();
        let second = fixture
            .correlations
            .create_run(request(&dataset_id, &[("vth", 1.0)]))
            .await
            .unwrap();

        let listed = fixture.correlations.list_runs(&RunFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);
        let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&first.id.as_str()) && ids.contains(&second.id.as_str()));
    }
}
