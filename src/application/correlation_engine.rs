// Correlation engine - per-parameter comparison and aggregate statistics
use crate::domain::correlation::{
    CorrelationResult, CorrelationSummary, ErrorPercentage, UnmatchedParameter, UnmatchedSide,
};
use std::collections::BTreeMap;

/// Everything one engine invocation produces. Pure data; persistence is the
/// run registry's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationOutput {
    pub results: Vec<CorrelationResult>,
    pub unmatched: Vec<UnmatchedParameter>,
    pub summary: CorrelationSummary,
}

/// Compare an extracted parameter set against the measured set.
///
/// Stateless and deterministic: identical inputs always produce an identical
/// result sequence and summary. Parameters present on only one side are
/// reported as unmatched entries, never as fabricated zero comparisons.
pub fn correlate(
    extracted: &BTreeMap<String, f64>,
    measured: &BTreeMap<String, f64>,
    tolerance_percentage: f64,
    confidence_threshold: f64,
) -> CorrelationOutput {
    let mut results = Vec::new();
    let mut unmatched = Vec::new();

    for (name, &extracted_value) in extracted {
        match measured.get(name) {
            Some(&measured_value) => results.push(compare_parameter(
                name,
                extracted_value,
                measured_value,
                tolerance_percentage,
                confidence_threshold,
            )),
            None => unmatched.push(UnmatchedParameter {
                parameter_name: name.clone(),
                side: UnmatchedSide::ExtractedOnly,
                value: extracted_value,
            }),
        }
    }

    for (name, &measured_value) in measured {
        if !extracted.contains_key(name) {
            unmatched.push(UnmatchedParameter {
                parameter_name: name.clone(),
                side: UnmatchedSide::MeasuredOnly,
                value: measured_value,
            });
        }
    }

    let summary = summarize(&results, unmatched.len());
    CorrelationOutput { results, unmatched, summary }
}

/// One parameter comparison.
///
/// A zero measured value leaves the error percentage undefined by division:
/// a zero extracted value then counts as an exact match, anything else is
/// flagged `Undefined` and stays out of the mean aggregates.
fn compare_parameter(
    name: &str,
    extracted: f64,
    measured: f64,
    tolerance_percentage: f64,
    confidence_threshold: f64,
) -> CorrelationResult {
    let (error_percentage, correlation_score, within_tolerance) = if measured == 0.0 {
        if extracted == 0.0 {
            (ErrorPercentage::Defined(0.0), 1.0, true)
        } else {
            (ErrorPercentage::Undefined, 0.0, false)
        }
    } else {
        let pct = (extracted - measured).abs() / measured.abs() * 100.0;
        // Errors beyond 100% clamp the score to zero.
        let score = (1.0 - pct / 100.0).max(0.0);
        (ErrorPercentage::Defined(pct), score, pct <= tolerance_percentage)
    };

    CorrelationResult {
        parameter_name: name.to_string(),
        extracted_value: extracted,
        measured_value: measured,
        error_percentage,
        correlation_score,
        confidence_level: (correlation_score / confidence_threshold).min(1.0),
        within_tolerance,
    }
}

fn summarize(results: &[CorrelationResult], unmatched_count: usize) -> CorrelationSummary {
    let defined: Vec<f64> = results
        .iter()
        .filter_map(|r| r.error_percentage.defined())
        .collect();
    let defined_scores: Vec<f64> = results
        .iter()
        .filter(|r| r.error_percentage.defined().is_some())
        .map(|r| r.correlation_score)
        .collect();

    let mean = |values: &[f64]| {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    CorrelationSummary {
        total_parameters: results.len() + unmatched_count,
        matched_count: results.len(),
        unmatched_count,
        within_tolerance_count: results.iter().filter(|r| r.within_tolerance).count(),
        average_correlation_score: mean(&defined_scores),
        average_error_percentage: mean(&defined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn threshold_voltage_scenario() {
        let out = correlate(
            &params(&[("vth", 2.5)]),
            &params(&[("vth", 2.3)]),
            10.0,
            0.8,
        );
        let r = &out.results[0];

        let pct = r.error_percentage.defined().unwrap();
        assert!((pct - 8.695652173913043).abs() < 1e-9);
        assert!(r.within_tolerance);
        assert!((r.correlation_score - 0.9130434782608696).abs() < 1e-9);
        assert_eq!(r.confidence_level, 1.0);
        assert_eq!(out.summary.within_tolerance_count, 1);
    }

    #[test]
    fn exact_match_scores_one() {
        let out = correlate(
            &params(&[("id_max", 0.2)]),
            &params(&[("id_max", 0.2)]),
            10.0,
            0.8,
        );
        let r = &out.results[0];

        assert_eq!(r.error_percentage, ErrorPercentage::Defined(0.0));
        assert_eq!(r.correlation_score, 1.0);
        assert!(r.within_tolerance);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        // 25% error, exactly representable: |1.25 - 1.0| / 1.0 * 100 = 25.0
        let out = correlate(
            &params(&[("rds_on", 1.25)]),
            &params(&[("rds_on", 1.0)]),
            25.0,
            0.8,
        );
        assert!(out.results[0].within_tolerance);
    }

    #[test]
    fn wildly_wrong_value_clamps_score_to_zero() {
        let out = correlate(
            &params(&[("vth", 10.0)]),
            &params(&[("vth", 2.0)]),
            10.0,
            0.8,
        );
        let r = &out.results[0];

        assert_eq!(r.correlation_score, 0.0);
        assert_eq!(r.confidence_level, 0.0);
        assert!(!r.within_tolerance);
    }

    #[test]
    fn zero_measured_zero_extracted_is_within_tolerance() {
        let out = correlate(&params(&[("crss", 0.0)]), &params(&[("crss", 0.0)]), 10.0, 0.8);
        let r = &out.results[0];

        assert_eq!(r.error_percentage, ErrorPercentage::Defined(0.0));
        assert!(r.within_tolerance);
        assert_eq!(out.summary.average_error_percentage, Some(0.0));
    }

    #[test]
    fn zero_measured_nonzero_extracted_is_undefined_and_excluded_from_means() {
        let out = correlate(
            &params(&[("crss", 5.0), ("vth", 2.0)]),
            &params(&[("crss", 0.0), ("vth", 2.0)]),
            10.0,
            0.8,
        );

        let crss = out.results.iter().find(|r| r.parameter_name == "crss").unwrap();
        assert_eq!(crss.error_percentage, ErrorPercentage::Undefined);
        assert!(!crss.within_tolerance);

        // The undefined entry still counts toward totals but not the means.
        assert_eq!(out.summary.total_parameters, 2);
        assert_eq!(out.summary.matched_count, 2);
        assert_eq!(out.summary.average_error_percentage, Some(0.0));
        assert_eq!(out.summary.average_correlation_score, Some(1.0));
    }

    #[test]
    fn one_sided_parameters_are_unmatched_not_zero_compared() {
        let out = correlate(
            &params(&[("vth", 2.5), ("qg_total", 60.0)]),
            &params(&[("vth", 2.3), ("id_max", 0.2)]),
            10.0,
            0.8,
        );

        assert_eq!(out.results.len(), 1);
        assert_eq!(out.unmatched.len(), 2);

        let extracted_only = out
            .unmatched
            .iter()
            .find(|u| u.parameter_name == "qg_total")
            .unwrap();
        assert_eq!(extracted_only.side, UnmatchedSide::ExtractedOnly);

        let measured_only = out
            .unmatched
            .iter()
            .find(|u| u.parameter_name == "id_max")
            .unwrap();
        assert_eq!(measured_only.side, UnmatchedSide::MeasuredOnly);

        assert_eq!(out.summary.total_parameters, 3);
        assert_eq!(out.summary.unmatched_count, 2);
    }

    #[test]
    fn engine_is_deterministic() {
        let extracted = params(&[("vth", 2.5), ("rds_on", 0.05), ("id_max", 30.0)]);
        let measured = params(&[("vth", 2.3), ("rds_on", 0.044), ("vds_max", 100.0)]);

        let first = correlate(&extracted, &measured, 10.0, 0.8);
        let second = correlate(&extracted, &measured, 10.0, 0.8);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_sets_produce_empty_summary() {
        let out = correlate(&BTreeMap::new(), &BTreeMap::new(), 10.0, 0.8);
        assert_eq!(out.summary.total_parameters, 0);
        assert_eq!(out.summary.average_correlation_score, None);
        assert_eq!(out.summary.average_error_percentage, None);
    }
}
