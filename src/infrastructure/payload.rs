// Payload decoding - delimited tables and structured records per test type
use crate::application::error::{EngineError, EngineResult};
use crate::domain::dataset::{CvSample, IvSample, SampleSet, SweepSample, TemperatureSample, TestType};

/// The two payload shapes ingestion accepts: a delimited tabular string with
/// positional columns, or a structured array of per-type records.
#[derive(Debug, Clone)]
pub enum IngestPayload {
    Delimited(String),
    Structured(Vec<serde_json::Value>),
}

/// Parse a payload into the sample shape its test type dictates.
///
/// All-or-nothing: a single row that fails numeric coercion rejects the whole
/// payload so corrupt data never reaches extraction.
pub fn parse_samples(test_type: TestType, payload: &IngestPayload) -> EngineResult<SampleSet> {
    match payload {
        IngestPayload::Delimited(text) => parse_delimited(test_type, text),
        IngestPayload::Structured(records) => parse_structured(test_type, records),
    }
}

fn column_count(test_type: TestType) -> usize {
    match test_type {
        TestType::IvCurve => 3,
        TestType::CvCurve => 4,
        TestType::Temperature | TestType::Frequency | TestType::Noise | TestType::Aging => 2,
    }
}

fn parse_delimited(test_type: TestType, text: &str) -> EngineResult<SampleSet> {
    let delimiter = if text.contains(',') { b',' } else { b'\t' };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let expected = column_count(test_type);
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            EngineError::UnsupportedFormat(format!("row {}: {}", index + 1, e))
        })?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() != expected {
            return Err(EngineError::UnsupportedFormat(format!(
                "row {}: expected {} columns for {}, got {}",
                index + 1,
                expected,
                test_type.as_str(),
                record.len()
            )));
        }

        let mut row = Vec::with_capacity(expected);
        let mut coerced = true;
        for field in record.iter() {
            match field.parse::<f64>() {
                Ok(value) => row.push(value),
                Err(_) => {
                    coerced = false;
                    break;
                }
            }
        }
        if coerced {
            rows.push(row);
        } else if index == 0 {
            // A non-numeric first row is a header; anywhere else it is corrupt.
            continue;
        } else {
            return Err(EngineError::UnsupportedFormat(format!(
                "row {}: non-numeric value in column data",
                index + 1
            )));
        }
    }

    Ok(rows_to_samples(test_type, rows))
}

fn rows_to_samples(test_type: TestType, rows: Vec<Vec<f64>>) -> SampleSet {
    match test_type {
        TestType::IvCurve => SampleSet::IvCurve(
            rows.into_iter()
                .map(|r| IvSample { vds: r[0], vgs: r[1], ids: r[2] })
                .collect(),
        ),
        TestType::CvCurve => SampleSet::CvCurve(
            rows.into_iter()
                .map(|r| CvSample { v_bias: r[0], ciss: r[1], coss: r[2], crss: r[3] })
                .collect(),
        ),
        TestType::Temperature => SampleSet::Temperature(
            rows.into_iter()
                .map(|r| TemperatureSample { temperature_c: r[0], value: r[1] })
                .collect(),
        ),
        TestType::Frequency | TestType::Noise | TestType::Aging => SampleSet::Sweep(
            rows.into_iter().map(|r| SweepSample { x: r[0], y: r[1] }).collect(),
        ),
    }
}

fn parse_structured(test_type: TestType, records: &[serde_json::Value]) -> EngineResult<SampleSet> {
    fn collect<T: serde::de::DeserializeOwned>(
        records: &[serde_json::Value],
    ) -> EngineResult<Vec<T>> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value(record.clone()).map_err(|e| {
                    EngineError::UnsupportedFormat(format!("record {}: {}", index + 1, e))
                })
            })
            .collect()
    }

    Ok(match test_type {
        TestType::IvCurve => SampleSet::IvCurve(collect(records)?),
        TestType::CvCurve => SampleSet::CvCurve(collect(records)?),
        TestType::Temperature => SampleSet::Temperature(collect(records)?),
        TestType::Frequency | TestType::Noise | TestType::Aging => {
            SampleSet::Sweep(collect(records)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_comma_delimited_iv_table() {
        let payload = IngestPayload::Delimited("0,5,0\n1,5,0.1\n2,5,0.2\n".to_string());
        let samples = parse_samples(TestType::IvCurve, &payload).unwrap();

        match samples {
            SampleSet::IvCurve(points) => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[1], IvSample { vds: 1.0, vgs: 5.0, ids: 0.1 });
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn parses_tab_delimited_with_header_row() {
        let payload =
            IngestPayload::Delimited("vds\tvgs\tids\n0\t5\t0\n1\t5\t0.1\n".to_string());
        let samples = parse_samples(TestType::IvCurve, &payload).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn rejects_non_numeric_row_past_the_header() {
        let payload = IngestPayload::Delimited("0,5,0\n1,bad,0.1\n".to_string());
        let err = parse_samples(TestType::IvCurve, &payload).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_wrong_column_count() {
        let payload = IngestPayload::Delimited("0,5\n1,5\n".to_string());
        let err = parse_samples(TestType::IvCurve, &payload).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(_)));
    }

    #[test]
    fn parses_structured_records() {
        let payload = IngestPayload::Structured(vec![
            json!({"vds": 0.0, "vgs": 5.0, "ids": 0.0}),
            json!({"vds": 1.0, "vgs": 5.0, "ids": 0.1}),
        ]);
        let samples = parse_samples(TestType::IvCurve, &payload).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn rejects_structured_record_with_missing_field() {
        let payload = IngestPayload::Structured(vec![json!({"vds": 0.0, "vgs": 5.0})]);
        let err = parse_samples(TestType::IvCurve, &payload).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(_)));
    }

    #[test]
    fn parses_temperature_pairs() {
        let payload = IngestPayload::Delimited("temp,value\n25,2.5\n75,2.8\n".to_string());
        let samples = parse_samples(TestType::Temperature, &payload).unwrap();
        match samples {
            SampleSet::Temperature(points) => {
                assert_eq!(points[0], TemperatureSample { temperature_c: 25.0, value: 2.5 });
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn skips_blank_lines() {
        let payload = IngestPayload::Delimited("0,5,0\n\n1,5,0.1\n".to_string());
        let samples = parse_samples(TestType::IvCurve, &payload).unwrap();
        assert_eq!(samples.len(), 2);
    }
}
