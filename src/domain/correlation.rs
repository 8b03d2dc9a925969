// Correlation domain models
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Error percentage of one comparison. `Undefined` marks a comparison whose
/// measured value was zero with a non-zero extracted value: the division has
/// no result and the entry is kept out of the mean-error aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorPercentage {
    Defined(f64),
    Undefined,
}

impl ErrorPercentage {
    pub fn defined(&self) -> Option<f64> {
        match self {
            ErrorPercentage::Defined(value) => Some(*value),
            ErrorPercentage::Undefined => None,
        }
    }
}

// Serialized as a plain JSON number, or the string "undefined".
impl Serialize for ErrorPercentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ErrorPercentage::Defined(value) => serializer.serialize_f64(*value),
            ErrorPercentage::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

impl<'de> Deserialize<'de> for ErrorPercentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ErrorPercentageVisitor;

        impl Visitor<'_> for ErrorPercentageVisitor {
            type Value = ErrorPercentage;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a number or the string \"undefined\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ErrorPercentage::Defined(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ErrorPercentage::Defined(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ErrorPercentage::Defined(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == "undefined" {
                    Ok(ErrorPercentage::Undefined)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(ErrorPercentageVisitor)
    }
}

/// Comparison of one extracted parameter against its measured counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub parameter_name: String,
    pub extracted_value: f64,
    pub measured_value: f64,
    pub error_percentage: ErrorPercentage,
    pub correlation_score: f64,
    pub confidence_level: f64,
    pub within_tolerance: bool,
}

/// Which side of the comparison a parameter was present on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedSide {
    ExtractedOnly,
    MeasuredOnly,
}

/// A parameter present in only one of the two sets. Reported as-is, never
/// coerced into a zero-value comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedParameter {
    pub parameter_name: String,
    pub side: UnmatchedSide,
    pub value: f64,
}

/// Aggregate statistics over one correlation run. Means cover matched results
/// with a defined error percentage only; `None` when no such result exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub total_parameters: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub within_tolerance_count: usize,
    pub average_correlation_score: Option<f64>,
    pub average_error_percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// One complete comparison of an extracted parameter set against a dataset's
/// measured parameters. Terminal and immutable once persisted; the measured
/// values used at computation time are stored inside `results`, so deleting
/// the source dataset never alters a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationRun {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub test_dataset_id: String,
    pub tolerance_percentage: f64,
    pub confidence_threshold: f64,
    pub status: RunStatus,
    pub error: Option<String>,
    pub results: Vec<CorrelationResult>,
    pub unmatched: Vec<UnmatchedParameter>,
    pub summary: CorrelationSummary,
}
