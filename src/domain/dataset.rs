// Test dataset domain models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of silicon measurement a dataset holds. Determines the sample shape
/// and which parameters can be extracted from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    IvCurve,
    CvCurve,
    Temperature,
    Frequency,
    Noise,
    Aging,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::IvCurve => "iv_curve",
            TestType::CvCurve => "cv_curve",
            TestType::Temperature => "temperature",
            TestType::Frequency => "frequency",
            TestType::Noise => "noise",
            TestType::Aging => "aging",
        }
    }

    pub fn parse(s: &str) -> Option<TestType> {
        match s {
            "iv_curve" => Some(TestType::IvCurve),
            "cv_curve" => Some(TestType::CvCurve),
            "temperature" => Some(TestType::Temperature),
            "frequency" => Some(TestType::Frequency),
            "noise" => Some(TestType::Noise),
            "aging" => Some(TestType::Aging),
            _ => None,
        }
    }
}

/// One point of an I-V sweep: drain-source voltage, gate-source voltage,
/// drain current, in that column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvSample {
    pub vds: f64,
    pub vgs: f64,
    pub ids: f64,
}

/// One point of a C-V sweep: bias voltage plus the three device capacitances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CvSample {
    pub v_bias: f64,
    pub ciss: f64,
    pub coss: f64,
    pub crss: f64,
}

/// One point of a temperature sweep: temperature in °C and the tracked value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    pub temperature_c: f64,
    pub value: f64,
}

/// Generic two-column point used by frequency, noise and aging datasets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepSample {
    pub x: f64,
    pub y: f64,
}

/// Ordered measurement samples, tagged by test type so each shape carries its
/// own strict column contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "shape", content = "points")]
pub enum SampleSet {
    IvCurve(Vec<IvSample>),
    CvCurve(Vec<CvSample>),
    Temperature(Vec<TemperatureSample>),
    Sweep(Vec<SweepSample>),
}

impl SampleSet {
    pub fn len(&self) -> usize {
        match self {
            SampleSet::IvCurve(points) => points.len(),
            SampleSet::CvCurve(points) => points.len(),
            SampleSet::Temperature(points) => points.len(),
            SampleSet::Sweep(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A stored collection of measured samples for one device/test combination.
/// Samples are a value: immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDataset {
    pub id: String,
    pub device_id: String,
    pub test_type: TestType,
    pub temperature: Option<f64>,
    pub voltage_range: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub samples: SampleSet,
}

impl TestDataset {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
