// Parameter extractor - canonical measured values from raw samples
use crate::application::error::{EngineError, EngineResult};
use crate::domain::dataset::{CvSample, IvSample, SampleSet, TemperatureSample, TestDataset, TestType};
use std::collections::{BTreeMap, HashMap};

// Canonical parameter names emitted by the extractor.
pub const VTH: &str = "vth";
pub const RDS_ON: &str = "rds_on";
pub const ID_MAX: &str = "id_max";
pub const VDS_MAX: &str = "vds_max";
pub const CISS: &str = "ciss";
pub const COSS: &str = "coss";
pub const CRSS: &str = "crss";
pub const TEMP_COEFFICIENT: &str = "temp_coefficient";
pub const ROOM_TEMP_VALUE: &str = "room_temp_value";

/// Derive the measured parameter map from a dataset's raw samples.
///
/// A pure function of the dataset: the same input always yields bit-identical
/// output. Parameters that cannot be derived from a particular sweep (no
/// zero-current crossing, too few conducting points) are omitted from the map
/// and surface as unmatched in correlation. `InsufficientData` is returned
/// only when the test type's reduction is impossible outright.
pub fn extract_parameters(dataset: &TestDataset) -> EngineResult<BTreeMap<String, f64>> {
    match (&dataset.test_type, &dataset.samples) {
        (TestType::IvCurve, SampleSet::IvCurve(points)) => extract_iv(points),
        (TestType::CvCurve, SampleSet::CvCurve(points)) => extract_cv(points, bias_point(dataset)),
        (TestType::Temperature, SampleSet::Temperature(points)) => extract_temperature(points),
        // No extraction rules exist for frequency/noise/aging sweeps; the
        // dataset is stored and retrievable, correlation reports every
        // submitted parameter as unmatched.
        _ => Ok(BTreeMap::new()),
    }
}

/// Documented C-V bias point: 0 V unless `voltage_range` is a single number.
fn bias_point(dataset: &TestDataset) -> f64 {
    dataset
        .voltage_range
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Most frequent gate-source voltage, grouped on exact bit patterns.
/// Ties break toward the smaller voltage.
fn mode_vgs(points: &[IvSample]) -> Option<f64> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for p in points {
        *counts.entry(p.vgs.to_bits()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(bits, count)| (f64::from_bits(bits), count))
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.total_cmp(&a.0)))
        .map(|(vgs, _)| vgs)
}

fn extract_iv(points: &[IvSample]) -> EngineResult<BTreeMap<String, f64>> {
    if points.is_empty() {
        return Err(EngineError::InsufficientData { parameter: ID_MAX, needed: 1, got: 0 });
    }

    let mut out = BTreeMap::new();

    let id_max = points.iter().map(|p| p.ids).fold(f64::MIN, f64::max);
    let vds_max = points.iter().map(|p| p.vds).fold(f64::MIN, f64::max);
    out.insert(ID_MAX.to_string(), id_max);
    out.insert(VDS_MAX.to_string(), vds_max);

    // Vth and Rds_on are read along the sweep at the dominant gate voltage.
    let vgs = match mode_vgs(points) {
        Some(vgs) => vgs,
        None => return Ok(out),
    };
    let at_vgs: Vec<&IvSample> = points.iter().filter(|p| p.vgs == vgs).collect();

    // Threshold voltage: vds at the first zero-to-nonzero current crossing.
    for pair in at_vgs.windows(2) {
        if pair[0].ids == 0.0 && pair[1].ids != 0.0 {
            out.insert(VTH.to_string(), pair[1].vds);
            break;
        }
    }

    // On-resistance: slope ΔV/ΔI between the two lowest-vds conducting points.
    let mut conducting: Vec<&IvSample> = at_vgs.iter().copied().filter(|p| p.ids != 0.0).collect();
    conducting.sort_by(|a, b| a.vds.total_cmp(&b.vds));
    if let [first, second, ..] = conducting.as_slice() {
        let delta_i = second.ids - first.ids;
        if delta_i != 0.0 {
            out.insert(RDS_ON.to_string(), (second.vds - first.vds) / delta_i);
        }
    }

    Ok(out)
}

fn extract_cv(points: &[CvSample], bias: f64) -> EngineResult<BTreeMap<String, f64>> {
    let at_bias = points
        .iter()
        .min_by(|a, b| (a.v_bias - bias).abs().total_cmp(&(b.v_bias - bias).abs()))
        .ok_or(EngineError::InsufficientData { parameter: CISS, needed: 1, got: 0 })?;

    let mut out = BTreeMap::new();
    out.insert(CISS.to_string(), at_bias.ciss);
    out.insert(COSS.to_string(), at_bias.coss);
    out.insert(CRSS.to_string(), at_bias.crss);
    Ok(out)
}

fn extract_temperature(points: &[TemperatureSample]) -> EngineResult<BTreeMap<String, f64>> {
    if points.len() < 2 {
        return Err(EngineError::InsufficientData {
            parameter: TEMP_COEFFICIENT,
            needed: 2,
            got: points.len(),
        });
    }

    let n = points.len() as f64;
    let mean_t = points.iter().map(|p| p.temperature_c).sum::<f64>() / n;
    let mean_v = points.iter().map(|p| p.value).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|p| (p.temperature_c - mean_t).powi(2)).sum();
    if sxx == 0.0 {
        // Every sample sits at the same temperature; no slope exists.
        return Err(EngineError::InsufficientData {
            parameter: TEMP_COEFFICIENT,
            needed: 2,
            got: 1,
        });
    }
    let sxy: f64 = points
        .iter()
        .map(|p| (p.temperature_c - mean_t) * (p.value - mean_v))
        .sum();

    let slope = sxy / sxx;
    let intercept = mean_v - slope * mean_t;

    let mut out = BTreeMap::new();
    out.insert(TEMP_COEFFICIENT.to_string(), slope);
    out.insert(ROOM_TEMP_VALUE.to_string(), intercept + slope * 25.0);
    Ok(out)
}
