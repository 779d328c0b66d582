use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;

use super::DetectionReport;

/// Mock audio detector: simulated bicoherence-based analysis.
///
/// A real implementation would extract LFCC features and run a trained
/// classifier; this stand-in emits a randomized feature map with the
/// real output shape.
pub fn detect_audio(_path: &Path) -> DetectionReport {
    let mut rng = rand::thread_rng();

    let confidence = round4(rng.gen_range(0.65..0.95));

    let mut features = BTreeMap::new();
    features.insert("mean_mag".to_string(), round6(rng.gen_range(0.10..0.50)));
    features.insert("var_mag".to_string(), round6(rng.gen_range(0.01..0.10)));
    features.insert("skew_mag".to_string(), round6(rng.gen_range(-1.0..1.0)));
    features.insert("kurt_mag".to_string(), round6(rng.gen_range(2.0..6.0)));
    features.insert("mean_phase".to_string(), round6(rng.gen_range(-0.5..0.5)));
    features.insert("var_phase".to_string(), round6(rng.gen_range(0.01..0.15)));
    features.insert("skew_phase".to_string(), round6(rng.gen_range(-0.8..0.8)));
    features.insert("kurt_phase".to_string(), round6(rng.gen_range(2.5..7.0)));

    let kurt_mag = features["kurt_mag"];
    let explanation = format!(
        "Bicoherence kurtosis of {:.4} exceeds human baseline of 2.8 ± 0.4, \
         indicating synthetically regular phase coupling consistent with \
         neural vocoder generation.",
        kurt_mag
    );

    DetectionReport {
        confidence,
        is_synthetic: true,
        explanation,
        flagged_frames: Vec::new(),
        features,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
