use rand::seq::index::sample;
use rand::Rng;
use std::path::Path;

use super::DetectionReport;

/// Mock video detector: simulated frame-level analysis.
///
/// A real implementation would extract frames and run per-frame
/// inference against a deepfake classifier; until a trained model
/// exists this emits a randomized report with the real output shape.
pub fn detect_video(_path: &Path) -> DetectionReport {
    let mut rng = rand::thread_rng();

    let confidence = round4(rng.gen_range(0.65..0.95));
    let num_flagged = rng.gen_range(3..=5);
    let total_frames = rng.gen_range(120..=900usize);

    let mut flagged_frames: Vec<u32> = sample(&mut rng, total_frames, num_flagged)
        .into_iter()
        .map(|i| i as u32)
        .collect();
    flagged_frames.sort_unstable();

    let explanation = format!(
        "Temporal inconsistency detected across {} frames (indices: {:?}). \
         Facial boundary blending artifacts and unnatural eye-blink cadence \
         suggest GAN-based face-swap synthesis.",
        num_flagged, flagged_frames
    );

    DetectionReport {
        confidence,
        is_synthetic: true,
        explanation,
        flagged_frames,
        features: Default::default(),
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
