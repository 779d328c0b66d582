mod audio;
mod video;

pub use audio::detect_audio;
pub use video::detect_video;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

const VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "mkv"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Unknown,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if VIDEO_EXTS.contains(&ext.as_str()) {
            MediaKind::Video
        } else if AUDIO_EXTS.contains(&ext.as_str()) {
            MediaKind::Audio
        } else {
            MediaKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Unknown => "unknown",
        }
    }
}

/// Detector output for one media file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionReport {
    pub confidence: f64,
    pub is_synthetic: bool,
    pub explanation: String,

    /// Frame indices flagged by the video detector (video only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flagged_frames: Vec<u32>,

    /// Bicoherence feature statistics (audio only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, f64>,
}

impl DetectionReport {
    pub fn label(&self) -> &'static str {
        if self.is_synthetic {
            "SYNTHETIC"
        } else {
            "AUTHENTIC"
        }
    }

    fn unsupported() -> Self {
        Self {
            confidence: 0.0,
            is_synthetic: false,
            explanation: "Unsupported file type; no analysis performed.".to_string(),
            flagged_frames: Vec::new(),
            features: BTreeMap::new(),
        }
    }
}

/// Dispatch on media kind and run the detector.
///
/// The detectors are stand-ins for an unspecified ML model: in the
/// default mock mode they emit randomized but correctly shaped reports.
/// Setting `DETECTION_MODE=real` is an explicit error until a trained
/// model is wired in.
pub fn detect(path: &Path) -> Result<(MediaKind, DetectionReport)> {
    let kind = MediaKind::from_path(path);
    if kind == MediaKind::Unknown {
        return Ok((kind, DetectionReport::unsupported()));
    }

    if env::var("DETECTION_MODE").as_deref() == Ok("real") {
        bail!("Real detection mode requires a trained model.");
    }

    let report = if kind == MediaKind::Video {
        detect_video(path)
    } else {
        detect_audio(path)
    };

    Ok((kind, report))
}
