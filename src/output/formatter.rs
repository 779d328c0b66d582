use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Write};
use std::path::Path;
use terminal_size::{terminal_size, Width};

use crate::detection::DetectionReport;
use crate::liability::{ApportionmentResult, PartyScore};
use crate::store::EvidenceRecord;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Wrap text at word boundaries to fit `width` columns.
fn wrap(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

/// Format the detection verdict line for console output
pub fn format_verdict(detection: &DetectionReport, use_colors: bool) -> String {
    let label = if detection.is_synthetic {
        "SYNTHETIC (AI-Generated)"
    } else {
        "AUTHENTIC"
    };

    if use_colors {
        let colored = if detection.is_synthetic {
            label.red().bold().to_string()
        } else {
            label.green().bold().to_string()
        };
        format!(
            "Verdict: {} (confidence {:.1}%)",
            colored,
            detection.confidence * 100.0
        )
    } else {
        format!(
            "Verdict: {} (confidence {:.1}%)",
            label,
            detection.confidence * 100.0
        )
    }
}

/// Format the three-party liability split as a fixed-width table
pub fn format_liability_table(result: &ApportionmentResult, use_colors: bool) -> String {
    let mut out = String::new();

    let header = format!("{:<20} {:>11} {:>11}", "Party", "Liability %", "Raw Score");
    if use_colors {
        out.push_str(&header.bold().to_string());
    } else {
        out.push_str(&header);
    }
    out.push('\n');

    for (label, party) in result.parties() {
        out.push_str(&format!(
            "{:<20} {:>10}% {:>11.4}",
            label, party.percentage, party.raw_score
        ));
        out.push('\n');
    }

    out
}

/// Per-factor detail lines for one party (for verbose output)
pub fn format_party_factors(party: &PartyScore) -> String {
    party
        .factors
        .iter()
        .map(|factor| {
            format!(
                "  {:<22} {:.2}/{:.2}  {}",
                factor.name, factor.points, factor.max_points, factor.legal_basis
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the full plain-text evidence certificate.
///
/// Mirrors the section layout of the original PDF certificate: header,
/// evidence metadata, detection results, liability attribution, legal
/// framework, and a verification pointer. Written to a file, so wrapping
/// is fixed at 72 columns regardless of terminal size.
pub fn format_certificate(record: &EvidenceRecord) -> String {
    const RULE: &str =
        "========================================================================";
    const WRAP_COLS: usize = 72;

    let mut out = String::new();

    out.push_str(RULE);
    out.push('\n');
    out.push_str("TRUSTCHAIN\nAI Deepfake Evidence Certificate\n");
    out.push_str(RULE);
    out.push_str("\n\n");

    out.push_str(&format!("Event ID        : {}\n", record.id));
    out.push_str(&format!("File            : {}\n", record.filename));
    out.push_str(&format!("File SHA-256    : {}\n", record.file_hash));
    out.push_str(&format!("Ledger TX       : {}\n", record.ledger_tx_id));
    out.push_str(&format!(
        "Timestamp (UTC) : {}\n",
        record.timestamp.to_rfc3339()
    ));
    out.push_str(&format!("Media Type      : {}\n\n", record.media_kind.as_str()));

    out.push_str("DETECTION RESULTS\n-----------------\n");
    out.push_str(&format!("Verdict    : {}\n", record.detection.label()));
    out.push_str(&format!(
        "Confidence : {:.1}%\n",
        record.detection.confidence * 100.0
    ));
    out.push_str("Analysis   :\n");
    out.push_str(&wrap(&record.detection.explanation, WRAP_COLS));
    out.push_str("\n\n");

    out.push_str("LIABILITY ATTRIBUTION\n---------------------\n");
    out.push_str(&format_liability_table(&record.liability, false));
    out.push('\n');

    for (_, party) in record.liability.parties() {
        out.push_str(&wrap(&party.explanation, WRAP_COLS));
        out.push('\n');
    }
    out.push('\n');

    out.push_str("LEGAL FRAMEWORK\n---------------\n");
    out.push_str(&wrap(
        "This certificate has evidentiary value under Section 65B of the \
         Indian Evidence Act, 1872 (electronic record admissibility) and \
         BSA §63 provisions for digital evidence. The ledger transaction \
         id constitutes a tamper-evident record. Liability attribution \
         follows IT Act 2000 §66E, §72A, §79 and EU AI Act Articles 9, 13.",
        WRAP_COLS,
    ));
    out.push_str("\n\n");

    out.push_str("VERIFICATION\n------------\n");
    out.push_str(&format!(
        "Re-run `trustchain verify <file>` against the original media, or\n\
         `trustchain show {}` to re-print this record.\n",
        record.id
    ));
    out.push_str(RULE);
    out.push('\n');

    out
}

/// Write the certificate to disk atomically.
pub fn write_certificate(path: &Path, record: &EvidenceRecord) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open certificate file at {}", path.display()))?;
    file.write_all(format_certificate(record).as_bytes())
        .with_context(|| format!("Failed to write certificate at {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save certificate at {}", path.display()))?;
    Ok(())
}

/// Wrap explanation text for console display, honoring terminal width.
pub fn wrap_for_terminal(text: &str) -> String {
    let width = get_terminal_width().unwrap_or(80).min(100);
    wrap(text, width)
}
