use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use trustchain::liability::{compute_liability, LiabilityContext, ModelRegistry};
use trustchain::store::EvidenceRecord;

const EXIT_SUCCESS: i32 = 0;
const EXIT_NOT_FOUND: i32 = 1;
const EXIT_IO: i32 = 2;
const EXIT_CONFIG: i32 = 4;

/// Contextual facts about how the content was made and distributed.
/// Mirrors the original upload form; every field has a conservative
/// default.
#[derive(Args, Debug)]
struct ContextArgs {
    /// Provenance/watermark metadata was removed before distribution
    #[arg(long)]
    disclosure_stripped: bool,

    /// Content was shared beyond private viewing
    #[arg(long)]
    content_distributed: bool,

    /// Content depicts a non-consenting identifiable person
    #[arg(long)]
    victim_impersonated: bool,

    /// Uploader has prior violations
    #[arg(long)]
    repeat_offender: bool,

    /// Distribution platform name (case-sensitive, exact match)
    #[arg(long, default_value = "Other")]
    platform: String,

    /// A takedown request was filed with the platform
    #[arg(long)]
    takedown_requested: bool,

    /// Hours the platform took to act after the takedown request
    #[arg(long, default_value_t = 999.0, value_parser = parse_non_negative_hours)]
    response_hours: f64,

    /// Approximate number of people exposed to the content
    #[arg(long, default_value_t = 0)]
    estimated_reach: u64,

    /// Generative model name, resolved against the model registry
    #[arg(long, default_value = "Unknown Model")]
    model: String,
}

fn parse_non_negative_hours(value: &str) -> Result<f64, String> {
    let hours: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if hours.is_nan() || hours < 0.0 {
        return Err("response hours must be a non-negative number".to_string());
    }
    Ok(hours)
}

impl ContextArgs {
    fn into_context(self) -> LiabilityContext {
        LiabilityContext {
            disclosure_stripped: self.disclosure_stripped,
            content_distributed: self.content_distributed,
            victim_impersonated: self.victim_impersonated,
            repeat_offender: self.repeat_offender,
            platform_name: self.platform,
            takedown_requested: self.takedown_requested,
            response_hours: self.response_hours,
            estimated_reach: self.estimated_reach,
            model_name: self.model,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline on a media file: hash, detect, anchor,
    /// score, and emit an evidence certificate
    Analyze {
        /// Media file to analyze
        file: PathBuf,

        #[command(flatten)]
        context: ContextArgs,

        /// Print the full record as JSON instead of the certificate
        #[arg(long)]
        json: bool,
    },
    /// Compute a liability apportionment from context facts alone
    Score {
        #[command(flatten)]
        context: ContextArgs,

        /// Print the apportionment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Hash a file and look it up in the local evidence store
    Verify {
        /// Media file to verify
        file: PathBuf,

        /// Print the verification result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-print the certificate for a stored evidence record
    Show {
        /// Record id (as printed by analyze)
        id: String,

        /// Print the full record as JSON instead of the certificate
        #[arg(long)]
        json: bool,
    },
    /// List the model registry
    Models,
}

#[derive(Parser, Debug)]
#[command(name = "trustchain")]
#[command(about = "Deepfake evidence certification CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/trustchain/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn verify_payload(
    file_hash: &str,
    record: Option<&EvidenceRecord>,
    chain: &trustchain::ledger::ChainStatus,
) -> serde_json::Value {
    serde_json::json!({
        "file_hash": file_hash,
        "registered_locally": record.is_some(),
        "record_id": record.map(|r| r.id.clone()),
        "ledger_tx_id": record.map(|r| r.ledger_tx_id.clone()),
        "chain": chain,
    })
}

fn main() {
    let cli = Cli::parse();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match trustchain::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Load the model registry once; it is read-only from here on and
    // passed by reference into every scoring call.
    let registry = match &config.registry {
        Some(path) => match ModelRegistry::load(path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Registry error: {}", e);
                std::process::exit(EXIT_CONFIG);
            }
        },
        None => ModelRegistry::builtin(),
    };

    // Validate registry at startup
    if let Err(errors) = trustchain::liability::validate_registry(&registry) {
        eprintln!("Model registry errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    if cli.verbose {
        eprintln!("Registry loaded: {} models", registry.len());
    }

    let records_dir = trustchain::config::data_dir(&config);
    let use_colors = trustchain::output::should_use_colors();

    match cli.command {
        Commands::Analyze { file, context, json } => {
            let ctx = context.into_context();

            let file_hash = match trustchain::hash::hash_file(&file) {
                Ok(h) => h,
                Err(e) => {
                    eprintln!("Hashing error: {}", e);
                    std::process::exit(EXIT_IO);
                }
            };
            if cli.verbose {
                eprintln!("SHA-256: {}", file_hash);
            }

            let (media_kind, detection) = match trustchain::detection::detect(&file) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Detection error: {}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            };
            if cli.verbose {
                eprintln!(
                    "Detection ({}): {} at {:.1}%",
                    media_kind.as_str(),
                    detection.label(),
                    detection.confidence * 100.0
                );
            }

            let id = Uuid::new_v4().to_string();

            let ledger = trustchain::ledger::Ledger::from_env();
            if cli.verbose && ledger.is_mock() {
                eprintln!("Ledger not configured; issuing mock receipt");
            }
            let ledger_tx_id = ledger.register(&file_hash, &id, "trustchain-user");

            let liability = compute_liability(&ctx, &registry);

            let certificate_path = records_dir.join(format!("{}.txt", id));
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());

            let record = EvidenceRecord {
                version: trustchain::store::RECORD_VERSION,
                id,
                filename,
                file_hash,
                timestamp: Utc::now(),
                media_kind,
                detection,
                ledger_tx_id,
                liability,
                certificate_path: Some(certificate_path.clone()),
                status: "processed".to_string(),
            };

            if let Err(e) = trustchain::store::save_record(&records_dir, &record) {
                eprintln!("Store error: {}", e);
                std::process::exit(EXIT_IO);
            }
            if let Err(e) = trustchain::output::write_certificate(&certificate_path, &record) {
                eprintln!("Certificate error: {}", e);
                std::process::exit(EXIT_IO);
            }

            if json {
                match serde_json::to_string_pretty(&record) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Serialization error: {}", e);
                        std::process::exit(EXIT_IO);
                    }
                }
            } else {
                println!(
                    "{}",
                    trustchain::output::format_verdict(&record.detection, use_colors)
                );
                println!();
                print!(
                    "{}",
                    trustchain::output::format_liability_table(&record.liability, use_colors)
                );
                println!();
                for (_, party) in record.liability.parties() {
                    println!(
                        "{}",
                        trustchain::output::wrap_for_terminal(&party.explanation)
                    );
                    if cli.verbose {
                        println!("{}", trustchain::output::format_party_factors(party));
                    }
                }
                println!();
                println!("Record ID:   {}", record.id);
                println!("Ledger TX:   {}", record.ledger_tx_id);
                println!("Certificate: {}", certificate_path.display());
            }
        }
        Commands::Score { context, json } => {
            let ctx = context.into_context();
            let result = compute_liability(&ctx, &registry);

            if json {
                match serde_json::to_string_pretty(&result) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Serialization error: {}", e);
                        std::process::exit(EXIT_IO);
                    }
                }
            } else {
                print!(
                    "{}",
                    trustchain::output::format_liability_table(&result, use_colors)
                );
                println!();
                for (_, party) in result.parties() {
                    println!(
                        "{}",
                        trustchain::output::wrap_for_terminal(&party.explanation)
                    );
                    if cli.verbose {
                        println!("{}", trustchain::output::format_party_factors(party));
                    }
                }
            }
        }
        Commands::Verify { file, json } => {
            let file_hash = match trustchain::hash::hash_file(&file) {
                Ok(h) => h,
                Err(e) => {
                    eprintln!("Hashing error: {}", e);
                    std::process::exit(EXIT_IO);
                }
            };

            let record = match trustchain::store::find_by_hash(&records_dir, &file_hash) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Store error: {}", e);
                    std::process::exit(EXIT_IO);
                }
            };

            let ledger = trustchain::ledger::Ledger::from_env();
            let chain = ledger.verify(&file_hash);

            if json {
                let payload = verify_payload(&file_hash, record.as_ref(), &chain);
                match serde_json::to_string_pretty(&payload) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Serialization error: {}", e);
                        std::process::exit(EXIT_IO);
                    }
                }
                if record.is_none() {
                    std::process::exit(EXIT_NOT_FOUND);
                }
            } else {
                println!("File SHA-256: {}", file_hash);
                if ledger.is_mock() {
                    println!("Ledger:       mock mode (no chain configured)");
                } else if chain.registered {
                    println!("Ledger:       anchored (case {})", chain.case_id);
                } else {
                    println!("Ledger:       not anchored on-chain");
                }
                match record {
                    Some(record) => {
                        println!("Registered:   yes");
                        println!("Record ID:    {}", record.id);
                        println!("Ledger TX:    {}", record.ledger_tx_id);
                        println!("Timestamp:    {}", record.timestamp.to_rfc3339());
                    }
                    None => {
                        println!("Registered:   no");
                        std::process::exit(EXIT_NOT_FOUND);
                    }
                }
            }
        }
        Commands::Show { id, json } => {
            let record = match trustchain::store::load_record(&records_dir, &id) {
                Ok(Some(r)) => r,
                Ok(None) => {
                    eprintln!("No record with id {}", id);
                    std::process::exit(EXIT_NOT_FOUND);
                }
                Err(e) => {
                    eprintln!("Store error: {}", e);
                    std::process::exit(EXIT_IO);
                }
            };

            if json {
                match serde_json::to_string_pretty(&record) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Serialization error: {}", e);
                        std::process::exit(EXIT_IO);
                    }
                }
            } else {
                print!("{}", trustchain::output::format_certificate(&record));
            }
        }
        Commands::Models => {
            println!(
                "{:<18} {:>9} {:>7} {:<24} {:>9}",
                "Model", "Watermark", "Filter", "Access", "Incidents"
            );
            for (name, entry) in registry.sorted_entries() {
                println!(
                    "{:<18} {:>9} {:>7} {:<24} {:>9}",
                    name,
                    if entry.has_watermark { "yes" } else { "no" },
                    if entry.has_content_filter { "yes" } else { "no" },
                    entry.access_type.as_str(),
                    entry.known_incidents
                );
            }
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustchain::ledger::ChainStatus;

    #[test]
    fn test_negative_response_hours_rejected() {
        let result = Cli::try_parse_from(["trustchain", "score", "--response-hours=-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_nan_response_hours_rejected() {
        let result = Cli::try_parse_from(["trustchain", "score", "--response-hours=nan"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_hours_parses_and_defaults() {
        let cli = Cli::try_parse_from(["trustchain", "score", "--response-hours=36"]).unwrap();
        match cli.command {
            Commands::Score { context, .. } => assert_eq!(context.response_hours, 36.0),
            _ => panic!("expected score subcommand"),
        }

        let cli = Cli::try_parse_from(["trustchain", "score"]).unwrap();
        match cli.command {
            Commands::Score { context, .. } => assert_eq!(context.response_hours, 999.0),
            _ => panic!("expected score subcommand"),
        }
    }

    #[test]
    fn test_verify_payload_renders_pretty() {
        let chain = ChainStatus {
            registered: false,
            timestamp: 0,
            case_id: String::new(),
        };
        let payload = verify_payload("deadbeef", None, &chain);
        let rendered = serde_json::to_string_pretty(&payload).unwrap();
        assert!(rendered.contains('\n'));
        assert!(rendered.contains("\"registered_locally\": false"));
        assert!(rendered.contains("\"file_hash\": \"deadbeef\""));
    }
}
