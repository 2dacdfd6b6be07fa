// dxlookup command line
//
// dxlookup [--config FILE] [--source KIND=PATH]... [--at RFC3339] CALL...
//
// Prints one JSON line per call. Exits non-zero only when reference data
// cannot be loaded or the arguments are unusable.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;

use dxlookup::cache::{store_from_config, CachedResolver};
use dxlookup::{LookupConfig, LookupError, ReferenceStore, ResolvedEntity, SourceConfig};

/// Resolve amateur radio callsigns to DXCC entities
#[derive(Parser, Debug)]
#[command(name = "dxlookup", version, about)]
struct Cli {
    /// JSON config file (default: $DXLOOKUP_CONFIG, else built-in data only)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference data file as KIND=PATH (cty_dat, clublog_xml, countryfile_json); replaces configured sources
    #[arg(long = "source", value_name = "KIND=PATH")]
    sources: Vec<String>,

    /// Resolve as of this instant instead of now
    #[arg(long, value_name = "RFC3339")]
    at: Option<String>,

    /// Print reference data statistics before the lookups
    #[arg(long)]
    stats: bool,

    /// Callsigns to resolve
    calls: Vec<String>,
}

fn load_config(cli: &Cli) -> Result<LookupConfig, LookupError> {
    let mut config = match &cli.config {
        Some(path) => LookupConfig::load(path)?,
        None => LookupConfig::from_env()?,
    };
    if !cli.sources.is_empty() {
        config.sources = cli
            .sources
            .iter()
            .map(|s| SourceConfig::parse_arg(s))
            .collect::<Result<_, _>>()?;
    }
    Ok(config)
}

fn parse_at(text: &str) -> Result<DateTime<Utc>, LookupError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LookupError::Config(format!("invalid --at {:?}: {}", text, e)))
}

fn print_result(call: &str, result: &Result<ResolvedEntity, LookupError>) {
    let line = match result {
        Ok(resolved) => serde_json::to_value(resolved).unwrap_or_else(|e| {
            serde_json::json!({ "callsign": call, "error": "Serialization", "message": e.to_string() })
        }),
        Err(e) => serde_json::json!({ "callsign": call, "error": e.kind(), "message": e.to_string() }),
    };
    println!("{}", line);
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging - default to info level for our crate
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("dxlookup=info")).init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };
    let at = match cli.at.as_deref().map(parse_at).transpose() {
        Ok(at) => at,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let generation = match dxlookup::load_generation_async(config.clone()).await {
        Ok(g) => g,
        Err(e) => {
            log::error!("Failed to load reference data: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.stats {
        match serde_json::to_string(&generation.stats()) {
            Ok(stats) => println!("{}", stats),
            Err(e) => log::warn!("Failed to serialize stats: {}", e),
        }
    }

    match at {
        Some(at) => {
            for (call, result) in cli.calls.iter().zip(generation.resolve_batch_at(cli.calls.as_slice(), at)) {
                print_result(call, &result);
            }
        }
        None if config.cache.enabled => {
            let store = match store_from_config(&config.cache).await {
                Ok(s) => s,
                Err(e) => {
                    log::error!("Failed to open lookup cache: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let references = Arc::new(ReferenceStore::new(generation));
            let resolver = CachedResolver::new(references, store, config.cache.timeout());
            for call in &cli.calls {
                print_result(call, &resolver.resolve(call).await);
            }
        }
        None => {
            for (call, result) in cli.calls.iter().zip(generation.resolve_batch(cli.calls.as_slice())) {
                print_result(call, &result);
            }
        }
    }

    ExitCode::SUCCESS
}
