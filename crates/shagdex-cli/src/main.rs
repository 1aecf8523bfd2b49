use clap::{Parser, Subcommand};
use serde_json::json;
use shagdex_core::cache::AnswerCache;
use shagdex_core::config::{self, EngineConfig};
use shagdex_core::orchestrator::Orchestrator;
use shagdex_core::providers::llm::anthropic::AnthropicOracle;
use shagdex_core::store::{self, merge, RecordSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "shagdex",
    version,
    about = "Ask questions about the competitive shag contest archive"
)]
struct Cli {
    /// Engine config file (YAML). Missing file means defaults.
    #[arg(long, global = true, env = "SHAGDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Archive snapshot path, overriding the config.
    #[arg(long, global = true, env = "SHAGDEX_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question and print the answer.
    Ask(AskArgs),
    /// Report engine health: data loaded, record count, API configured.
    Doctor,
    /// Merge a batch of rows into the archive snapshot, offline.
    Update(UpdateArgs),
}

#[derive(Parser)]
struct AskArgs {
    /// The question, in plain English.
    question: Vec<String>,

    /// Skip the answer cache for this question.
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
struct UpdateArgs {
    /// Batch CSV with the same schema as the snapshot.
    batch: PathBuf,

    /// Skip the timestamped pre-merge backup.
    #[arg(long)]
    no_backup: bool,
}

mod exit_codes {
    pub const OK: i32 = 0;
    pub const DEGRADED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    match cli.cmd {
        Command::Ask(args) => cmd_ask(config, args).await,
        Command::Doctor => cmd_doctor(config),
        Command::Update(args) => cmd_update(config, args),
    }
}

async fn cmd_ask(config: EngineConfig, args: AskArgs) -> anyhow::Result<i32> {
    let question = args.question.join(" ");

    // A bad snapshot degrades the assistant instead of aborting the process.
    let records = match store::load(&config.data_path) {
        Ok(set) => Some(Arc::new(set)),
        Err(e) => {
            warn!(error = %e, "archive snapshot unavailable, answering degraded");
            None
        }
    };

    let Some(api_key) = config::api_key() else {
        eprintln!(
            "error: {} is not set; the assistant cannot reach its model",
            config::API_KEY_VAR
        );
        return Ok(exit_codes::CONFIG_ERROR);
    };
    let oracle = AnthropicOracle::new(
        api_key,
        config.model.clone(),
        config.max_tokens,
        config.oracle_timeout(),
    )?;

    let cache = if args.no_cache {
        AnswerCache::disabled()
    } else {
        AnswerCache::new(config.cache_capacity, config.cache_ttl())
    };

    let orchestrator = Orchestrator::new(
        Arc::new(oracle),
        records,
        cache,
        config.max_rounds,
        config.retry_backoff(),
        config.sample_rows,
    );
    println!("{}", orchestrator.answer(&question).await);
    Ok(exit_codes::OK)
}

fn cmd_doctor(config: EngineConfig) -> anyhow::Result<i32> {
    let loaded: Option<RecordSet> = match store::load(&config.data_path) {
        Ok(set) => Some(set),
        Err(e) => {
            warn!(error = %e, "doctor: snapshot failed to load");
            None
        }
    };
    let api_configured = config::api_key().is_some();
    let healthy = loaded.is_some() && api_configured;

    let report = json!({
        "status": if healthy { "ok" } else { "degraded" },
        "data_path": config.data_path,
        "data_loaded": loaded.is_some(),
        "total_records": loaded.as_ref().map(RecordSet::len).unwrap_or(0),
        "fingerprint": loaded.as_ref().map(|s| s.fingerprint()[..12].to_string()),
        "api_configured": api_configured,
        "model": config.model,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if healthy {
        exit_codes::OK
    } else {
        exit_codes::DEGRADED
    })
}

fn cmd_update(config: EngineConfig, args: UpdateArgs) -> anyhow::Result<i32> {
    let summary = merge::merge_snapshot(&config.data_path, &args.batch, !args.no_backup)?;
    println!(
        "merged {}: {} updated, {} added, {} total records",
        args.batch.display(),
        summary.updated,
        summary.added,
        summary.total
    );
    if let Some(backup) = summary.backup {
        println!("backup written to {}", backup.display());
    }
    Ok(exit_codes::OK)
}
