//! # awdt-node
//!
//! Command line entry point.
//!
//! ```text
//! awdt-node run --action boot --crypto pqc --variant ML-DSA-65 --scenario 3
//! awdt-node run --action update --crypto classic --scenario 8 --reboots 3
//! awdt-node keygen --variant ed25519
//! awdt-node flag-compromised [--clear]
//! awdt-node provider-info
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use awdt_bus::RunOutcome;
use awdt_crypto::{provider_for, provision_keys};
use awdt_node::{config, resolve_policy, Action, Coordinator, NodeConfig};
use awdt_server::set_compromised;
use awdt_storage::{FileSystemStore, ObjectStore};
use awdt_telemetry::{encode_metrics, init_telemetry, PrometheusHook, TelemetryConfig};
use awdt_types::{CryptoMode, HashAlgorithm, SignatureVariant};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

/// AWDT node: device and server roles of the Attestation Watchdog Timer
#[derive(Parser, Debug)]
#[command(name = "awdt-node", version)]
#[command(about = "Run and benchmark the AWDT attestation protocol")]
struct Cli {
    /// Root of the file-backed store
    #[arg(long, global = true, env = "AWDT_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Debug logging unless AWDT_LOG_LEVEL or RUST_LOG say otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Boot the device or push an update, rebooting after each reset
    Run(RunArgs),

    /// Generate device and server keys for a variant
    Keygen {
        #[arg(long, default_value = "secp256r1")]
        variant: SignatureVariant,
    },

    /// Mark the device as compromised on the server
    FlagCompromised {
        /// Remove the flag instead
        #[arg(long)]
        clear: bool,
    },

    /// Print key and signature sizes of every supported scheme
    ProviderInfo,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// What starts the run
    #[arg(long, value_enum, default_value_t = ActionArg::Boot)]
    action: ActionArg,

    /// Crypto mode: none, classic or pqc
    #[arg(long)]
    crypto: Option<CryptoMode>,

    /// Signature scheme (defaults to the mode's default)
    #[arg(long)]
    variant: Option<SignatureVariant>,

    /// Prehash for classical ECDSA
    #[arg(long)]
    hash: Option<HashAlgorithm>,

    /// Benchmarking scenario 1-8
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=8))]
    scenario: Option<u8>,

    /// Boot cycles allowed after a reset
    #[arg(long)]
    reboots: Option<u32>,

    /// Seconds before a cycle counts as failed
    #[arg(long)]
    timeout: Option<u64>,

    /// Keep everything in memory
    #[arg(long)]
    in_memory: bool,

    /// Use the staging area as it is instead of arranging the scenario
    #[arg(long)]
    no_prepare: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    metrics: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Boot,
    Update,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Boot => Action::Boot,
            ActionArg::Update => Action::PushUpdate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_telemetry(&TelemetryConfig::from_env().verbose(cli.verbose))
        .context("Failed to initialize telemetry")?;

    let mut config = NodeConfig::from_env().context("Invalid AWDT_* environment")?;
    if let Some(dir) = cli.storage_dir {
        config.storage.base_dir = dir;
    }

    match cli.command {
        Command::Run(args) => run(config, args).await,
        Command::Keygen { variant } => {
            let store = open_store(&config)?;
            provision_keys(store.as_ref(), variant).context("Key generation failed")?;
            info!(variant = %variant, dir = %config.storage.base_dir.display(), "keys written");
            Ok(ExitCode::SUCCESS)
        }
        Command::FlagCompromised { clear } => {
            let store = open_store(&config)?;
            set_compromised(store.as_ref(), !clear).context("Failed to update compromised flag")?;
            info!(compromised = !clear, "compromised flag updated");
            Ok(ExitCode::SUCCESS)
        }
        Command::ProviderInfo => {
            provider_info()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(mut config: NodeConfig, args: RunArgs) -> Result<ExitCode> {
    if args.crypto.is_some() || args.variant.is_some() || args.hash.is_some() {
        let mode = args.crypto.unwrap_or(config.crypto.mode());
        config.crypto = resolve_policy(mode, args.variant, args.hash)?;
    }
    if let Some(id) = args.scenario {
        config.run.scenario = Some(config::scenario(id)?);
    }
    if let Some(reboots) = args.reboots {
        config.run.reboots = reboots;
    }
    if let Some(secs) = args.timeout {
        config.run.timeout = Duration::from_secs(secs);
    }
    config.storage.in_memory |= args.in_memory;
    config.run.prepare_scenario &= !args.no_prepare;
    config.validate()?;

    let coordinator = Coordinator::open(config)
        .context("Failed to open storage")?
        .with_hook(Arc::new(PrometheusHook::new()));
    let report = coordinator.run(args.action.into()).await?;

    for (index, cycle) in report.cycles.iter().enumerate() {
        println!(
            "cycle {:>2}  {:<6}  {:<28}  {:>8.3}s",
            index + 1,
            cycle.action,
            cycle.outcome.to_string(),
            cycle.elapsed.as_secs_f64()
        );
    }
    println!(
        "run {}  outcome: {}  elapsed: {:.3}s",
        report.run_id,
        report.outcome(),
        report.elapsed.as_secs_f64()
    );
    if args.metrics {
        print!("{}", encode_metrics()?);
    }

    Ok(match report.outcome() {
        RunOutcome::TimedOut => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    })
}

fn open_store(config: &NodeConfig) -> Result<Arc<dyn ObjectStore>> {
    let store = FileSystemStore::open(config.storage.base_dir.clone())
        .with_context(|| format!("Failed to open {}", config.storage.base_dir.display()))?;
    Ok(Arc::new(store))
}

fn provider_info() -> Result<()> {
    println!(
        "{:<10} {:<10} {:>8} {:>8} {:>8}  security",
        "variant", "family", "pub", "priv", "sig"
    );
    for variant in SignatureVariant::SIGNING {
        let meta = provider_for(variant)?.metadata(variant)?;
        println!(
            "{:<10} {:<10} {:>8} {:>8} {:>8}  {}",
            variant.as_str(),
            meta.family.as_str(),
            meta.public_key_bytes,
            meta.private_key_bytes,
            meta.signature_bytes,
            meta.security_level
        );
    }
    Ok(())
}
