use anyhow::{Context, Result};
use blockling_core::formation::FormationLibrary;
use blockling_core::{init_logging, parse_block, SimConfig};
use blockling_data::BlockSeed;
use blockling_lib::Simulation;
use blockling_pool::WorkerPool;
use clap::Parser;
use std::path::Path;

/// Runs a blockling session headless and prints the final particle stats.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Block nonce
    #[arg(short, long, required_unless_present = "block")]
    nonce: Option<i64>,

    /// Block hash (hex, optional "0x" prefix); needs --timestamp
    #[arg(long, requires = "timestamp")]
    hash: Option<String>,

    /// Block timestamp in seconds
    #[arg(long, requires = "hash")]
    timestamp: Option<i64>,

    /// JSON block record to read instead of --nonce/--hash/--timestamp
    #[arg(short, long, conflicts_with_all = ["nonce", "hash", "timestamp"])]
    block: Option<String>,

    /// Number of physics steps to run
    #[arg(short, long, default_value_t = 600)]
    steps: u64,

    /// Step length in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// Custom config file path
    #[arg(short, long, default_value = "blockling.toml")]
    config: String,
}

fn load_config(path: &str) -> Result<SimConfig> {
    if !Path::new(path).exists() {
        tracing::info!(path, "No config file, using defaults");
        return Ok(SimConfig::default());
    }
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    SimConfig::from_toml(&content).with_context(|| format!("parsing {path}"))
}

fn load_block(args: &Args) -> Result<BlockSeed> {
    if let Some(path) = &args.block {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        return Ok(parse_block(&json)?);
    }
    let mut block = BlockSeed {
        nonce: args.nonce,
        ..Default::default()
    };
    if let (Some(hash), Some(ts)) = (&args.hash, args.timestamp) {
        block = block.with_hash(hash.clone(), ts);
    }
    Ok(block)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let block = load_block(&args)?;
    tracing::info!(fingerprint = %config.fingerprint(), "Configuration loaded");

    let library = FormationLibrary::standard(
        &config.session.particle_counts,
        config.session.formation_radius,
    );
    let pool = WorkerPool::with_builtin_bodies(config.pool.clone(), config.physics.clone());
    let mut sim = Simulation::from_block(&block, &config, &library)?;

    let outcome = sim.run(&pool, args.steps, args.dt).await;
    let stats = match outcome {
        Ok(()) => sim.stats(&pool).await,
        Err(e) => Err(e),
    };
    let pool_metrics = pool.metrics().snapshot();
    pool.shutdown();
    let stats = stats?;

    tracing::info!(
        steps = sim.metrics().step_count(),
        elapsed_ms = sim.metrics().elapsed().as_millis() as u64,
        dispatched = pool_metrics.dispatched,
        units_spawned = pool_metrics.units_spawned,
        "Headless session finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
