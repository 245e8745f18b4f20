use asnetgen::orchestrator::{run, RunOptions};
use asnetgen::policy_config::{load_policy_config, PolicyConfig};
use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

/// Compile multi-AS network intent into IPv6 router configurations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the intent JSON file
    intent_file: PathBuf,

    /// Output directory for router configuration files
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Where to write the filled intent (defaults to <intent>_filled.json)
    #[arg(long)]
    filled: Option<PathBuf>,

    /// YAML file overriding communities and local preferences
    #[arg(long)]
    policy: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Intent file: {:?}", args.intent_file);
    info!("Output directory: {:?}", args.output);

    let policy = match &args.policy {
        Some(path) => load_policy_config(path)?,
        None => PolicyConfig::default(),
    };

    let summary = run(&RunOptions {
        intent_path: args.intent_file,
        output_dir: args.output,
        filled_path: args.filled,
        policy,
    })?;

    info!("Filled intent written to {:?}", summary.filled_path);
    info!("Compilation completed successfully");
    Ok(())
}
