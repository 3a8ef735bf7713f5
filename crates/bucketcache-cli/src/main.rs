//! bucketcache CLI entrypoint.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod handlers;

use bucketcache::{CacheConfig, ObjectCache};
use commands::{Commands, ConfigOverrides};

#[derive(Parser)]
#[command(name = "bucketcache")]
#[command(author, version, about = "Object-storage backed cache command-line interface", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.overrides.apply(CacheConfig::load_env()?);
    let cache = ObjectCache::connect(config).await?;

    let code = match cli.command {
        Commands::Get { key } => handlers::get(&cache, &key).await?,
        Commands::Set { key, value, ttl } => handlers::set(&cache, &key, value, ttl).await?,
        Commands::Del { key } => handlers::del(&cache, &key).await?,
        Commands::Clear => handlers::clear(&cache).await?,
        Commands::Scan { pattern, limit } => {
            handlers::scan(&cache, pattern.as_deref(), limit).await?
        }
        Commands::Health => handlers::health(&cache).await?,
    };

    Ok(code)
}
