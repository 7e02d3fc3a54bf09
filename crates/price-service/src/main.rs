//! Main entry point for the SuperToken price cache.
//!
//! This binary keeps an in-memory table of SuperToken prices for every
//! supported network, refreshed on a fixed delay from the network directory,
//! the per-network subgraphs and a market-data provider, and serves lookups
//! from that table over HTTP.

use clap::Parser;
use price_config::Config;
use price_core::PriceEngine;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

mod factory_registry;
mod server;

/// Command-line arguments for the price cache.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/price-cache.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
	#[arg(short, long, env = "LOG_LEVEL")]
	log_level: Option<String>,
}

/// Level used when RUST_LOG is not set.
fn default_log_directive(args: &Args, config: &Config) -> String {
	match &args.log_level {
		Some(level) => level.clone(),
		None if config.logging.debug => "debug".to_string(),
		None => "info".to_string(),
	}
}

/// Main entry point for the price cache.
///
/// Loads configuration, initializes logging, builds the engine and then runs
/// the refresh loop and the HTTP server until either stops or Ctrl-C is
/// received. A final snapshot is written on the way out.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Loaded before logging: `logging.debug` sets the fallback level.
	let config = Config::from_file(&args.config).await?;

	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_log_directive(&args, &config)));
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = factory_registry::build_engine_from_config(config.clone())?;
	engine.initialize().await?;
	let cache = Arc::clone(engine.cache());

	let server = server::start_server(config.api.clone(), cache);
	serve_until_stopped(&engine, server).await
}

/// Runs the refresh loop next to `server` until either stops or Ctrl-C is
/// received, then shuts the engine down. Shutdown runs on every exit path;
/// a loop or server error is returned after it.
async fn serve_until_stopped<S>(
	engine: &PriceEngine,
	server: S,
) -> Result<(), Box<dyn std::error::Error>>
where
	S: Future<Output = Result<(), Box<dyn std::error::Error>>>,
{
	let outcome: Result<(), Box<dyn std::error::Error>> = tokio::select! {
		result = engine.run() => {
			tracing::info!("Refresh loop finished");
			result.map_err(Into::into)
		}
		result = server => {
			tracing::info!("API server finished");
			result
		}
		result = tokio::signal::ctrl_c() => {
			tracing::info!("Shutdown signal received");
			result.map_err(Into::into)
		}
	};

	if let Err(e) = &outcome {
		tracing::error!(error = %e, "Stopping after failure");
	}

	engine.shutdown().await?;
	tracing::info!("Stopped price cache");
	outcome
}
