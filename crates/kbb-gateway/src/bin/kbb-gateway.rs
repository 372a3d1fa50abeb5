//! Knowledge Base Builder gateway binary
//!
//! # Usage
//! ```bash
//! kbb-gateway [--port 5000] [--host 127.0.0.1] [--variant wiki|tasks]
//!             [--config gateway.json] [--data-dir LTM] [--verbose]
//! ```

use clap::Parser;
use kbb_agent::AgentVariant;
use kbb_gateway::{Gateway, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Knowledge Base Builder - Supervisor-protocol worker over HTTP
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host name or IP to bind to, resolved at startup (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Primary intent served: `wiki` or `tasks`
    #[arg(long)]
    variant: Option<AgentVariant>,

    /// Directory for the cache, wiki and task database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    // Initialize logging; RUST_LOG wins over the defaults
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    }
    .with_env_overrides();

    if let Some(host) = args.host {
        config = config.with_host(host);
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if let Some(variant) = args.variant {
        config = config.with_variant(variant);
    }
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }

    print_banner(&config);

    let gateway = Gateway::from_config(config)?;
    gateway.start().await?;

    Ok(())
}

fn print_banner(config: &GatewayConfig) {
    let intents: Vec<&str> = config
        .agent
        .variant
        .supported_intents()
        .iter()
        .map(|intent| intent.as_str())
        .collect();
    println!();
    println!("Knowledge Base Builder Agent v{}", kbb_gateway::VERSION);
    println!("   agent      {}", config.agent.agent_name);
    println!("   supervisor {}", config.agent.supervisor_id);
    println!("   intents    {}", intents.join(", "));
    println!();
    println!("HTTP Endpoints (http://{}:{})", config.host, config.port);
    println!("   ├─ POST /message  Supervisor request envelopes");
    println!("   ├─ GET  /health   Health check");
    println!("   └─ GET  /         Service metadata");
    println!();
    println!("Press Ctrl+C to stop");
    println!();
}
