use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use kbb_core::wiki::UpdateMode;
use kbb_core::DEFAULT_AGENT_NAME;

mod client;
mod render;

use client::{Reply, Sender, WorkerClient, DEFAULT_URL};

/// kbb - send Supervisor requests to a Knowledge Base Builder worker
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Worker base URL
    #[arg(long, global = true, default_value = DEFAULT_URL)]
    url: String,

    /// Agent name to address
    #[arg(long, global = true, default_value = DEFAULT_AGENT_NAME)]
    agent: String,

    /// `context.user_id` of generated requests
    #[arg(long, global = true, default_value = "cli")]
    user: String,

    /// `context.conversation_id` of generated requests
    #[arg(long, global = true)]
    conversation: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 60)]
    timeout: u64,

    /// Print the raw JSON reply
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the worker
    Health {
        /// Send a `health_check` envelope to /message instead of GET /health
        #[arg(long)]
        envelope: bool,
    },

    /// Create a task from natural language
    Task {
        /// Free text describing the task
        text: String,
    },

    /// Update the wiki document
    Wiki {
        /// New content (use --file to read it from disk)
        text: Option<String>,

        /// Read the content from a file
        #[arg(short, long, value_name = "FILE", conflicts_with = "text")]
        file: Option<PathBuf>,

        /// How the content is combined with the current document
        #[arg(short, long, value_enum, default_value_t = Mode::Overwrite)]
        mode: Mode,
    },

    /// Post a hand-written JSON request file as is
    Send {
        /// JSON file to post to /message
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Overwrite,
    Append,
}

impl From<Mode> for UpdateMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Overwrite => UpdateMode::Overwrite,
            Mode::Append => UpdateMode::Append,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = WorkerClient::new(&cli.url, Duration::from_secs(cli.timeout))?;
    let sender = Sender {
        agent_name: cli.agent.clone(),
        user_id: cli.user.clone(),
        conversation_id: cli.conversation.clone(),
    };
    let now = chrono::Utc::now();

    let reply = match &cli.command {
        Commands::Health { envelope: false } => client.health().await?,
        Commands::Health { envelope: true } => client.send(&sender.health_check(now)).await?,
        Commands::Task { text } => client.send(&sender.create_task(text, now)).await?,
        Commands::Wiki { text, file, mode } => {
            let content = wiki_content(text.as_deref(), file.as_deref())?;
            client
                .send(&sender.update_wiki(&content, (*mode).into(), now))
                .await?
        }
        Commands::Send { file } => {
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let body = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            client.post_value(&body).await?
        }
    };

    finish(&cli, &reply)
}

fn wiki_content(text: Option<&str>, file: Option<&std::path::Path>) -> Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        (None, None) => bail!("wiki content required: pass TEXT or --file"),
    }
}

fn finish(cli: &Cli, reply: &Reply) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reply.body)?);
    } else {
        render::print_reply(reply);
    }

    if !reply.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
