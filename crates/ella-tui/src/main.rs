use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ella_core::{is_blank, logging, ChatClient, Config};
use tracing::{error, info};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "ella")]
#[command(about = "Chat with the Ella assistant from your terminal")]
struct Cli {
    /// Base URL of the Ella server
    #[arg(long, env = "ELLA_ENDPOINT", global = true)]
    endpoint: Option<String>,
    /// Request timeout in seconds (0 disables it)
    #[arg(long, env = "ELLA_TIMEOUT", global = true)]
    timeout: Option<u64>,
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for log files
    #[arg(long, env = "ELLA_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Send {
        /// Message text, sent as-is
        message: String,
    },
    /// Print the server's thread memory
    Memory,
    /// Clear the server's thread memory
    Clear,
}

struct Settings {
    endpoint: String,
    timeout: Option<Duration>,
    assistant_name: String,
}

impl Settings {
    /// CLI flags and env vars win over the config file
    fn resolve(cli: &Cli, config: &Config) -> Self {
        let timeout = match cli.timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => config.timeout(),
        };
        Self {
            endpoint: cli
                .endpoint
                .clone()
                .unwrap_or_else(|| config.endpoint().to_string()),
            timeout,
            assistant_name: config.assistant_name().to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = logging::init_logging(cli.log_dir.as_deref())?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = Settings::resolve(&cli, &config);
    info!(endpoint = %settings.endpoint, log_dir = %log_dir.display(), "starting ella");

    let client = ChatClient::new(&settings.endpoint, settings.timeout)
        .context("failed to build HTTP client")?;

    match cli.command {
        None => run_tui(client, &settings.assistant_name).await?,
        Some(Commands::Send { message }) => send_once(&client, &message, &settings.assistant_name).await?,
        Some(Commands::Memory) => print_memory(&client).await?,
        Some(Commands::Clear) => {
            client.clear_memory().await?;
            println!("Thread memory cleared.");
        }
    }

    Ok(())
}

async fn run_tui(client: ChatClient, assistant_name: &str) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init().context("failed to initialise terminal")?;

    let mut events = EventHandler::new();
    let mut app = App::new(client, assistant_name, events.sender());

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    if let Err(err) = &result {
        error!(error = %err, "terminal session ended with an error");
    }
    result
}

async fn send_once(client: &ChatClient, message: &str, assistant_name: &str) -> Result<()> {
    if is_blank(message) {
        anyhow::bail!("message is empty");
    }

    let reply = client
        .send(message)
        .await
        .with_context(|| format!("no reply from {}", client.base_url()))?;
    println!("{assistant_name}: {reply}");
    Ok(())
}

async fn print_memory(client: &ChatClient) -> Result<()> {
    let entries = client.memory().await?;
    if entries.is_empty() {
        println!("Thread memory is empty.");
        return Ok(());
    }

    for entry in entries {
        let author = if entry.author.is_empty() { "?" } else { entry.author.as_str() };
        if entry.timestamp.is_empty() {
            println!("{author}: {}", entry.message);
        } else {
            println!("[{}] {author}: {}", entry.timestamp, entry.message);
        }
    }
    Ok(())
}
