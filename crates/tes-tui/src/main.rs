use std::path::PathBuf;
use clap::{Parser, Subcommand};
use colored::*;
use anyhow::{bail, Result};
use tes_core::{ApiClient, Attachment, ChatRequest, Config};

mod app;
mod handler;
mod logging;
mod textarea;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "tes")]
#[command(about = "Chat with the TES inference backend, optionally attaching a file")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides TES_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// User ID sent with every message
    #[arg(long, global = true)]
    user_id: Option<String>,

    /// Where the interactive client writes its log
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Your message
        message: String,
        /// File to attach
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Check that the backend is reachable
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Chat);

    // Logging first so config problems land in the log
    match &command {
        Commands::Chat => {
            if let Some(path) = cli.log_file.or_else(logging::default_log_path) {
                logging::init_file(&path)?;
            }
        }
        Commands::Send { .. } | Commands::Ping => logging::init_stderr(),
    }

    let config = Config::load_or_default();
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let user_id = cli.user_id
        .or(config.user_id)
        .unwrap_or_default();
    let client = ApiClient::new(&api_url);

    match command {
        Commands::Chat => run_chat(client, user_id).await,
        Commands::Send { message, file } => send_once(&client, user_id, message, file.as_deref()).await,
        Commands::Ping => ping(&client).await,
    }
}

async fn run_chat(client: ApiClient, user_id: String) -> Result<()> {
    tracing::info!(api_url = client.base_url(), "starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(client, events.sender(), user_id);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            if let Some(event) = events.next().await {
                handler::handle_event(&mut app, event).await?;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;

    if app.session.is_awaiting() {
        tracing::info!(pending = app.session.in_flight(), "exiting with sends still pending");
    }

    result
}

async fn send_once(client: &ApiClient, user_id: String, message: String, file: Option<&str>) -> Result<()> {
    if message.trim().is_empty() {
        println!("{}", "Nothing to send".yellow());
        return Ok(());
    }

    let file = match file {
        Some(path) => Some(Attachment::from_path(path).await?),
        None => None,
    };

    println!("{} {}", "Me:".bold().blue(), message);
    if let Some(attachment) = &file {
        println!("   {} {} ({} bytes)", "📎".dimmed(), attachment.file_name.dimmed(), attachment.size());
    }

    let request = ChatRequest {
        user_id,
        user_query: message,
        file,
    };

    match client.generate(request).await {
        Ok(reply) => {
            println!("{} {}", "Bot:".bold().green(), reply.response);
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "error generating response");
            println!("{} {}", "Bot:".bold().red(), tes_core::ERROR_TEXT);
            println!("Make sure the backend is running at {}", client.base_url().bold());
            return Err(e);
        }
    }

    Ok(())
}

async fn ping(client: &ApiClient) -> Result<()> {
    match client.ping().await {
        Ok(message) => {
            println!("{} {} ({})", "✓".green(), message, client.base_url().dimmed());
        }
        Err(e) => {
            println!("{}: {:#}", "Backend not reachable".red(), e);
            bail!("backend at {} is not reachable", client.base_url());
        }
    }
    Ok(())
}
