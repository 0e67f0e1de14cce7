use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use botcraft_core::{ChatSession, ClientSettings, Config, GeminiClient, SessionOptions};
use clap::Parser;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "botcraft", version)]
#[command(about = "Terminal chatbot creator backed by the Gemini API")]
struct Cli {
    /// Gemini model to use (overrides config.json)
    #[arg(short, long)]
    model: Option<String>,

    /// Path to an alternate config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Send the whole conversation with each prompt instead of only the latest input
    #[arg(long)]
    include_history: bool,

    /// List the models available to your API key and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_path = logging::init()?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    // Overrides apply to this run only; App never writes them back
    if let Some(model) = cli.model {
        config.model = model;
    }
    if cli.include_history {
        config.include_history = true;
    }

    let client = GeminiClient::new(ClientSettings::from_config(&config));

    if cli.list_models {
        return list_models(&client).await;
    }

    tracing::info!(
        model = %client.model(),
        include_history = config.include_history,
        log = %log_path.display(),
        "starting botcraft"
    );

    let session = ChatSession::new(Arc::new(client.clone()), SessionOptions::from_config(&config));
    let mut app = App::new(session, config.model.clone(), Some(config_path));
    if !client.has_api_key() {
        tracing::warn!("no API key configured");
        app.status = Some("No API key: set GEMINI_API_KEY or api_key in config.json".to_string());
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    tracing::info!("botcraft exited");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event),
            Some(event) = app.session.next_event() => app.on_session_event(event),
            else => break,
        }
    }

    Ok(())
}

async fn list_models(client: &GeminiClient) -> Result<()> {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models available for this API key");
    }
    for model in models {
        println!("  • {}", model);
    }
    Ok(())
}
