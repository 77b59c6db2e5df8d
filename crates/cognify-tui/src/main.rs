mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use anyhow::Result;
use clap::Parser;
use cognify_core::{BackendClient, Config};
use tracing::{error, info, warn};

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "cognify")]
#[command(version, about = "Turn videos and PDFs into flashcards, quizzes, and a study chat")]
struct Cli {
    /// Backend origin (falls back to the config file, then http://localhost:8000)
    #[arg(long, env = "COGNIFY_API_URL")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so clap sees COGNIFY_API_URL from it
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::new(), Some(e)),
    };
    let api_url = config.api_url(cli.api_url.as_deref());

    // A missing log file shouldn't keep the app from starting
    if let Err(e) = logging::init(config.log_level()) {
        eprintln!("Logging disabled: {e}");
    }
    if let Some(e) = config_error {
        warn!(error = %e, "Ignoring unreadable config file, using defaults");
    }
    info!(%api_url, "Starting cognify");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, BackendClient::new(&api_url)).await;

    tui::restore()?;
    if let Err(e) = &result {
        error!(error = %e, "Exited with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, client: BackendClient) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(client, events.sender());
    app.check_backend();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(&mut app, event);
    }

    app.shutdown();
    info!("Shutting down");
    Ok(())
}
