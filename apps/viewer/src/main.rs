use std::sync::Arc;

use anyhow::Result;
use stock::{
    DataProvider, FetchController,
    providers::{AlpacaProvider, AnyProvider, YahooProvider},
    render::{CharmingSurface, RenderDispatcher},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use viewer::{
    app::{App, Flow},
    command::Command,
    config::{Config, ProviderKind},
    terminal::TerminalShell,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    let provider = match (&config.provider, &config.alpaca) {
        (ProviderKind::Alpaca, Some(creds)) => AnyProvider::Alpaca(AlpacaProvider::new(
            creds.base_api.clone(),
            &creds.key_id,
            &creds.secret,
        )?),
        _ => AnyProvider::Yahoo(YahooProvider::new(config.yahoo_base_url.clone())?),
    };
    info!(
        version = %config.version,
        provider = provider.name(),
        discard_stale = config.discard_stale,
        "stock viewer starting"
    );

    let mut surface = CharmingSurface::new();
    if let Some(path) = &config.preview_path {
        info!(path = %path.display(), "writing preview on every redraw");
        surface = surface.with_preview(path.clone(), config.export_width, config.export_height);
    }
    let dispatcher = RenderDispatcher::new(
        surface,
        config.discard_stale,
        (config.export_width, config.export_height),
    );

    let (tx, mut events) = mpsc::unbounded_channel();
    let controller = FetchController::new(Arc::new(provider), dispatcher, tx);
    let today = || chrono::Local::now().date_naive();

    let mut app = App::new(controller, TerminalShell::stdio(), today());
    app.shell_mut().print("type help for commands");
    app.start(today());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        app.shell_mut().prompt();
        tokio::select! {
            Some(event) = events.recv() => app.on_event(event),
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if app.on_command(command, today()) == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!(input = %line, error = %e, "bad command");
                        app.shell_mut().print(&e.to_string());
                    }
                }
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}
