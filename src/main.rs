//! loadstate - terminal viewer for one remote JSON resource
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - viewer state processing events
//! - Loader Layer (Tokio) - subscription plus fetch actor

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use loadstate::app::AppActor;
use loadstate::config::Config;
use loadstate::messages::ui_events::key_to_ui_event;
use loadstate::messages::{RenderState, UiEvent};
use loadstate::storage::{FileStore, KeyValueStore, MemoryStore};
use loadstate::ui::draw_ui;
use loadstate::{HttpFetcher, RemoteResourceLoader, ResourceRequest};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Resolve the command-line argument into a request
fn resolve_request(config: &Config, arg: Option<String>) -> anyhow::Result<ResourceRequest> {
    match arg {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(ResourceRequest::new(url))
        }
        Some(path) => config.endpoint().request(&path),
        None => config.endpoint().request(&config.default_path),
    }
}

fn open_store() -> Arc<dyn KeyValueStore> {
    match FileStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", &config.log_file);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let request = resolve_request(&config, std::env::args().nth(1))?;
    tracing::info!(url = %request.url, "Starting viewer");

    let loader = RemoteResourceLoader::spawn(HttpFetcher::new(&config));
    let store = open_store();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    let app_actor = AppActor::new(request, loader.subscriber(), store, render_tx);
    let app = tokio::spawn(app_actor.run(ui_rx));

    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    let _ = app.await;
    loader.shutdown();
    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        terminal.draw(|f| draw_ui(f, &current_state))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(key, current_state.show_help) {
                    let quit = event == UiEvent::Quit;
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}
