//! Skycast - current conditions and a 5-day forecast in your terminal
//!
//! A terminal UI application that fetches OpenWeatherMap forecast data for
//! a city or this machine's location, aggregates it into daily summaries,
//! and renders them as a dashboard.

mod app;
mod cli;
mod data;
mod forecast;
mod format;
mod geo;
mod settings;
mod store;
mod ui;

use std::io;
use std::panic;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use app::{App, CLOCK_TICK};
use cli::{Cli, StartupConfig, API_KEY_ENV};
use store::FilePreferencesStore;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let env_key = std::env::var(API_KEY_ENV).ok();
    let config = StartupConfig::from_cli(&cli, env_key)?;

    let store = FilePreferencesStore::new()
        .ok_or("Could not determine a config directory for preferences")?;

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app instance and kick off the first fetch
    let (events_tx, mut events_rx) = mpsc::channel(8);
    let mut app = App::new(config, Box::new(store), events_tx);

    // Initial render to show loading state
    terminal.draw(|f| ui::render(f, &app))?;
    app.start();

    let mut last_tick = Instant::now();

    // Main event loop
    loop {
        // Render UI
        terminal.draw(|f| ui::render(f, &app))?;

        // Apply completed fetches; stale generations are discarded inside
        while let Ok(fetch_event) = events_rx.try_recv() {
            app.apply_event(fetch_event);
        }

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Refresh the displayed city-local clock; never re-fetches
        if last_tick.elapsed() >= CLOCK_TICK {
            app.tick();
            last_tick = Instant::now();
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
