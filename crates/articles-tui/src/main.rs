//! Articles TUI - A terminal user interface for the articles service.
//!
//! Log in, browse the article collection, and create, edit or delete
//! articles from the keyboard.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use articles_core::models::Credentials;
use articles_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written inside the cache directory while the TUI owns the terminal
const LOG_FILE_NAME: &str = "articles.log";

const USAGE: &str = "Usage: articles [--list | --logout]";

/// What the binary was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Tui,
    List,
    Logout,
}

/// Pick the run mode from the arguments after the program name
fn parse_mode(args: &[String]) -> Result<Mode> {
    match args {
        [] => Ok(Mode::Tui),
        [flag] if flag == "--list" => Ok(Mode::List),
        [flag] if flag == "--logout" => Ok(Mode::Logout),
        [flag] if flag == "--help" || flag == "-h" => bail!("{}", USAGE),
        _ => bail!("Unrecognized arguments: {}\n{}", args.join(" "), USAGE),
    }
}

/// Initialize the tracing subscriber for logging.
///
/// With a log directory, output goes to a file through a non-blocking writer;
/// the returned guard must live until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_mode(&args)?;

    let config = Config::load()?;

    match mode {
        Mode::List => {
            init_tracing(None);
            return list_articles(config).await;
        }
        Mode::Logout => {
            init_tracing(None);
            return logout(config);
        }
        Mode::Tui => {}
    }

    // Initialize logging
    let log_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_tracing(Some(&log_dir));
    info!(api = %config.api_base_url, "Articles TUI starting");

    // Create app before touching the terminal so setup errors print normally
    let controller = App::build_controller(&config)?;
    let mut app = App::new(config, controller);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Articles if a session survived from last time, login otherwise
    app.start();

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Articles TUI shutting down");
    Ok(())
}

/// Print the article collection to stdout as JSON, logging in first if needed
async fn list_articles(mut config: Config) -> Result<()> {
    let mut controller = App::build_controller(&config)?;

    if !controller.is_logged_in() {
        let credentials = prompt_credentials(config.last_username.as_deref())?;
        let username = credentials.username.trim().to_string();
        if controller.login(credentials).is_ok() {
            controller.wait_idle().await;
        }
        if let Some(failure) = controller.last_error() {
            bail!("{}", failure);
        }
        if !controller.is_logged_in() {
            bail!("{}", controller.message());
        }
        eprintln!("{}", controller.message());

        config.last_username = Some(username);
        if let Err(e) = config.save() {
            eprintln!("Warning: could not save config: {}", e);
        }
    }

    controller.list_articles();
    controller.wait_idle().await;
    if let Some(failure) = controller.last_error() {
        bail!("{}", failure);
    }

    eprintln!("{}", controller.message());
    let json = serde_json::to_string_pretty(controller.articles())?;
    println!("{}", json);
    Ok(())
}

/// Forget the stored session
fn logout(config: Config) -> Result<()> {
    let mut controller = App::build_controller(&config)?;
    let was_logged_in = controller.is_logged_in();
    controller.logout();

    if was_logged_in {
        eprintln!("{}", controller.message());
    } else {
        eprintln!("No stored session.");
    }
    Ok(())
}

fn prompt_credentials(default_username: Option<&str>) -> Result<Credentials> {
    match default_username {
        Some(name) => eprint!("Username [{}]: ", name),
        None => eprint!("Username: "),
    }
    io::stderr().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = match (username.trim(), default_username) {
        ("", Some(name)) => name.to_string(),
        (typed, _) => typed.to_string(),
    };

    let password = rpassword::prompt_password("Password: ")?;
    Ok(Credentials::new(username, password))
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Apply finished requests
        app.tick();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
