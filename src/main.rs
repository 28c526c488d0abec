use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::net::TcpStream;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use twinwatch::app::{App, View};
use twinwatch::{events, ui, HdtApi, HistoryStore, HttpApi, Settings, StreamFeed};

#[derive(Parser, Debug)]
#[command(name = "twinwatch")]
#[command(about = "Terminal dashboard for monitoring digital twins")]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the twin API (e.g., "http://localhost:3000")
    #[arg(short, long)]
    api: Option<String>,

    /// Open this twin on startup
    #[arg(short, long)]
    dt: Option<String>,

    /// Connect to a TCP endpoint streaming samples for the live chart (host:port)
    #[arg(short, long)]
    stream: Option<String>,

    /// Poll interval in milliseconds
    #[arg(short, long)]
    poll_interval: Option<u64>,

    /// Log file (the terminal is owned by the dashboard)
    #[arg(long, default_value = "twinwatch.log")]
    log_file: PathBuf,

    /// Export the current state of --dt to a JSON file and exit
    #[arg(short, long, requires = "dt")]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_file)?;

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(api) = args.api {
        settings.api_url = api;
    }
    if let Some(ms) = args.poll_interval {
        settings.poll_interval_ms = ms;
    }
    if let Some(stream) = args.stream {
        settings.stream = Some(stream);
    }
    settings.validate()?;
    info!("Starting with {:?}", settings);

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let api: Arc<dyn HdtApi> = Arc::new(HttpApi::new(settings.api_url.clone()));

    // Handle export mode (non-interactive)
    if let (Some(export_path), Some(dt)) = (&args.export, &args.dt) {
        return rt.block_on(export_to_file(api.as_ref(), dt, export_path));
    }

    let history = HistoryStore::with_limit(settings.history_limit);

    let feed = match settings.stream {
        Some(ref addr) => Some(rt.block_on(async {
            println!("Connecting to {}...", addr);
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    println!("Connected!");
                    Ok(StreamFeed::spawn(stream, history.clone(), addr))
                }
                Err(e) => Err(anyhow::anyhow!("Failed to connect to {}: {}", addr, e)),
            }
        })?),
        None => None,
    };

    let mut app = App::new(api, history, &settings);
    app.theme = ui::Theme::auto_detect();
    if let Some(feed) = feed {
        app.attach_feed(feed);
    }
    app.fetch_twins();
    if let Some(ref dt) = args.dt {
        app.open_detail(dt);
    }

    let result = run_tui(&mut app);
    if let Err(ref e) = result {
        error!("Dashboard failed: {:#}", e);
    }
    info!("Shutting down");
    result
}

/// Send tracing output to a file; stdout belongs to the terminal UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

/// Run the TUI until the user quits
fn run_tui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Results from the pollers and the twin list fetch
        app.apply_updates();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                frame.render_widget(paragraph, ui::centered(area, area.width, 5));
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Twins => ui::twins::render(frame, app, chunks[2]),
                View::Detail => ui::detail::render(frame, app, chunks[2]),
                View::Live => ui::live::render(frame, app, chunks[2]),
                View::Query => ui::query::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.query.generated.is_some() {
                ui::query::render_generated(frame, app, area);
            }

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Fetch the state of one twin and write it as pretty JSON
async fn export_to_file(api: &dyn HdtApi, dt: &str, export_path: &Path) -> Result<()> {
    let state = api
        .twin_state(dt)
        .await
        .with_context(|| format!("Failed to fetch state of {}", dt))?;

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "dt": dt,
        "state": state,
    }))?;
    std::fs::write(export_path, json)?;

    info!("Exported state of {} to {}", dt, export_path.display());
    println!("Exported state of {} to: {}", dt, export_path.display());
    Ok(())
}
