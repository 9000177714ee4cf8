use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing::{info, warn};

use firewatch::app::{write_export, App};
use firewatch::config::PolicyKind;
use firewatch::telemetry::duration::parse_duration;
use firewatch::ui::Theme;
use firewatch::{
    events, ui, AlertSink, DashboardView, FileSource, Monitor, Reconciler, Settings, SilentAlert,
    StreamSource, TelemetrySource, TerminalAlert, TimestampUnit,
};

#[derive(Parser, Debug)]
#[command(name = "firewatch", version)]
#[command(about = "Live terminal dashboard for a fire-detection sensor node")]
struct Args {
    /// Path to a JSON file holding the device tree
    #[arg(short, long, default_value = "telemetry.json", conflicts_with_all = ["connect", "rtdb"])]
    file: PathBuf,

    /// Connect to a TCP endpoint streaming newline-delimited JSON (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "rtdb"])]
    connect: Option<String>,

    /// Stream from a Firebase Realtime Database (base URL)
    #[arg(long, conflicts_with_all = ["file", "connect"])]
    rtdb: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device node to watch (e.g. "/devices/esp32_1")
    #[arg(short, long)]
    device: Option<String>,

    /// Number of history entries to keep
    #[arg(long)]
    history: Option<usize>,

    /// Liveness policy
    #[arg(long, value_enum)]
    liveness: Option<PolicyKind>,

    /// Liveness threshold (e.g. "10s", "15s")
    #[arg(long)]
    liveness_threshold: Option<String>,

    /// Unit of the device's timestamp field
    #[arg(long, value_enum)]
    timestamp_unit: Option<TimestampUnit>,

    /// Poll interval (only used with --file, e.g. "1s", "500ms")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Do not ring the terminal bell on alarms
    #[arg(long)]
    no_sound: bool,

    /// Command run as `<command> <title> <body>` when an alarm fires
    #[arg(long)]
    notify_command: Option<String>,

    /// Run without the TUI, logging every update to stderr
    #[arg(long)]
    headless: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export current state of --file to JSON and exit
    #[arg(short, long, conflicts_with_all = ["connect", "rtdb", "headless"])]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let mut settings = Settings::load(args.config.as_deref())?;
    apply_overrides(&args, &mut settings)?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_to_file(&settings, &args.file, export_path);
    }

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let mut source = open_source(&rt, &args, &settings)?;
    let description = source.description().to_string();
    let subscription = source.subscribe(&settings.device_path)?;

    let alerts: Box<dyn AlertSink> = if args.headless && settings.alerts.notify_command.is_none() {
        Box::new(SilentAlert)
    } else {
        Box::new(TerminalAlert::new(
            settings.alerts.sound && !args.headless,
            settings.alerts.notify_command.clone(),
        ))
    };
    let reconciler = Reconciler::new(settings.reconciler_options(), alerts);
    let monitor = Monitor::spawn(subscription, reconciler);

    let result = if args.headless {
        rt.block_on(run_headless(monitor.view()))
    } else {
        let app = App::new(
            monitor.view(),
            &description,
            &settings.device_path,
            settings.thresholds.clone(),
            Theme::auto_detect(),
        );
        run_tui(app)
    };

    rt.block_on(monitor.shutdown());
    result
}

/// Install a tracing subscriber.
///
/// The TUI owns the terminal, so logs only go to stderr in headless mode.
fn init_tracing(args: &Args) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    if let Some(ref path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    } else if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    }
    Ok(())
}

/// Apply command-line flags on top of the loaded settings.
fn apply_overrides(args: &Args, settings: &mut Settings) -> Result<()> {
    if let Some(ref device) = args.device {
        settings.device_path = device.clone();
    }
    if let Some(history) = args.history {
        settings.history_capacity = history;
    }
    if let Some(policy) = args.liveness {
        settings.liveness.policy = policy;
    }
    if let Some(ref threshold) = args.liveness_threshold {
        settings.liveness.threshold =
            parse_duration(threshold).context("Invalid --liveness-threshold")?;
    }
    if let Some(unit) = args.timestamp_unit {
        settings.timestamp_unit = unit;
    }
    if let Some(ref refresh) = args.refresh {
        settings.poll_interval = parse_duration(refresh).context("Invalid --refresh")?;
    }
    if args.no_sound {
        settings.alerts.sound = false;
    }
    if let Some(ref command) = args.notify_command {
        settings.alerts.notify_command = Some(command.clone());
    }
    settings.validate()?;
    Ok(())
}

fn open_source(rt: &Runtime, args: &Args, settings: &Settings) -> Result<Box<dyn TelemetrySource>> {
    if let Some(ref addr) = args.connect {
        return match rt.block_on(StreamSource::connect(addr)) {
            Ok(source) => Ok(Box::new(source)),
            Err(e) => {
                // Surfaces as a sustained "no data" state rather than an exit
                warn!("{}", e);
                Ok(Box::new(StreamSource::new(tokio::io::empty(), addr)))
            }
        };
    }
    if let Some(ref url) = args.rtdb {
        return rtdb_source(url);
    }
    Ok(Box::new(FileSource::new(&args.file, settings.poll_interval)))
}

#[cfg(feature = "rtdb")]
fn rtdb_source(url: &str) -> Result<Box<dyn TelemetrySource>> {
    Ok(Box::new(firewatch::RtdbSource::new(url)))
}

#[cfg(not(feature = "rtdb"))]
fn rtdb_source(_url: &str) -> Result<Box<dyn TelemetrySource>> {
    anyhow::bail!("firewatch was built without the `rtdb` feature")
}

/// Log every view change until Ctrl-C or the source ends.
async fn run_headless(mut view: watch::Receiver<DashboardView>) -> Result<()> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            changed = view.changed() => {
                if changed.is_err() {
                    info!("Telemetry source finished");
                    break;
                }
                log_view(&view.borrow_and_update());
            }
        }
    }
    Ok(())
}

fn log_view(view: &DashboardView) {
    match view.current {
        Some(ref s) => info!(
            online = view.online,
            temperature = ?s.temperature,
            humidity = ?s.humidity,
            gas = ?s.gas,
            flame = ?s.flame,
            alarm = s.alarm,
            history = view.history.len(),
            alarms = view.alarm_triggers,
            "Telemetry updated"
        ),
        None => info!(
            online = view.online,
            history = view.history.len(),
            "No data"
        ),
    }
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
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

    let result = run_app(&mut terminal, &mut app);

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
    while app.running {
        app.refresh();
        terminal.draw(|frame| ui::render(frame, app))?;

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

/// Reconcile one read of the file source and write the view as JSON
fn export_to_file(settings: &Settings, file: &Path, export_path: &Path) -> Result<()> {
    let source = FileSource::new(file, settings.poll_interval);
    let delivery = source
        .read_once(&settings.device_path)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut reconciler = Reconciler::new(settings.reconciler_options(), Box::new(SilentAlert));
    reconciler.on_snapshot(delivery, tokio::time::Instant::now(), Utc::now());

    write_export(
        &reconciler.view(),
        &settings.device_path,
        &settings.thresholds,
        export_path,
    )?;

    println!("Exported telemetry state to: {}", export_path.display());
    Ok(())
}
