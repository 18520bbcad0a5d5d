use std::{
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
        KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dwelltoe::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    controls::Control,
    game::Mode,
    opponent::HeuristicOpponent,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    tracking::{pointer::PointerTracker, process::LandmarkProcess, FrameSource, TrackingFrame},
    ui::{self, layout::ScreenLayout},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// hands-free tic-tac-toe: point at a cell and hold still to claim it
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Tic-tac-toe played by hovering. Hold the pointer over a cell or button until the ring fills to select it. The mouse stands in for a fingertip unless an external hand detector is given with --tracker-cmd."
)]
pub struct Cli {
    /// how long to hover before a selection fires, in milliseconds
    #[clap(short = 'd', long)]
    dwell_ms: Option<u64>,

    /// how long the computer "thinks" before replying, in milliseconds
    #[clap(long)]
    ai_delay_ms: Option<u64>,

    /// mode to start in
    #[clap(short = 'm', long, value_enum)]
    mode: Option<ModeArg>,

    /// hand detector command printing landmark frames as JSON lines
    #[clap(long)]
    tracker_cmd: Option<String>,

    /// seed for the computer opponent, for repeatable games
    #[clap(long)]
    seed: Option<u64>,

    /// where to write logs (filtered with RUST_LOG)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Pvp,
    Pve,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Pvp => Mode::PvP,
            ModeArg::Pve => Mode::PvE,
        }
    }
}

impl Cli {
    /// Flags given on the command line win over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(ms) = self.dwell_ms {
            config.dwell_threshold_ms = ms;
        }
        if let Some(ms) = self.ai_delay_ms {
            config.computer_delay_ms = ms;
        }
        if let Some(mode) = self.mode {
            config.start_mode = mode.into();
        }
    }

    fn opponent(&self) -> HeuristicOpponent {
        self.seed
            .map_or_else(HeuristicOpponent::new, HeuristicOpponent::seeded)
    }
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    Activate(Control),
}

fn key_command(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::Quit)
        }
        KeyCode::Char('r') => Some(Command::Activate(Control::Reset)),
        KeyCode::Char('m') => Some(Command::Activate(Control::ModeToggle)),
        _ => None,
    }
}

/// Frames come from the mouse unless a hand detector was started.
enum Tracker {
    Mouse(PointerTracker),
    Detector(LandmarkProcess),
}

impl Tracker {
    fn set_display(&mut self, display: Rect) {
        if let Tracker::Mouse(pointer) = self {
            pointer.set_display(ui::layout::to_geometry(display));
        }
    }

    fn on_mouse(&mut self, column: u16, row: u16) {
        if let Tracker::Mouse(pointer) = self {
            pointer.on_mouse(column, row);
        }
    }

    /// The mouse left the terminal, so it no longer counts as a hand.
    fn leave(&mut self) {
        if let Tracker::Mouse(pointer) = self {
            pointer.leave();
        }
    }
}

impl FrameSource for Tracker {
    fn next_frame(&mut self) -> Option<TrackingFrame> {
        match self {
            Tracker::Mouse(pointer) => pointer.next_frame(),
            Tracker::Detector(process) => process.next_frame(),
        }
    }
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dwelltoe=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        init_logging(&path)?;
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("saving config to {}", store.path().display()))?;
    }
    info!(?config, "starting");

    let mut tracker = match &cli.tracker_cmd {
        Some(cmd) => Tracker::Detector(
            LandmarkProcess::from_command_line(cmd, &config.tracker)
                .with_context(|| format!("starting hand detector `{cmd}`"))?,
        ),
        None => Tracker::Mouse(PointerTracker::new()),
    };
    let mut app = App::new(&config, cli.opponent());

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &mut tracker, config.tick_rate());

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn screen_layout<B: Backend>(terminal: &Terminal<B>) -> Result<ScreenLayout> {
    let size = terminal.size()?;
    Ok(ScreenLayout::compute(Rect::new(0, 0, size.width, size.height)))
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tracker: &mut Tracker,
    tick_rate: Duration,
) -> Result<()> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick_rate));
    let mut layout = screen_layout(terminal)?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                let now = Instant::now();
                layout = screen_layout(terminal)?;
                app.set_controls(layout.control_layout(app.surface()));
                tracker.set_display(layout.display);

                if let Some(frame) = tracker.next_frame() {
                    app.on_frame(frame, now);
                }
                app.on_tick(now);
                terminal.draw(|f| ui::draw(f, app, &layout))?;
            }
            AppEvent::Resize => {
                layout = screen_layout(terminal)?;
                terminal.draw(|f| ui::draw(f, app, &layout))?;
            }
            AppEvent::Key(key) => match key_command(key) {
                Some(Command::Quit) => break,
                Some(Command::Activate(control)) => app.activate(control, Instant::now()),
                None => {}
            },
            AppEvent::Mouse(mouse) => on_mouse(mouse, app, tracker, &layout),
            AppEvent::FocusLost => tracker.leave(),
        }
    }

    info!("bye");
    Ok(())
}

fn on_mouse(mouse: MouseEvent, app: &mut App, tracker: &mut Tracker, layout: &ScreenLayout) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            match layout.control_at(mouse.column, mouse.row) {
                Some(control) => app.activate(control, Instant::now()),
                None => tracker.on_mouse(mouse.column, mouse.row),
            }
        }
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            tracker.on_mouse(mouse.column, mouse.row)
        }
        _ => {}
    }
}
