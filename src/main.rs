use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    time::{Duration, Instant},
};
use whack::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::Difficulty,
    high_score::{HighScoreStore, MemoryHighScoreStore, SqliteHighScoreStore},
    random::StdRandom,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
};

const TICK_RATE_MS: u64 = 50;

/// whack-a-mole in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Whack-a-mole in the terminal: hit the moles with the number keys or the mouse before the 30 second timer runs out. Settings are remembered between runs."
)]
pub struct Cli {
    /// difficulty level (defaults to the last one used)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of holes on the board
    #[clap(short = 'n', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    holes: Option<u8>,

    /// length of a session in seconds
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    seconds: Option<u32>,

    /// seed for mole placement, for reproducible sessions
    #[clap(long)]
    seed: Option<u64>,

    /// silence the terminal bell on hits and game over
    #[clap(long)]
    mute: bool,
}

impl Cli {
    /// Overlay command line flags on the saved configuration
    fn apply(&self, mut config: Config) -> Config {
        if let Some(d) = self.difficulty {
            config.difficulty = d;
        }
        if let Some(n) = self.holes {
            config.holes = n as usize;
        }
        if let Some(s) = self.seconds {
            config.session_secs = s;
        }
        if self.mute {
            config.muted = true;
        }
        config
    }

    fn rng(&self) -> StdRandom {
        self.seed
            .map(StdRandom::seeded)
            .unwrap_or_else(StdRandom::from_entropy)
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn open_high_score_store() -> Box<dyn HighScoreStore> {
    match SqliteHighScoreStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("high score will not be saved this run: {e}");
            Box::new(MemoryHighScoreStore::new())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    info!("starting with {config:?}");
    let mut app = App::new(config, open_high_score_store(), cli.rng());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = config_store.save(&app.config) {
        warn!("failed to save config: {e}");
    }

    result
}

fn start_tui<B: Backend + Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    let mut last = Instant::now();

    while !app.should_quit {
        let event = runner.step();

        // move the game clock before handling input so hits land at the right time
        let now = Instant::now();
        app.on_tick(now - last);
        last = now;

        let size = terminal.size()?;
        app.handle_event(event, Rect::new(0, 0, size.width, size.height));

        let cues = app.game.sink_mut().take_cues();
        if !cues.is_empty() {
            terminal.backend_mut().write_all(b"\x07")?;
            Write::flush(terminal.backend_mut())?;
        }

        // cooldowns expire without a sink call, so keep drawing while a session runs
        if app.sink().needs_redraw || app.game.state().is_running() {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            app.game.sink_mut().needs_redraw = false;
        }
    }

    Ok(())
}
