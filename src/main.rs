use std::{
    error::Error,
    fs::{self, File},
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{error, info, trace};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use wristtap::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    game::Game,
    pose_source::{PoseFeed, PoseSource, Puppet, ReplayPoseSource},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    ui,
};

/// tap targets with your wrists, tracked by a pose estimator
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A motion-controlled minigame. Line up with the outline to calibrate, then touch as many targets as you can with your wrists in 60 seconds. Poses come from an external estimator printing JSON lines, a recorded feed, or the keyboard puppet."
)]
pub struct Cli {
    /// estimator command whose stdout is a JSON-lines pose feed
    #[clap(long, conflicts_with_all = ["replay", "puppet"])]
    pose_cmd: Option<String>,

    /// replay a recorded JSON-lines pose feed, one line per frame
    #[clap(long, conflicts_with = "puppet")]
    replay: Option<PathBuf>,

    /// drive a keyboard puppet instead of a camera (default without a source)
    #[clap(long)]
    puppet: bool,

    /// seed target placement for a reproducible session
    #[clap(long)]
    seed: Option<u64>,

    /// milliseconds between frames
    #[clap(long = "frame-ms")]
    frame_ms: Option<u64>,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum SourceChoice {
    Command(String),
    Replay(PathBuf),
    Puppet,
}

impl Cli {
    /// CLI flags win over the config file
    fn source(&self, cfg: &Config) -> SourceChoice {
        if let Some(cmd) = &self.pose_cmd {
            SourceChoice::Command(cmd.clone())
        } else if let Some(path) = &self.replay {
            SourceChoice::Replay(path.clone())
        } else if self.puppet {
            SourceChoice::Puppet
        } else if let Some(cmd) = &cfg.pose_command {
            SourceChoice::Command(cmd.clone())
        } else {
            SourceChoice::Puppet
        }
    }

    fn frame_interval(&self, cfg: &Config) -> Duration {
        Duration::from_millis(self.frame_ms.unwrap_or(cfg.frame_interval_ms).max(1))
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn open_source(choice: &SourceChoice) -> anyhow::Result<Box<dyn PoseSource>> {
    Ok(match choice {
        SourceChoice::Command(cmd) => Box::new(PoseFeed::spawn(cmd)?),
        SourceChoice::Replay(path) => Box::new(ReplayPoseSource::open(path)?),
        SourceChoice::Puppet => Box::new(Puppet::new()),
    })
}

/// Logs go to a file; the terminal belongs to the UI
fn init_logging(filter: &str) -> anyhow::Result<PathBuf> {
    let Some(path) = AppDirs::log_path() else {
        anyhow::bail!("no state directory for the log file");
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options().create(true).append(true).open(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(path)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let cfg = cli.config_store().load();

    match init_logging(&cfg.log_filter) {
        Ok(path) => info!("wristtap starting, logging to {}", path.display()),
        Err(e) => eprintln!("wristtap: logging disabled: {e:#}"),
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let choice = cli.source(&cfg);
    let source = match open_source(&choice) {
        Ok(source) => source,
        Err(e) => {
            error!("pose source unavailable: {e:#}");
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::Io,
                format!("Unable to access the pose source. {e:#}"),
            )
            .exit();
        }
    };
    info!("pose source: {choice:?}");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Game::new(cli.seed), source);
    let result = start_tui(&mut terminal, &mut app, cli.frame_interval(&cfg));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    frame_interval: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(frame_interval));

    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit() {
        match runner.step() {
            AppEvent::Key(key) => {
                if let Some(event) = app.on_key(key) {
                    trace!("{event:?}");
                }
            }
            AppEvent::Resize => {}
            AppEvent::Frame(dt) => {
                for event in app.on_frame(dt) {
                    trace!("{event:?}");
                }
            }
        }

        terminal.draw(|f| ui::draw(app, f))?;
    }

    info!("quit");
    Ok(())
}
