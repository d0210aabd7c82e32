mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ledger_domain::{ClefSetting, GameSettings};
use ledger_trainer::{
    Action, FileStorage, GameController, GameView, InputBindings, Key, PersistenceStore, Phase,
    SystemClock,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClefArg {
    Treble,
    Bass,
    Both,
}

impl From<ClefArg> for ClefSetting {
    fn from(arg: ClefArg) -> Self {
        match arg {
            ClefArg::Treble => ClefSetting::Treble,
            ClefArg::Bass => ClefSetting::Bass,
            ClefArg::Both => ClefSetting::Both,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Sight-reading flashcards in the terminal", long_about = None)]
struct Cli {
    /// JSON or YAML settings file
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, value_enum)]
    clef: Option<ClefArg>,
    /// Ledger lines allowed above and below the staff (0-6)
    #[arg(long)]
    max_ledger_lines: Option<u8>,
    /// Only draw notes that sit on or between ledger lines
    #[arg(long)]
    only_ledger_lines: bool,
    /// Seconds per card (1-30); enables the countdown
    #[arg(long)]
    time_limit: Option<f64>,
    /// Height of the drawing area; small heights cap ledger lines at 3
    #[arg(long)]
    height: Option<f32>,
    /// Seed for reproducible note draws
    #[arg(long)]
    seed: Option<u64>,
    /// Where session state is stored (defaults to the user config directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Discard any stored session before starting
    #[arg(long)]
    fresh: bool,
}

impl Cli {
    fn game_settings(&self) -> Result<GameSettings> {
        let mut settings = match &self.settings {
            Some(path) => GameSettings::from_path(path)?,
            None => GameSettings::default(),
        };
        if let Some(clef) = self.clef {
            settings.clef = clef.into();
        }
        if let Some(lines) = self.max_ledger_lines {
            settings.max_ledger_lines = lines;
        }
        if self.only_ledger_lines {
            settings.only_ledger_lines = true;
        }
        if let Some(limit) = self.time_limit {
            settings.time_limit_enabled = true;
            settings.time_limit_seconds = limit;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    Act(Action),
    Press(Key),
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => Command::Quit,
            "start" => Command::Act(Action::Start),
            "resume" => Command::Act(Action::Resume),
            "review" => Command::Act(Action::StartReview),
            "stop" => Command::Act(Action::StopReview),
            "skip" => Command::Act(Action::SkipReview),
            "restart" | "settings" => Command::Act(Action::Restart),
            _ => Key::from_token(line).map_or(Command::Unknown, Command::Press),
        }
    }

    /// Resolves the command against the current state. Enter also starts a
    /// game from settings and resumes a restored session.
    fn action(self, bindings: &InputBindings, view: &GameView) -> Option<Action> {
        match self {
            Command::Act(action) => Some(action),
            Command::Press(Key::Enter) if view.phase == Phase::SettingsOpen => Some(Action::Start),
            Command::Press(Key::Enter) if view.phase == Phase::Paused => Some(Action::Resume),
            Command::Press(key) => bindings.action_for(key, view),
            Command::Quit | Command::Unknown => None,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.game_settings()?;
    let dir = cli
        .data_dir
        .clone()
        .or_else(FileStorage::default_dir)
        .ok_or_else(|| anyhow!("no config directory available; pass --data-dir"))?;
    let storage = FileStorage::new(dir)?;
    info!(dir = ?storage.dir(), "using storage directory");

    let mut store = PersistenceStore::new(Arc::new(storage));
    if cli.fresh {
        store.clear()?;
    }
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = GameController::new(settings, store, Arc::new(SystemClock), rng)?;
    game.set_viewport_height(cli.height);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(game))
}

async fn run(mut game: GameController) -> Result<()> {
    let events = game.subscribe();
    let bindings = InputBindings;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    render::draw(&mut stdout, &game.view())?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = Command::parse(&line);
                if command == Command::Quit {
                    break;
                }
                let view = game.view();
                match command.action(&bindings, &view) {
                    Some(action) => {
                        if !game.dispatch(action) {
                            warn!(?action, phase = ?view.phase, "action not available");
                        }
                    }
                    None => println!("(nothing to do for {:?})", line.trim()),
                }
                events.try_iter().for_each(drop);
                render::draw(&mut stdout, &game.view())?;
            }
            _ = sleep_until(game.next_deadline()) => {
                game.tick();
                if events.try_iter().count() > 0 {
                    render::draw(&mut stdout, &game.view())?;
                }
            }
        }
    }

    game.shutdown();
    Ok(())
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
