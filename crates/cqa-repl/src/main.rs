//! CQA REPL - consistent query answering from the terminal
//!
//! `cqa-repl FILE` evaluates a problem file and prints the report. Without a
//! file an interactive session starts.

mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use cqa::cqa_certainty::Limits;
use cqa::cqa_parser::{parse_problem, SrcId};
use cqa::{evaluate, Options};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cqa-repl", version, about = "Certain answers over inconsistent databases")]
struct Cli {
    /// Problem file with `@database` and `@query` sections
    file: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Include the certainty recursion in the report
    #[arg(long)]
    trace: bool,

    /// Skip the first-order rewriting
    #[arg(long)]
    no_rewrite: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let options = Options {
        limits: limits_from_env()?,
        rewrite: !cli.no_rewrite,
        trace: cli.trace,
    };

    match &cli.file {
        Some(path) => {
            init_tracing();
            run_batch(path, cli.json, &options)
        }
        None => {
            run_interactive(options)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// `Limits::default()` with `CQA_MAX_DEPTH` / `CQA_MAX_STEPS` applied
fn limits_from_env() -> Result<Limits> {
    let mut limits = Limits::default();
    if let Some(depth) = env_number("CQA_MAX_DEPTH")? {
        limits.max_depth = depth;
    }
    if let Some(steps) = env_number("CQA_MAX_STEPS")? {
        limits.max_steps = steps;
    }
    Ok(limits)
}

fn env_number<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a non-negative integer", name)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

fn run_batch(path: &Path, json: bool, options: &Options) -> Result<ExitCode> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let problem = match parse_problem(&source, SrcId::from_path(path)) {
        Ok(problem) => problem,
        Err(errors) => {
            for error in &errors {
                eprintln!("{}", error.render(&source));
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let report = evaluate(&problem, options)?;
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_interactive(options: Options) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(options);
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
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            if app.show_help {
                app.show_help = false;
                continue;
            }

            match (key.code, key.modifiers) {
                // Exit
                (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Ok(()),
                (KeyCode::Char('d'), KeyModifiers::CONTROL) if app.input.is_empty() => {
                    return Ok(());
                }

                (KeyCode::Tab, _) => app.mode = app.mode.toggle(),
                (KeyCode::Enter, _) => app.submit(),
                (KeyCode::F(1), _) => app.show_help = true,

                // Cursor movement
                (KeyCode::Left, _) => app.move_cursor_left(),
                (KeyCode::Right, _) => app.move_cursor_right(),
                (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                    app.move_cursor_start()
                }
                (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                    app.move_cursor_end()
                }

                // Editing
                (KeyCode::Backspace, _) => app.delete_char(),
                (KeyCode::Delete, _) => app.delete_char_forward(),
                (KeyCode::Char('u'), KeyModifiers::CONTROL) => app.clear_input(),

                // Scrolling history
                (KeyCode::Up, _) | (KeyCode::PageUp, _) => app.scroll_up(),
                (KeyCode::Down, _) | (KeyCode::PageDown, _) => app.scroll_down(),

                (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                    app.insert_char(c);
                }

                _ => {}
            }
        }
    }
}
