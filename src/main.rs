use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::event::{Event, EventStream};
use futures::StreamExt;

mod config;
mod editor;
mod error;
mod input;
mod interpreter;
mod lint;
mod logging;
mod output;
mod playground;
mod render;
mod theme;

use config::{ConfigEngine, Settings};
use editor::{Editor, Request};
use error::Error;
use interpreter::Interpreter;
use playground::{OutputPanel, Playground, Surface};
use render::{Renderer, View};
use theme::Theme;

/// A terminal Python playground
#[derive(Parser)]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Seed the buffer from this file
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Report the first syntax error in a file
    Check { file: PathBuf },
    /// Run a file and print its rendered output
    Run {
        file: PathBuf,
        /// Print the output panel markup instead of plain lines
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Check { file }) => {
            logging::init_for_cli();
            check(&file).await
        }
        Some(Command::Run { file, html }) => {
            logging::init_for_cli();
            run_file(&file, html).await
        }
        None => {
            logging::init_for_tui();
            run_tui(cli.file.as_deref()).await.map(|()| ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            eprintln!("pyground: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings() -> Result<Settings, Error> {
    let mut config = ConfigEngine::new();
    config.load_default()?;
    Ok(config.settings())
}

fn resolve_theme(name: &str) -> Result<Theme, Error> {
    theme::get_builtin_theme(name).ok_or_else(|| {
        Error::UnknownTheme(format!(
            "{} (available: {})",
            name,
            theme::list_builtin_themes().join(", ")
        ))
    })
}

async fn load_interpreter(settings: &Settings) -> Result<Interpreter, Error> {
    let interpreter = Interpreter::initialize(settings)
        .await
        .map_err(Error::Load)?;
    tracing::info!(version = interpreter.version(), "python ready");
    Ok(interpreter)
}

async fn check(file: &Path) -> Result<ExitCode, Error> {
    let settings = load_settings()?;
    let source = std::fs::read_to_string(file)?;
    let mut interpreter = load_interpreter(&settings).await?;

    let mut surface = Surface::default();
    lint::lint(&mut interpreter, &source, &mut surface).await;
    match surface.syntax_errors.message() {
        Some(message) => {
            println!("{}: {}", file.display(), message);
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

async fn run_file(file: &Path, html: bool) -> Result<ExitCode, Error> {
    let settings = load_settings()?;
    let source = std::fs::read_to_string(file)?;
    let interpreter = load_interpreter(&settings).await?;

    let mut playground = Playground::new(
        Editor::with_buffer(editor::Buffer::from_text(&source)),
        interpreter,
        Duration::ZERO,
    );
    playground.lint().await;
    if let Some(message) = playground.surface.syntax_errors.message() {
        println!("{}: {}", file.display(), message);
        return Ok(ExitCode::FAILURE);
    }
    if !playground.run().await {
        // Nothing to run
        return Ok(ExitCode::SUCCESS);
    }

    let panel = &playground.surface.output;
    if html {
        println!("{}", panel.to_html());
    } else {
        match panel {
            OutputPanel::Empty => {}
            OutputPanel::Lines(lines) => {
                for line in lines {
                    println!("{}", line.text);
                }
            }
            OutputPanel::Failed(error) => {
                println!("{}", output::RUN_FAILED);
                println!("{}", error);
            }
        }
    }

    Ok(match panel {
        OutputPanel::Lines(lines) if !lines.iter().any(|l| l.is_error()) => ExitCode::SUCCESS,
        OutputPanel::Empty => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn run_tui(file: Option<&Path>) -> Result<(), Error> {
    let settings = load_settings()?;
    let theme = resolve_theme(&settings.theme)?;

    let mut editor = match file {
        Some(path) => Editor::open(path)?,
        None => Editor::new(),
    };
    editor.set_indent(settings.tab_width, settings.insert_spaces);

    // Load before touching the terminal so failures print normally
    let interpreter = load_interpreter(&settings).await?;
    let title = format!(
        "{} | Python {}",
        file.and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "[No Name]".to_string()),
        interpreter.version().split_whitespace().next().unwrap_or("?"),
    );

    let mut playground = Playground::new(
        editor,
        interpreter,
        Duration::from_millis(settings.lint_delay_ms),
    );
    let mut renderer = Renderer::new(View {
        show_line_numbers: settings.show_line_numbers,
        relative_line_numbers: settings.relative_line_numbers,
        output_height: settings.output_height,
    })?;

    Renderer::setup()?;
    let result = event_loop(&mut playground, &mut renderer, &title, &theme).await;
    Renderer::teardown()?;
    result
}

async fn event_loop(
    playground: &mut Playground,
    renderer: &mut Renderer,
    title: &str,
    theme: &Theme,
) -> Result<(), Error> {
    let draw = |playground: &mut Playground, renderer: &Renderer| -> Result<(), Error> {
        playground
            .editor
            .adjust_scroll(renderer.text_height(&playground.surface));
        renderer.render(&playground.editor, &playground.surface, title, theme)?;
        Ok(())
    };

    draw(playground, renderer)?;

    // Event stream for async key reading
    let mut events = EventStream::new();

    while playground.editor.running {
        // Restarted on every event, so the check waits for typing to pause
        let lint_due = playground.needs_lint();
        let delay = tokio::time::sleep(playground.lint_delay());

        tokio::select! {
            event = events.next() => {
                let event = match event {
                    Some(Ok(event)) => event,
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                };
                if let Event::Resize(width, height) = event {
                    renderer.resize(width, height);
                }

                let request = input::handle_event(&mut playground.editor, event);
                playground.poll_change();

                if request == Some(Request::Run) {
                    if playground.needs_lint() {
                        playground.lint().await;
                    }
                    if playground.surface.run.can_run() {
                        playground.editor.set_message("Running…");
                        draw(playground, renderer)?;
                        playground.run().await;
                        playground.editor.clear_message();
                    } else if playground.surface.run.visible {
                        playground.editor.set_message("Fix the syntax error before running");
                    }
                }
            }
            _ = delay, if lint_due => {
                playground.lint().await;
            }
        }

        draw(playground, renderer)?;
    }

    Ok(())
}
