//! Terminal front-end for the practice coach.
//!
//! Loads site content, restores saved preferences and runs a chat loop
//! against the configured completion endpoint.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ai_client::ChatClient;
use anyhow::{Context, Result};
use clap::Parser;
use coach_widget::{
    load_content, CoachError, CoachWidget, ContentSource, DirSource, FilePreferenceStore,
    HttpSource, Mode, PreferenceStore, Preferences, Session,
};
use console::style;
use dialoguer::{theme::ColorfulTheme, FuzzySelect, Input as Prompt, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::runtime::Runtime;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{Command, Input};

#[derive(Parser)]
#[command(name = "coach-cli")]
#[command(about = "Rehearse customer conversations with an AI coach")]
#[command(version)]
struct Cli {
    /// Directory or base URL holding config.json, persona.md, scenarios.json and system-prompt.md
    #[arg(long, default_value = "content")]
    content: String,

    /// Chat endpoint, overrides the one in config.json
    #[arg(long, env = "COACH_ENDPOINT")]
    endpoint: Option<String>,

    /// Where preferences are persisted between runs
    #[arg(long, default_value = ".coach/storage.json")]
    prefs: PathBuf,

    /// Start in this mode instead of the saved one
    #[arg(long)]
    mode: Option<Mode>,

    /// Start with scoring turned off
    #[arg(long)]
    no_scoring: bool,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let source: Box<dyn ContentSource> =
        if cli.content.starts_with("http://") || cli.content.starts_with("https://") {
            Box::new(HttpSource::new(&cli.content))
        } else {
            Box::new(DirSource::new(&cli.content))
        };
    let content = rt.block_on(load_content(source.as_ref()));

    let endpoint = cli
        .endpoint
        .clone()
        .unwrap_or_else(|| content.settings.endpoint.clone());
    let title = content.settings.title.clone();
    let widget = CoachWidget::new(content, Arc::new(ChatClient::new(&endpoint)));

    let store = FilePreferenceStore::new(&cli.prefs);
    let saved = store.load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable preferences");
        None
    });

    let mut session = widget.restore_session(saved.as_ref());
    if let Some(mode) = cli.mode {
        widget.set_mode(&mut session, mode);
    }
    if cli.no_scoring {
        widget.set_scoring(&mut session, false);
    }

    println!("{}", style(&title).bold().underlined());
    println!("{}", style(format!("endpoint {endpoint}  ·  /help for commands")).dim());
    print_status(&widget, &session);

    let theme = ColorfulTheme::default();
    loop {
        println!();
        let line: String = Prompt::with_theme(&theme)
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
            .context("failed to read input")?;

        match commands::parse(&line) {
            Input::Say(text) => send(&rt, &widget, &mut session, &text),
            Input::Command(Command::Quit) => break,
            Input::Command(command) => {
                if control(&theme, &widget, &mut session, command)? {
                    save(&store, &session);
                    print_status(&widget, &session);
                }
            }
        }
    }

    save(&store, &session);
    Ok(())
}

fn send(rt: &Runtime, widget: &CoachWidget, session: &mut Session, text: &str) {
    let spinner = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(s);
    }
    spinner.set_message("waiting for reply...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = rt.block_on(widget.submit(session, text));
    spinner.finish_and_clear();

    let speaker = widget
        .counterpart(session)
        .map(|c| c.label.clone())
        .unwrap_or_else(|| "coach".to_string());

    match result {
        Ok(messages) => {
            for msg in &messages {
                println!("{}", render::message(&speaker, msg));
            }
        }
        Err(CoachError::EmptyMessage) => {}
        Err(e) => println!("{}", style(e).red()),
    }
}

/// Apply a control command. Returns true when session settings changed.
fn control(
    theme: &ColorfulTheme,
    widget: &CoachWidget,
    session: &mut Session,
    command: Command,
) -> Result<bool> {
    match command {
        Command::Help => {
            println!("{}", commands::HELP);
            Ok(false)
        }
        Command::Domain => {
            let domains = widget.content().catalog.domains();
            if domains.is_empty() {
                return Ok(false);
            }
            let labels: Vec<&str> = domains.iter().map(|d| d.label.as_str()).collect();
            let current = domains
                .iter()
                .position(|d| d.key == session.selection().domain)
                .unwrap_or(0);
            let choice = Select::with_theme(theme)
                .with_prompt("Therapeutic area")
                .items(&labels)
                .default(current)
                .interact()?;
            let key = domains[choice].key.clone();
            widget.select_domain(session, &key);
            Ok(true)
        }
        Command::Counterpart => {
            let domain = session.selection().domain.clone();
            let entries = widget.counterparts(&domain);
            if entries.is_empty() {
                println!("{}", style("No counterparts in this area.").dim());
                return Ok(false);
            }
            let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
            let current = entries
                .iter()
                .position(|e| Some(&e.id) == session.selection().counterpart.as_ref())
                .unwrap_or(0);
            let choice = FuzzySelect::with_theme(theme)
                .with_prompt("Talk to")
                .items(&labels)
                .default(current)
                .interact()?;
            let id = entries[choice].id.clone();
            widget.select_counterpart(session, &id)?;
            Ok(true)
        }
        Command::Mode(mode) => {
            let mode = mode.unwrap_or(match session.mode() {
                Mode::Roleplay => Mode::Coach,
                Mode::Coach => Mode::Roleplay,
            });
            widget.set_mode(session, mode);
            Ok(true)
        }
        Command::Scoring(enabled) => {
            let enabled = enabled.unwrap_or(!session.scoring_enabled());
            widget.set_scoring(session, enabled);
            Ok(true)
        }
        Command::Brief => {
            match widget.brief(session) {
                Some(brief) => println!("{brief}"),
                None => println!("{}", style("No brief for this counterpart.").dim()),
            }
            Ok(false)
        }
        Command::Reset => {
            session.reset();
            println!("{}", style("Conversation cleared.").dim());
            Ok(false)
        }
        Command::Unknown(raw) => {
            println!("{} {}", style("Unknown command:").yellow(), raw);
            Ok(false)
        }
        Command::Quit => Ok(false),
    }
}

fn save(store: &FilePreferenceStore, session: &Session) {
    if let Err(e) = store.save(&Preferences::from_session(session)) {
        warn!(error = %e, "Failed to save preferences");
    }
}

fn print_status(widget: &CoachWidget, session: &Session) {
    let counterpart = widget.counterpart(session).map(|c| c.label.as_str());
    println!("{}", render::status(session, counterpart));
    if !session.evaluation_enabled() && session.mode() == Mode::Roleplay {
        println!("{}", style("scoring is off").dim());
    }
}
