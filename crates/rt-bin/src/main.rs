//! runtext entrypoint: a script-driven harness for the token editor
//! engine. Replays edit commands against a mention/topic session the way
//! a host surface would and prints the resulting state, so engine
//! behavior can be exercised end to end without a UI.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use core_config::{CharacterLimit, TokenStyle, Trigger, defaults, load_from};
use core_content::{MentionSuggestion, TopicSuggestion};
use core_engine::{EditOutcome, EditorSession, RejectReason, TriggerState};
use core_flat::CharRange;
use core_layout::{Expandable, MonospaceMeasure};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "runtext", version, about = "Token editor engine harness")]
struct Args {
    /// Edit script to replay (UTF-8 text, one command per line); stdin
    /// when omitted.
    pub script: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of
    /// `runtext.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

fn configure_logging() -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", "runtext.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging()?;
    info!(target: "runtime", "startup");

    let config = load_from(args.config.clone())?;
    let mut session = EditorSession::new(
        defaults::mention_topic_configuration(),
        config.editor_style(),
    );
    if let Some(max_count) = config.max_count() {
        session.set_character_limit(Some(CharacterLimit::new(max_count)));
    }

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    for (lineno, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        execute(&mut session, line).with_context(|| format!("script line {}", lineno + 1))?;
    }
    show(&session)
}

fn execute(session: &mut EditorSession, line: &str) -> Result<()> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "type" => {
            for c in rest.chars() {
                let at = session.selection();
                report(session.propose_edit(at, &c.to_string()));
            }
        }
        "paste" => {
            let at = session.selection();
            report(session.propose_edit(at, rest));
        }
        "backspace" => {
            let count: usize = if rest.is_empty() { 1 } else { rest.parse()? };
            for _ in 0..count {
                backspace(session);
            }
        }
        "select" => {
            let mut parts = rest.split_whitespace();
            let start = parts.next().context("usage: select <start> <len>")?.parse()?;
            let len = parts.next().context("usage: select <start> <len>")?.parse()?;
            session.set_selection(CharRange::new(start, len));
        }
        "complete" | "inject" => {
            let mut parts = rest.splitn(3, ' ');
            let kind = parts.next().context("usage: complete <kind> <id> <name>")?;
            let id = parts.next().context("missing id")?.to_string();
            let name = parts.next().context("missing name")?.to_string();
            let trigger = resolve_trigger(session, kind, command == "complete")?;
            match (kind, command) {
                ("mention", "complete") => {
                    session.insert_token(MentionSuggestion::new(id, name), trigger)
                }
                ("mention", _) => {
                    session.insert_token_at_cursor(MentionSuggestion::new(id, name), trigger)
                }
                ("topic", "complete") => {
                    session.insert_token(TopicSuggestion::new(id, name), trigger)
                }
                ("topic", _) => {
                    session.insert_token_at_cursor(TopicSuggestion::new(id, name), trigger)
                }
                _ => bail!("unknown suggestion kind {kind:?}"),
            }
        }
        "tap" => {
            let index: usize = rest.parse()?;
            match session.handle_tap(index) {
                Some(run) => println!("tapped {} ({})", run.display_text(), run.token_type()),
                None => println!("tapped plain text"),
            }
        }
        "limit" => {
            session.set_character_limit(Some(CharacterLimit::new(rest.parse()?)));
        }
        "dismiss" => session.dismiss_composing(),
        "show" => show(session)?,
        "collapse" => {
            let mut parts = rest.split_whitespace();
            let width = parts.next().context("usage: collapse <width> <rows>")?.parse()?;
            let rows = parts.next().context("usage: collapse <width> <rows>")?.parse()?;
            let mut expandable = Expandable::new(
                session.content().clone(),
                rows,
                session.style().clone(),
                MonospaceMeasure,
            );
            expandable.set_width(width);
            println!("collapsed: {:?}", expandable.visible().plain_text());
            println!("truncated: {}", expandable.is_truncated());
        }
        other => bail!("unknown command {other:?}"),
    }
    Ok(())
}

fn resolve_trigger(session: &EditorSession, kind: &str, prefer_active: bool) -> Result<Trigger> {
    if prefer_active
        && let Some(trigger) = session.active_trigger()
        && trigger.token_type == kind
    {
        return Ok(trigger.clone());
    }
    match kind {
        "mention" => Ok(Trigger::mention(TokenStyle::colored(defaults::MENTION_COLOR))),
        "topic" => Ok(Trigger::topic(TokenStyle::colored(defaults::TOPIC_COLOR))),
        other => bail!("unknown suggestion kind {other:?}"),
    }
}

fn backspace(session: &mut EditorSession) {
    let selection = session.selection();
    let range = if selection.is_empty() {
        if selection.start == 0 {
            return;
        }
        CharRange::new(selection.start - 1, 1)
    } else {
        selection
    };
    report(session.propose_edit(range, ""));
}

fn report(outcome: EditOutcome) {
    if let EditOutcome::Rejected(reason) = outcome {
        match reason {
            RejectReason::BudgetExceeded { would_be } => {
                println!("rejected: budget exceeded (would be {would_be})")
            }
            RejectReason::DeleteConfirmPending { selection } => println!(
                "rejected: confirm delete of [{}, {})",
                selection.start,
                selection.end()
            ),
            RejectReason::StalePendingDeleted => {
                println!("rejected: stale pending range deleted")
            }
            RejectReason::DuplicateInsert => println!("rejected: duplicate insert"),
        }
    }
}

fn show(session: &EditorSession) -> Result<()> {
    let selection = session.selection();
    println!("text: {:?}", session.plain_text());
    println!("selection: [{}, {})", selection.start, selection.end());
    match session.trigger_state() {
        TriggerState::Idle => println!("trigger: idle"),
        TriggerState::Composing {
            trigger_char,
            anchor,
            keyword,
        } => println!("trigger: composing {trigger_char:?} at {anchor}, keyword {keyword:?}"),
    }
    println!(
        "content: {}",
        serde_json::to_string_pretty(session.content())?
    );
    Ok(())
}
