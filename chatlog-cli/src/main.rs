//! CLI entry point for chatlog

use anyhow::{Context, Result};
use chatlog_agent::{ChatSession, ConversationEngine, TurnOutcome};
use chatlog_core::config::ConfigLoader;
use chatlog_core::logging::init_logging;
use chatlog_core::utils::expand_tilde;
use chatlog_core::{HistoryStore, TokenUsage};
use chatlog_providers::OpenAIClient;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chatlog")]
#[command(about = "Chat with a language model and keep a daily history log")]
#[command(version)]
struct Cli {
    /// Configuration directory
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Directory holding the per-day history files
    #[arg(long)]
    history_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the key may come from the real environment.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config_loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let mut config = config_loader
        .load()
        .context("failed to load configuration")?;

    if let Some(model) = cli.model {
        config.provider.model = model;
    }
    if let Some(dir) = cli.history_dir {
        config.history.dir = dir.to_string_lossy().into_owned();
    }
    config.logging.dir = expand_tilde(&config.logging.dir)
        .to_string_lossy()
        .into_owned();

    let _log_guard = init_logging(&config.logging);

    let provider = Arc::new(OpenAIClient::from_config(&config.provider));
    let engine = ConversationEngine::from_config(provider, &config);
    let store = HistoryStore::new(expand_tilde(&config.history.dir));
    let date_key = HistoryStore::today_key();

    let mut session = ChatSession::open(engine, store, &date_key)
        .await
        .context("failed to load today's history")?;

    print_banner(&session);
    run_repl(&mut session, BufReader::new(tokio::io::stdin())).await?;

    info!("Session ended after {} turns today", session.history().len());
    Ok(())
}

fn print_banner(session: &ChatSession) {
    let path = session.store().path_for(session.history().date());
    println!("{}", style("chatlog").bold().cyan());
    println!(
        "{} {}",
        style("model:").dim(),
        session.engine().model()
    );
    println!(
        "{} {} ({} turns so far)",
        style("history:").dim(),
        path.display(),
        session.history().len()
    );
    println!(
        "{}\n",
        style("Type a message and press Enter. Ctrl+D or Ctrl+C to quit.").dim()
    );
}

/// Read lines until end of input or Ctrl+C, running one exchange per line.
///
/// The next line is only read once the current exchange has finished, so
/// input typed while a request is pending waits in the stdin buffer.
/// Every line is sent as typed, blank ones included.
async fn run_repl<R>(session: &mut ChatSession, reader: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        prompt()?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read input")?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(input) = line else {
            // end of input
            println!();
            break;
        };

        let spinner = loading_indicator();
        let result = tokio::select! {
            result = session.submit(&input) => result,
            _ = tokio::signal::ctrl_c() => {
                spinner.finish_and_clear();
                println!();
                break;
            }
        };
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => {
                error!("Turn failed: {}", e);
                eprintln!("{} {}", style("Error:").red().bold(), e);
            }
        }
    }

    Ok(())
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{} ", style(">").green().bold())?;
    stdout.flush()?;
    Ok(())
}

fn loading_indicator() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Loading...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("{}", outcome.reply.output);
    if let Some(line) = outcome.reply.usage.as_ref().and_then(format_usage) {
        println!("{}", style(line).dim());
    }
    if let Some(e) = &outcome.persist_error {
        eprintln!(
            "{} {}",
            style("Warning: reply not saved to history:").yellow(),
            e
        );
    }
}

/// One-line token summary; `None` when none of the counters were reported
fn format_usage(usage: &TokenUsage) -> Option<String> {
    let parts: Vec<String> = [
        usage.prompt_tokens.map(|n| format!("{} prompt", n)),
        usage.completion_tokens.map(|n| format!("{} completion", n)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let summary = match (parts.is_empty(), usage.total_tokens) {
        (true, None) => return None,
        (true, Some(total)) => format!("{} total", total),
        (false, None) => parts.join(" + "),
        (false, Some(total)) => format!("{} = {} total", parts.join(" + "), total),
    };
    Some(format!("[tokens: {}]", summary))
}
