//! Console chat channel — reads lines from stdin, resolves each turn through
//! the session, prints the reply to stdout.
//!
//! Runs until the `shutdown` token is cancelled (Ctrl-C) or stdin closes.
//! Lines starting with `/` are commands handled locally; everything else is
//! a chat turn.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::session::ChatSession;

enum Flow {
    Continue,
    Quit,
}

pub async fn run(
    session: &mut ChatSession,
    config: &Config,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!("console channel started — type a message and press Enter, Ctrl-C to quit");

    if session.message_count() == 0 {
        println!("👋 Welcome! Start a conversation by typing a message below. (/help for commands)");
    }

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Ok(Some(input)) => {
                        let input = input.trim();
                        if input.is_empty() {
                            continue;
                        }

                        if let Some(command) = input.strip_prefix('/') {
                            match handle_command(command, session, config) {
                                Flow::Continue => continue,
                                Flow::Quit => break,
                            }
                        }

                        debug!(chars = input.len(), "console received message");
                        let result = session.send(input).await;
                        println!("{}", result.content);
                    }
                }
            }
        }
    }

    Ok(())
}

fn handle_command(command: &str, session: &mut ChatSession, config: &Config) -> Flow {
    match command {
        "clear" => {
            session.clear();
            println!("🗑️  Conversation cleared.");
            Flow::Continue
        }
        "status" => {
            print_status(session, config);
            Flow::Continue
        }
        "help" => {
            println!("Commands:");
            println!("  /clear   clear the conversation history");
            println!("  /status  show session and configuration status");
            println!("  /help    show this list");
            println!("  /quit    exit");
            Flow::Continue
        }
        "quit" | "exit" => Flow::Quit,
        other => {
            println!("unknown command: /{other} — try /help");
            Flow::Continue
        }
    }
}

fn print_status(session: &ChatSession, config: &Config) {
    let mode = if session.is_degraded() { "🎭 demo" } else { "🤖 live" };
    println!("Mode:         {mode} ({})", session.client_label());
    if session.rag_active() {
        println!("RAG:          🟢 enabled (index={}, strategy={})", config.rag.index, config.rag.strategy);
    } else {
        println!("RAG:          🔴 disabled");
    }
    println!(
        "Model:        deployment={} model={} temp={} max_tokens={}",
        config.openai.deployment, config.openai.model, config.openai.temperature, config.openai.max_tokens
    );
    println!(
        "Limits:       history={} timeout={}s retries={}",
        config.history_limit, config.request_timeout_secs, config.max_retries
    );
    println!(
        "Session:      {} messages, {} characters",
        session.message_count(),
        session.content_chars()
    );
}
