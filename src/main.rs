//! foundry-chat — console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI flags
//!   3. Init logger (CLI verbosity > RUST_LOG > "info")
//!   4. Load config; validate unless running in demo mode
//!   5. Build the chat session (live, or demo on request/failure)
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run the console loop until quit/EOF/Ctrl-C

use tokio_util::sync::CancellationToken;
use tracing::info;

use foundry_chat::config::{self, Config};
use foundry_chat::error::AppError;
use foundry_chat::session::ChatSession;
use foundry_chat::{console, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        if matches!(e, AppError::Config(_)) {
            print_config_help();
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    logger::init(args.log_level.unwrap_or("info"), args.log_level.is_some())?;

    let config = config::load()?;
    if !args.demo {
        config.validate()?;
    }

    info!(
        app_title = %config.app_title,
        deployment = %config.openai.deployment,
        rag_enabled = config.rag.enabled,
        demo = args.demo,
        "config loaded"
    );

    let mut session = ChatSession::new(&config, args.demo);

    // Shared shutdown token — Ctrl-C cancels it, the console loop watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — shutting down");
            ctrlc_token.cancel();
        }
    });

    print_startup_summary(&config, &session);

    console::run(&mut session, &config, shutdown).await?;

    println!("\nBye :) ...");
    let _ = {
        use std::io::Write as _;
        std::io::stdout().flush()
    };

    Ok(())
}

fn print_startup_summary(config: &Config, session: &ChatSession) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        let count = text.chars().count();
        if count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let mode_line = if session.is_degraded() {
        "🎭 demo — offline canned responses".to_string()
    } else {
        format!("🤖 live — deployment={}", config.openai.deployment)
    };

    let model_line = format!(
        "model={} temp={} max_tokens={} timeout={}s",
        config.openai.model,
        config.openai.temperature,
        config.openai.max_tokens,
        config.request_timeout_secs
    );

    let rag_line = if session.rag_active() {
        format!("🟢 index={} strategy={} top_k={}", config.rag.index, config.rag.strategy, config.rag.top_k)
    } else {
        "🔴 disabled".to_string()
    };

    let limits_line = format!(
        "history={} retries={}",
        config.history_limit, config.max_retries
    );

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 💬 {}║", fit(config.app_title.clone()));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ Mode:   {}║", fit(mode_line));
    println!("║ LLM:    {}║", fit(model_line));
    println!("║ RAG:    {}║", fit(rag_line));
    println!("║ Limits: {}║", fit(limits_line));
    println!("╚══════════════════════════════════════════════════════════════╝");
}

fn print_config_help() {
    eprintln!();
    eprintln!("Configuration required. Please ensure you have:");
    eprintln!("  1. A .env file (or exported env vars) with your Azure settings");
    eprintln!("  2. AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY and AZURE_OPENAI_DEPLOYMENT set");
    eprintln!("  3. AZURE_SEARCH_ENDPOINT, AZURE_SEARCH_KEY and AZURE_SEARCH_INDEX set, or ENABLE_RAG=false");
    eprintln!();
    eprintln!("Run with --demo to try the console without any credentials.");
}

struct CliArgs {
    log_level: Option<&'static str>,
    demo: bool,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut demo = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: foundry-chat [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help             Print help");
                println!("      --demo             Run the offline demo responder (no credentials needed)");
                println!("  -v, -vv, -vvv, -vvvv   Increase logging verbosity");
                std::process::exit(0);
            }
            "--demo" => demo = true,
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier from the "info" default:
    //   -v      → warn   (suppress info noise, warnings+errors only)
    //   -vv     → info   (normal operational output)
    //   -vvv    → debug  (flow-level diagnostics: tiers, request sizes)
    //   -vvvv+  → trace  (full payload dumps, very verbose)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, demo }
}
