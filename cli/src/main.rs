//! Telecom call center: text-mode CLI
//!
//! Drives the call-turn runtime from the terminal. Typed text stands in for
//! transcribed speech and the agent reply is printed instead of spoken.
//!
//! Usage:
//!   callcenter turn --text "my bill is wrong, overcharged 500 rupees"
//!   callcenter turn --text "still no refund" --call-id C-1A2B3C4D-250101120000
//!   callcenter call --offline
//!   callcenter scenarios
//!   callcenter logs --call-id C-1A2B3C4D-250101120000

mod config;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use callcenter_contracts::{
    error::CallcenterResult,
    script::{extract_script_text, ScriptParts},
    state::CallState,
};
use callcenter_core::{
    traits::{CallLogWriter, TextGenerator},
    CallGraph, CallSession,
};
use callcenter_llm::{GroqClient, OfflineGenerator};
use callcenter_log::{verify_log, FileCallLogWriter, InMemoryCallLogWriter};
use callcenter_telecom::{build_call_graph, scenarios};

use crate::config::AppConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Telecom voice call center, text mode.
#[derive(Parser)]
#[command(
    name = "callcenter",
    about = "Telecom call-turn runtime: classify a complaint and script the agent reply",
    long_about = "Runs call turns through preprocessing, intent classification with a keyword\n\
                  fallback, routing, and one of six scripted telecom handlers."
)]
struct Cli {
    /// Path to a TOML config file (default: ./callcenter.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single turn for one utterance.
    Turn {
        /// The caller's utterance.
        #[arg(long)]
        text: String,
        /// Continue an existing call instead of starting a new one.
        #[arg(long)]
        call_id: Option<String>,
        /// Use the offline backend instead of the hosted model.
        #[arg(long)]
        offline: bool,
    },
    /// Interactive call: one utterance per line, `/end` to hang up.
    Call {
        #[arg(long)]
        offline: bool,
    },
    /// Run the built-in end-to-end scenarios (no network).
    Scenarios,
    /// List recorded calls, or show one call's turns.
    Logs {
        #[arg(long)]
        call_id: Option<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("callcenter: {}", e);
            std::process::exit(2);
        }
    };

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let result = match cli.command {
        Command::Turn { text, call_id, offline } => run_turn(&config, &text, call_id, offline),
        Command::Call { offline } => run_call(&config, offline),
        Command::Scenarios => run_scenarios(),
        Command::Logs { call_id } => run_logs(&config, call_id.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("callcenter: {}", e);
        std::process::exit(1);
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn build_graph(config: &AppConfig, offline: bool) -> CallcenterResult<CallGraph> {
    let keywords = config.keyword_table()?;
    let generator: Arc<dyn TextGenerator> = if offline {
        Arc::new(OfflineGenerator)
    } else {
        Arc::new(GroqClient::new(config.llm_config())?)
    };
    build_call_graph(generator, keywords)
}

/// The graph, or `None` when it cannot be built. Turns still complete, with
/// the system-error script.
fn graph_or_degraded(config: &AppConfig, offline: bool) -> Option<CallGraph> {
    match build_graph(config, offline) {
        Ok(graph) => Some(graph),
        Err(e) => {
            warn!(error = %e, "call graph unavailable; turns will return the system-error script");
            eprintln!("warning: {}", e);
            None
        }
    }
}

fn call_log(config: &AppConfig) -> Box<dyn CallLogWriter> {
    if config.call_log.enabled {
        Box::new(FileCallLogWriter::new(&config.call_log.dir))
    } else {
        Box::new(InMemoryCallLogWriter::new())
    }
}

/// Resume `call_id` from its recorded transcript, or start it fresh.
fn resume_session(config: &AppConfig, call_id: String) -> CallSession {
    let transcript = FileCallLogWriter::new(&config.call_log.dir)
        .load(&call_id)
        .ok()
        .flatten()
        .and_then(|log| log.latest_state().cloned())
        .and_then(|state| serde_json::from_value::<CallState>(state).ok())
        .map(|state| state.transcript)
        .unwrap_or_default();
    CallSession::resume(call_id, transcript)
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_turn(
    config: &AppConfig,
    text: &str,
    call_id: Option<String>,
    offline: bool,
) -> CallcenterResult<()> {
    let graph = graph_or_degraded(config, offline);
    let log = call_log(config);
    let mut session = match call_id {
        Some(id) => resume_session(config, id),
        None => CallSession::start(),
    };

    let state = session.take_turn(graph.as_ref(), text, &*log)?;
    print_turn(&state);
    Ok(())
}

fn run_call(config: &AppConfig, offline: bool) -> CallcenterResult<()> {
    let graph = graph_or_degraded(config, offline);
    let log = call_log(config);
    let mut session = CallSession::start();

    println!("Call {} connected. Type an utterance per line, /end to hang up.", session.call_id());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("caller> ");
        let _ = io::stdout().flush();

        let Some(Ok(line)) = lines.next() else { break };
        let line = line.trim();
        if line == "/end" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let state = session.take_turn(graph.as_ref(), line, &*log)?;
        print_turn(&state);
    }

    session.end();
    println!("{}", CallSession::END_OF_CALL_NOTICE);
    if config.call_log.enabled {
        println!("Log: {}", config.call_log.dir.join(format!("{}.json", session.call_id())).display());
    }
    Ok(())
}

fn run_scenarios() -> CallcenterResult<()> {
    let reports = scenarios::run_all()?;
    let mut failures = 0;

    for (idx, report) in reports.iter().enumerate() {
        println!("=== Scenario {}: {} ===", idx + 1, report.title);
        for check in &report.checks {
            println!("  [{}] {}", if check.passed { "PASS" } else { "FAIL" }, check.name);
        }
        if let Some(handler) = report.handler {
            println!("  Handler:  {}", handler);
        }
        println!("  Reply:    {}", extract_script_text(Some(&report.final_state.script)));
        println!();
        if !report.passed() {
            failures += 1;
        }
    }

    if failures > 0 {
        eprintln!("{} scenario(s) failed", failures);
        std::process::exit(1);
    }
    println!("All {} scenarios passed.", reports.len());
    Ok(())
}

fn run_logs(config: &AppConfig, call_id: Option<&str>) -> CallcenterResult<()> {
    let store = FileCallLogWriter::new(&config.call_log.dir);

    let Some(call_id) = call_id else {
        let ids = store.list()?;
        if ids.is_empty() {
            println!("No call logs in {}", store.dir().display());
        }
        for id in ids {
            match store.load(&id) {
                Ok(Some(log)) => println!(
                    "{}  {} turn(s)  chain {}",
                    id,
                    log.turns.len(),
                    if verify_log(&log) { "VERIFIED" } else { "BROKEN" }
                ),
                Ok(None) => {}
                Err(e) => println!("{}  unreadable: {}", id, e),
            }
        }
        return Ok(());
    };

    let Some(log) = store.load(call_id)? else {
        println!("No log recorded for call {}", call_id);
        return Ok(());
    };

    println!("Call {}", log.call_id);
    for turn in &log.turns {
        let state: Option<CallState> = serde_json::from_value(turn.state.clone()).ok();
        match state {
            Some(state) => println!(
                "  #{} {}  intent={} confidence={:.2}  reply={}",
                turn.sequence,
                turn.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                state.intent,
                state.confidence,
                extract_script_text(Some(&state.script))
            ),
            None => println!("  #{} (state not readable)", turn.sequence),
        }
    }
    println!(
        "Chain integrity: {}",
        if verify_log(&log) { "VERIFIED" } else { "BROKEN" }
    );
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_turn(state: &CallState) {
    let reply = extract_script_text(Some(&state.script));

    println!("Call:        {}", state.call_id);
    println!("Intent:      {} ({:.2})", state.intent, state.confidence);
    if !state.entities.is_empty() {
        let entities: Vec<String> = state
            .entities
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("Entities:    {}", entities.join(", "));
    }
    match ScriptParts::parse(&reply) {
        Some(parts) => {
            println!("Agent:       {}", parts.customer_message);
            println!("Action:      {}", parts.action_label);
            println!("Note:        {}", parts.internal_note);
        }
        None => println!("Agent:       {}", reply),
    }
    println!("Next action: {}", state.next_action.as_str());
    println!();
}
