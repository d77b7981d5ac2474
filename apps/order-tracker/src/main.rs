//! Order Tracker Binary
//!
//! Replays order commands read from stdin as JSON lines and prints every
//! published market event to stdout as a JSON line. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-tracker -- config.yaml < session.jsonl
//! ```
//!
//! # Commands
//!
//! ```text
//! {"command":"track","client_order_id":"A","trading_pair":"BTC-USDT","order_type":"LIMIT","trade_type":"BUY","amount":"1","price":"100"}
//! {"command":"order_update","client_order_id":"A","new_state":"OPEN","sequence":1,"exchange_order_id":"EX-1"}
//! {"command":"trade_update","trade_id":"T-1","client_order_id":"A","fill_price":"100","fill_base_amount":"1","fill_quote_amount":"100","fee":{"asset":"USDT","amount":"0.1"},"sequence":1}
//! {"command":"stop","client_order_id":"A"}
//! {"command":"status"}
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_TRACKER_CONFIG`: Config file path (alternative to the first argument)
//! - `RUST_LOG`: Log level (default: from config, else info)

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use order_tracker::application::ports::{EventListener, ListenerError};
use order_tracker::config::{Config, load_config};
use order_tracker::observability::{init_metrics, parse_listen_addr};
use order_tracker::telemetry::init_tracing;
use order_tracker::{
    ClientOrderId, Container, CreateOrderCommand, InFlightOrder, InFlightOrderTracker,
    MarketEvent, OrderUpdate, TradeUpdate, spawn_cache_sweeper,
};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// One line of input.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Command {
    Track(CreateOrderCommand),
    OrderUpdate(OrderUpdate),
    TradeUpdate(TradeUpdate),
    Stop { client_order_id: ClientOrderId },
    Status,
}

/// Listener printing each event as a JSON line.
struct JsonLinesWriter;

impl EventListener for JsonLinesWriter {
    fn name(&self) -> &str {
        "json_lines_writer"
    }

    fn on_event(&self, event: &MarketEvent) -> Result<(), ListenerError> {
        let failed = |message: String| ListenerError::HandlerFailed {
            listener: self.name().to_string(),
            event: event.tag(),
            message,
        };
        let line = serde_json::to_string(event).map_err(|e| failed(e.to_string()))?;
        writeln!(std::io::stdout().lock(), "{line}").map_err(|e| failed(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match config_path() {
        Some(path) => load_config(Some(&path)).with_context(|| format!("loading {path}"))?,
        None => Config::default(),
    };

    init_tracing(&config.observability.logging)?;
    tracing::info!("Starting order tracker");

    if config.observability.metrics.enabled {
        init_metrics(parse_listen_addr(&config.observability.metrics.listen_addr)?)?;
    }

    let container = Container::with_system_clock(&config.tracker);
    container
        .event_bus()
        .add_listener_for_all(Arc::new(JsonLinesWriter));
    let tracker = container.tracker();

    let shutdown = CancellationToken::new();
    let sweeper = spawn_cache_sweeper(
        Arc::clone(&tracker),
        config.tracker.sweep_interval(),
        shutdown.clone(),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("reading stdin")? {
                    Some(line) => handle_line(&tracker, &line)?,
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    shutdown.cancel();
    sweeper.await.context("joining cache sweeper")?;

    tracing::info!(status = ?tracker.status(), "Order tracker stopped");
    Ok(())
}

fn config_path() -> Option<String> {
    std::env::var("ORDER_TRACKER_CONFIG")
        .ok()
        .filter(|p| !p.is_empty())
        .or_else(|| std::env::args().nth(1))
}

fn handle_line(tracker: &InFlightOrderTracker, line: &str) -> anyhow::Result<()> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    let command: Command = match serde_json::from_str(line) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!(error = %e, line, "Skipping malformed command");
            return Ok(());
        }
    };

    match command {
        Command::Track(cmd) => tracker.start_tracking(InFlightOrder::new(cmd)),
        Command::OrderUpdate(update) => {
            tracker.process_order_update(&update);
        }
        Command::TradeUpdate(trade) => {
            tracker.process_trade_update(&trade);
        }
        Command::Stop { client_order_id } => {
            tracker.stop_tracking(&client_order_id);
        }
        Command::Status => {
            let status = serde_json::to_string(&tracker.status())?;
            writeln!(std::io::stdout().lock(), "{status}")?;
        }
    }
    Ok(())
}
