//! F&O stock screener server.
//!
//! This binary keeps one in-memory snapshot of the exchange's F&O stock watch and
//! answers client commands against it. It wires together four building blocks:
//!
//! - Quote sources (`source`) — the exchange over blocking HTTP, or an offline
//!   random-walk market with `--synthetic`.
//! - The snapshot pipeline (`model`) — normalization of exchange-formatted numbers,
//!   snapshot building, previous-close enrichment fanned out over a bounded worker
//!   pool, the filter engine, and the single-slot snapshot store.
//! - `Screener` — the `load_all` / `refresh` / `filter_only` operations.
//! - `CommandReceiver` — a TCP listener that serves newline-delimited JSON commands,
//!   one thread per client connection.
//!
//! Network protocol (high-level):
//! - Bind address: `0.0.0.0:8080` by default (see `Args`).
//! - Client sends `{"action": "load_all" | "refresh" | "filter", "params": {...}}`.
//! - Server answers `{"event": "stock_data", ...}` with the matching rows, or
//!   `{"event": "error_data", "kind": ..., "message": ...}`.
#![warn(missing_docs)]
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use screener_common::Result;
use screener_common::net::addr;

use crate::args::Args;
use crate::model::normalizer::DashPolicy;
use crate::receiver::CommandReceiver;
use crate::screener::{Screener, ScreenerConfig};
use crate::source::nse::{NseClient, SourceConfig};
use crate::source::synthetic::SyntheticMarket;
use crate::source::{PrevCloseSource, QuoteSource};

mod args;
pub mod model;
mod receiver;
pub mod screener;
pub mod source;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let quotes: Arc<dyn QuoteSource>;
    let prev_close: Arc<dyn PrevCloseSource>;
    if args.synthetic {
        info!("Serving a synthetic market");
        let market = Arc::new(SyntheticMarket::default());
        quotes = market.clone();
        prev_close = market;
    } else {
        let client = Arc::new(NseClient::new(SourceConfig {
            quotes_url: args.quotes_url.clone(),
            prev_close_url: args.prev_close_url.clone(),
            timeout: Duration::from_secs(args.fetch_timeout_secs),
            user_agent: args.user_agent.clone(),
        })?);
        info!("Serving quotes from {}", args.quotes_url);
        quotes = client.clone();
        prev_close = client;
    }

    let config = ScreenerConfig {
        concurrency: args.concurrency,
        dash_policy: if args.dash_as_null {
            DashPolicy::Null
        } else {
            DashPolicy::Zero
        },
    };
    info!("Screener config: {:?}", config);
    let screener = Arc::new(Screener::new(quotes, prev_close, config));

    CommandReceiver::new(&addr(&args.bind, args.port))?.serve(screener)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
