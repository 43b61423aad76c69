//! Screener Client — a TCP client that sends one command to the screener server and
//! prints the matching rows. With `--watch` it repeats the command on an interval
//! until Ctrl+C, which is how a live board keeps prices fresh.
//!
//! Usage example (CLI):
//! ```bash
//! screener_client --server-ip 192.168.0.10 --action load-all --max-price 500 --gap-up-per 2
//! screener_client --action refresh --gap-down-per 1 --watch 30
//! ```
#![warn(missing_docs)]
mod args;
mod sender;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};
use screener_common::net::addr;
use screener_common::{Command, QuoteRow, Reply, Result, ScreenerError};

use crate::args::Args;
use crate::sender::CommandSender;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| ScreenerError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;
    }

    let server_ip = args.server_ip.trim().replace('"', "");
    let server_address = addr(&server_ip, args.port);
    info!("Connecting to TCP server at {}", server_address);
    let mut sender = CommandSender::connect(&server_address)?;
    let command = Command::new(args.action, args.filter_params());

    loop {
        match sender.send_command(&command)? {
            Reply::StockData { as_of, rows } => print_rows(as_of, &rows),
            Reply::ErrorData { kind, message } => {
                error!("{}: {}", kind, message);
                if args.watch.is_none() {
                    return Err(ScreenerError::Format(message));
                }
            }
        }

        let Some(interval) = args.watch else {
            return Ok(());
        };
        if !wait(Duration::from_secs(interval), &shutdown) {
            info!("Client stopping...");
            return Ok(());
        }
    }
}

/// Sleeps for `interval` in short steps; returns `false` if shutdown was requested.
fn wait(interval: Duration, shutdown: &AtomicBool) -> bool {
    let step = Duration::from_millis(200);
    let mut waited = Duration::ZERO;
    while waited < interval {
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
        thread::sleep(step);
        waited += step;
    }
    !shutdown.load(Ordering::Relaxed)
}

fn print_rows(as_of: Option<chrono::DateTime<chrono::Utc>>, rows: &[QuoteRow]) {
    match as_of {
        Some(t) => info!("{} rows as of {}", rows.len(), t.with_timezone(&chrono::Local)),
        None => warn!("No snapshot loaded on the server yet"),
    }
    println!(
        "{:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "SYMBOL", "LTP", "OPEN", "HIGH", "LOW", "PREV", "GAP%"
    );
    for row in rows {
        println!(
            "{:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
            row.symbol,
            cell(row.ltp),
            cell(row.open),
            cell(row.high),
            cell(row.low),
            cell(row.prev_close),
            cell(row.gap_per),
        );
    }
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| String::from("-"), |v| format!("{:.2}", v))
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_cells_print_as_dash() {
        assert_eq!(cell(None), "-");
        assert_eq!(cell(Some(1234.5)), "1234.50");
    }

    #[test]
    fn args_become_text_params() {
        let args = Args::parse_from([
            "screener_client",
            "--action",
            "load-all",
            "--min-price",
            "100",
            "--gap-up-per",
            "2",
        ]);
        assert_eq!(args.action, screener_common::Action::LoadAll);
        let params = args.filter_params();
        assert_eq!(params.min_price, Some("100".into()));
        assert_eq!(params.gap_up_per, Some("2".into()));
        assert_eq!(params.max_price, None);
        assert_eq!(args.port, screener_common::net::COMMAND_PORT);
    }

    #[test]
    fn port_can_be_overridden() {
        let args = Args::parse_from(["screener_client", "--port", "9090"]);
        assert_eq!(addr(&args.server_ip, args.port), "127.0.0.1:9090");
    }

    #[test]
    fn wait_stops_on_shutdown() {
        let shutdown = AtomicBool::new(true);
        assert!(!wait(Duration::from_secs(5), &shutdown));
    }
}
