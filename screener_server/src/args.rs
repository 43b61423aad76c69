//! Command-line arguments for the screener server.
use clap::Parser;
use screener_common::net::COMMAND_PORT;

use crate::model::enrichment::DEFAULT_CONCURRENCY;
use crate::source::nse::{DEFAULT_USER_AGENT, PREV_CLOSE_URL, QUOTES_URL};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to bind the command listener to.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// TCP port for client commands.
    #[clap(long, default_value_t = COMMAND_PORT)]
    pub port: u16,

    /// Bulk quotes endpoint.
    #[clap(long, default_value = QUOTES_URL)]
    pub quotes_url: String,

    /// Per-symbol quote page holding the previous close.
    #[clap(long, default_value = PREV_CLOSE_URL)]
    pub prev_close_url: String,

    /// Maximum previous-close requests in flight.
    #[clap(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Timeout for every upstream request, in seconds.
    #[clap(long, default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// User-Agent sent upstream.
    #[clap(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Treat the "-" placeholder as a missing value instead of zero.
    #[clap(long)]
    pub dash_as_null: bool,

    /// Serve a random-walk market instead of the exchange.
    #[clap(long)]
    pub synthetic: bool,
}
