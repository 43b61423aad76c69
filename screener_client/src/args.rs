//! Command-line arguments for the screener client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use screener_common::net::COMMAND_PORT;
use screener_common::{Action, FilterParams};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Server IP address where the screener service is running.
    #[clap(long, default_value = "127.0.0.1")]
    pub server_ip: String,

    /// TCP port the server listens on for commands.
    #[clap(long, default_value_t = COMMAND_PORT)]
    pub port: u16,

    /// What the server should do before filtering.
    #[clap(long, value_enum, default_value_t = Action::Filter)]
    pub action: Action,

    /// Lowest last traded price.
    #[clap(long)]
    pub min_price: Option<String>,

    /// Highest last traded price.
    #[clap(long)]
    pub max_price: Option<String>,

    /// Largest accepted gap up, in percent.
    #[clap(long)]
    pub gap_up_per: Option<String>,

    /// Largest accepted gap down, in percent.
    #[clap(long)]
    pub gap_down_per: Option<String>,

    /// Largest accepted distance of open above the day low, in percent.
    #[clap(long)]
    pub open_low_same_per: Option<String>,

    /// Largest accepted distance of open below the day high, in percent.
    #[clap(long)]
    pub open_high_same_per: Option<String>,

    /// Repeat the command every N seconds until Ctrl+C.
    #[clap(long)]
    pub watch: Option<u64>,
}

impl Args {
    /// Filter criteria as sent to the server. Values are passed through as text so the
    /// server reports any that do not parse.
    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            min_price: self.min_price.as_deref().map(Into::into),
            max_price: self.max_price.as_deref().map(Into::into),
            gap_up_per: self.gap_up_per.as_deref().map(Into::into),
            gap_down_per: self.gap_down_per.as_deref().map(Into::into),
            open_low_same_per: self.open_low_same_per.as_deref().map(Into::into),
            open_high_same_per: self.open_high_same_per.as_deref().map(Into::into),
        }
    }
}
