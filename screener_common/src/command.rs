//! Request/reply protocol shared by client and server.
//!
//! A client sends one `Command` per line as JSON over TCP; the server answers each
//! command with exactly one `Reply` line. A reply is either the matching rows of
//! the current snapshot or a structured error, never both.
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{ErrorKind, ScreenerError};
use crate::filter_params::FilterParams;
use crate::row::RowSet;

/// What the server should do before filtering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    /// Rebuild the snapshot and fetch previous close for every symbol.
    LoadAll,
    /// Rebuild live prices only and reuse known previous close values.
    Refresh,
    /// Filter the cached snapshot without fetching anything.
    Filter,
}

/// Command payload sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Requested action.
    pub action: Action,
    /// Filter criteria applied to the resulting snapshot.
    #[serde(default)]
    pub params: FilterParams,
}

impl Command {
    /// Creates a new command.
    pub fn new(action: Action, params: FilterParams) -> Self {
        Command { action, params }
    }
}

/// Reply payload sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Reply {
    /// Rows of the current snapshot that passed the filter, in snapshot order.
    StockData {
        /// When the live columns of the snapshot were fetched; `None` if no
        /// snapshot has been loaded yet.
        as_of: Option<DateTime<Utc>>,
        /// Matching rows.
        rows: RowSet,
    },
    /// The command failed; the cached snapshot is unchanged.
    ErrorData {
        /// Failure category.
        kind: ErrorKind,
        /// Human-readable description.
        message: String,
    },
}

impl From<&ScreenerError> for Reply {
    fn from(err: &ScreenerError) -> Self {
        Reply::ErrorData {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
