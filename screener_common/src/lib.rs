//!
//! Common types and utilities shared by the screener server and client.
//!
//! This crate aggregates:
//! - `error` — unified error type `ScreenerError` used across the workspace.
//! - `result` — handy `Result<T, ScreenerError>` alias.
//! - `row` — the `QuoteRow` record and its declared numeric columns.
//! - `filter_params` — the optional filter criteria a client sends.
//! - `command` — JSON command and reply payloads exchanged over TCP.
//! - `net` — networking constants and small helpers.
#![warn(missing_docs)]
pub mod command;
pub mod error;
pub mod filter_params;
pub mod net;
pub mod result;
pub mod row;

pub use command::{Action, Command, Reply};
pub use error::{ErrorKind, ScreenerError};
pub use filter_params::{FilterParams, ParamValue};
pub use result::Result;
pub use row::{QuoteRow, RowSet};
