//! Result type alias shared across the workspace.
//!
//! Defaults the error type to the common `ScreenerError`, so functions can simply
//! return `Result<T>`.
use crate::error::ScreenerError;

/// Workspace-wide `Result` alias with `ScreenerError` as the default error.
pub type Result<T, E = ScreenerError> = std::result::Result<T, E>;
