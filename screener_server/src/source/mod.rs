//! Quote sources feeding the snapshot pipeline.
//!
//! - `QuoteSource` — one bulk fetch of every row record from the primary feed.
//! - `PrevCloseSource` — one round trip per symbol for its previous close.
//! - `nse` — blocking HTTP adapters for the exchange endpoints.
//! - `synthetic` — offline random-walk market implementing both traits.
//!
//! Both traits are `Send + Sync` because enrichment calls the secondary source
//! from several worker threads at once.
use screener_common::Result;
use serde_json::{Map, Value};

pub mod nse;
pub mod synthetic;

/// A row record exactly as the primary feed delivered it.
pub type RawRow = Map<String, Value>;

/// Bulk source of live quote rows.
pub trait QuoteSource: Send + Sync {
    /// Fetches every row record, in feed order.
    ///
    /// Fails with `ScreenerError::SourceUnavailable` when the feed cannot be reached
    /// or its payload has no `data` array.
    fn fetch_rows(&self) -> Result<Vec<RawRow>>;
}

/// Per-symbol source of the previous session close.
pub trait PrevCloseSource: Send + Sync {
    /// Fetches the raw previous-close text for `symbol` (still exchange formatted).
    fn fetch_previous_close(&self, symbol: &str) -> Result<String>;
}
