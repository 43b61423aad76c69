//! Snapshot pipeline for the screener server.
//!
//! - `normalizer` — cleanup of exchange-formatted numeric text.
//! - `snapshot` — the ordered symbol → row `Snapshot` and its builder.
//! - `enrichment` — previous-close fan-out and gap percentage.
//! - `filter` — row predicates and their conjunction.
//! - `store` — the single-slot snapshot cache.

pub mod enrichment;
pub mod filter;
pub mod normalizer;
pub mod snapshot;
pub mod store;
