//! Derived columns: previous close and gap percentage.
//!
//! Previous close comes from a per-symbol source, so fetching it for a whole
//! snapshot means one round trip per symbol. `Enricher` fans those requests out
//! over a fixed number of scoped worker threads fed from a `crossbeam_channel` job
//! queue, and joins every worker before touching the snapshot again.
//!
//! Failure model:
//! - A failed (or panicking) fetch only affects its own symbol: the failure is logged and
//!   reported in `EnrichReport`, and that row's `prevClose` is left null.
//! - `gapPer` is recomputed for every row after previous close is settled, whether
//!   it was fetched now or kept from an earlier enrichment, because `open` may have
//!   moved since.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam_channel::unbounded;
use log::{debug, info, warn};
use screener_common::{Result, ScreenerError};

use crate::model::normalizer::normalize;
use crate::model::snapshot::Snapshot;
use crate::source::PrevCloseSource;

/// Default number of previous-close requests in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 15;

/// Outcome of one enrichment pass.
#[derive(Debug, Default)]
pub struct EnrichReport {
    /// Symbols whose previous close was fetched and parsed.
    pub fetched: usize,
    /// Symbols whose fetch failed, with the cause.
    pub failures: Vec<(String, ScreenerError)>,
}

/// Fills `prevClose` and computes `gapPer` on a snapshot.
pub struct Enricher<'a> {
    source: &'a dyn PrevCloseSource,
    concurrency: usize,
}

impl<'a> Enricher<'a> {
    /// Creates an enricher; a `concurrency` of zero is treated as one.
    pub fn new(source: &'a dyn PrevCloseSource, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Enriches `snapshot` in place.
    ///
    /// With `fetch_prev_close` set, previous close is fetched for every symbol
    /// (symbols whose fetch fails end up null). Otherwise the existing values are
    /// reused. `gapPer` is recomputed for every row in both cases.
    pub fn enrich(&self, snapshot: &mut Snapshot, fetch_prev_close: bool) -> EnrichReport {
        let mut report = EnrichReport::default();

        if fetch_prev_close {
            let symbols: Vec<String> = snapshot.symbols().map(String::from).collect();
            for (symbol, outcome) in self.fetch_all(symbols) {
                let prev_close = match outcome {
                    Ok(value) => {
                        debug!("{} previous close {}", symbol, value);
                        report.fetched += 1;
                        Some(value)
                    }
                    Err(e) => {
                        warn!("Previous close for {} unavailable: {}", symbol, e);
                        report.failures.push((symbol.clone(), e));
                        None
                    }
                };
                if let Some(row) = snapshot.get_mut(&symbol) {
                    row.prev_close = prev_close;
                }
            }
            info!(
                "Previous close fetched for {} symbols, {} failed",
                report.fetched,
                report.failures.len()
            );
        }

        compute_gap_per(snapshot);
        report
    }

    /// Fetches previous close for every symbol and returns one outcome per symbol.
    ///
    /// Returns only after every worker has finished.
    fn fetch_all(&self, symbols: Vec<String>) -> Vec<(String, Result<f64>)> {
        if symbols.is_empty() {
            return Vec::new();
        }
        let workers = self.concurrency.min(symbols.len());
        let (job_tx, job_rx) = unbounded::<String>();
        let (result_tx, result_rx) = unbounded::<(String, Result<f64>)>();

        for symbol in symbols {
            // Both ends are alive here, so the send cannot fail.
            let _ = job_tx.send(symbol);
        }
        drop(job_tx);

        let source = self.source;
        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for symbol in job_rx.iter() {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| fetch_one(source, &symbol)))
                            .unwrap_or_else(|payload| Err(panicked(&symbol, payload)));
                        if result_tx.send((symbol, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        result_rx.try_iter().collect()
    }
}

fn fetch_one(source: &dyn PrevCloseSource, symbol: &str) -> Result<f64> {
    let raw = source.fetch_previous_close(symbol)?;
    normalize(raw.trim())
        .parse::<f64>()
        .map_err(|e| ScreenerError::MalformedRow(format!("{}: previous close {:?}: {}", symbol, raw, e)))
}

fn panicked(symbol: &str, payload: Box<dyn Any + Send>) -> ScreenerError {
    let cause = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown cause"));
    ScreenerError::SourceUnavailable(format!("{}: previous close fetch panicked: {}", symbol, cause))
}

/// Recomputes `gapPer = (open - prevClose) * 100 / prevClose` for every row.
///
/// A null or zero `prevClose`, or a null `open`, yields a null `gapPer`.
pub fn compute_gap_per(snapshot: &mut Snapshot) {
    for row in snapshot.rows_mut() {
        row.gap_per = match (row.open, row.prev_close) {
            (Some(open), Some(prev)) if prev != 0.0 => {
                Some((open - prev) * 100.0 / prev).filter(|g| g.is_finite())
            }
            _ => None,
        };
    }
}
