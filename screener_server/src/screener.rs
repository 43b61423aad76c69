//! The screener service: load, refresh and filter over the cached snapshot.
//!
//! Each public call parses the filter parameters first, so a bad parameter is
//! reported before any fetch happens. Load and refresh build their new snapshot
//! inside `SnapshotStore::update`; any source or row error aborts the call and the
//! cached snapshot stays as it was.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use screener_common::{FilterParams, Result, RowSet};

use crate::model::enrichment::Enricher;
use crate::model::filter::FilterSet;
use crate::model::normalizer::DashPolicy;
use crate::model::snapshot::{Snapshot, SnapshotBuilder};
use crate::model::store::SnapshotStore;
use crate::source::{PrevCloseSource, QuoteSource};

/// Rows returned by a screener call together with the snapshot time they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Screened {
    /// Fetch time of the snapshot that was filtered; `None` when nothing is cached.
    pub as_of: Option<DateTime<Utc>>,
    /// Matching rows in snapshot order.
    pub rows: RowSet,
}

impl Screened {
    fn from_snapshot(snapshot: &Snapshot, filter: &FilterSet) -> Self {
        Screened {
            as_of: Some(snapshot.fetched_at()),
            rows: filter.apply(snapshot),
        }
    }
}

/// Tuning knobs of the service.
#[derive(Debug, Clone, Copy)]
pub struct ScreenerConfig {
    /// Maximum previous-close requests in flight.
    pub concurrency: usize,
    /// Interpretation of the `"-"` placeholder.
    pub dash_policy: DashPolicy,
}

/// Snapshot pipeline wired to its sources and cache.
pub struct Screener {
    quotes: Arc<dyn QuoteSource>,
    prev_close: Arc<dyn PrevCloseSource>,
    builder: SnapshotBuilder,
    concurrency: usize,
    store: SnapshotStore,
}

impl Screener {
    /// Creates a service with an empty cache.
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        prev_close: Arc<dyn PrevCloseSource>,
        config: ScreenerConfig,
    ) -> Self {
        Self {
            quotes,
            prev_close,
            builder: SnapshotBuilder::new(config.dash_policy),
            concurrency: config.concurrency,
            store: SnapshotStore::new(),
        }
    }

    /// Rebuilds the snapshot, fetches previous close for every symbol, replaces the
    /// cache and returns the filtered rows.
    pub fn load_all(&self, params: &FilterParams) -> Result<Screened> {
        let filter = FilterSet::from_params(params)?;
        let snapshot = self.store.update(|_| {
            let mut snapshot = self.builder.build(self.quotes.as_ref())?;
            Enricher::new(self.prev_close.as_ref(), self.concurrency).enrich(&mut snapshot, true);
            Ok(snapshot)
        })?;
        info!("Loaded snapshot of {} symbols", snapshot.len());
        Ok(Screened::from_snapshot(&snapshot, &filter))
    }

    /// Rebuilds live columns only, merges them into the cached snapshot, recomputes
    /// the gap from the cached previous close and returns the filtered rows.
    ///
    /// With nothing cached yet the fresh snapshot is stored as is, without previous
    /// close.
    pub fn refresh(&self, params: &FilterParams) -> Result<Screened> {
        let filter = FilterSet::from_params(params)?;
        let snapshot = self.store.update(|previous| {
            let fresh = self.builder.build(self.quotes.as_ref())?;
            let mut snapshot = match previous {
                Some(cached) => {
                    let mut merged = cached.clone();
                    merged.merge_live(fresh);
                    merged
                }
                None => fresh,
            };
            Enricher::new(self.prev_close.as_ref(), self.concurrency).enrich(&mut snapshot, false);
            Ok(snapshot)
        })?;
        info!("Refreshed snapshot of {} symbols", snapshot.len());
        Ok(Screened::from_snapshot(&snapshot, &filter))
    }

    /// Filters the cached snapshot without fetching. Nothing cached yields no rows.
    pub fn filter_only(&self, params: &FilterParams) -> Result<Screened> {
        let filter = FilterSet::from_params(params)?;
        Ok(match self.store.current()? {
            Some(snapshot) => Screened::from_snapshot(&snapshot, &filter),
            None => Screened {
                as_of: None,
                rows: RowSet::new(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RawRow;
    use screener_common::ScreenerError;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Primary source replaying queued payloads; `None` simulates an outage.
    #[derive(Default)]
    struct ScriptedQuotes {
        payloads: Mutex<Vec<Option<Vec<Value>>>>,
    }

    impl ScriptedQuotes {
        fn push(&self, rows: Option<Vec<Value>>) {
            self.payloads.lock().unwrap().insert(0, rows);
        }
    }

    impl QuoteSource for ScriptedQuotes {
        fn fetch_rows(&self) -> Result<Vec<RawRow>> {
            match self.payloads.lock().unwrap().pop().flatten() {
                Some(rows) => Ok(rows
                    .into_iter()
                    .map(|v| match v {
                        Value::Object(map) => map,
                        _ => RawRow::new(),
                    })
                    .collect()),
                None => Err(ScreenerError::SourceUnavailable("scripted outage".into())),
            }
        }
    }

    #[derive(Default)]
    struct CountingPrevClose {
        values: Mutex<HashMap<String, String>>,
        calls: AtomicUsize,
    }

    impl PrevCloseSource for CountingPrevClose {
        fn fetch_previous_close(&self, symbol: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.values
                .lock()
                .unwrap()
                .get(symbol)
                .cloned()
                .ok_or_else(|| ScreenerError::SourceUnavailable(symbol.to_string()))
        }
    }

    fn screener() -> (Screener, Arc<ScriptedQuotes>, Arc<CountingPrevClose>) {
        let quotes = Arc::new(ScriptedQuotes::default());
        let prev = Arc::new(CountingPrevClose::default());
        let screener = Screener::new(
            quotes.clone(),
            prev.clone(),
            ScreenerConfig {
                concurrency: 4,
                dash_policy: DashPolicy::Zero,
            },
        );
        (screener, quotes, prev)
    }

    fn set_prev(prev: &CountingPrevClose, symbol: &str, value: &str) {
        prev.values
            .lock()
            .unwrap()
            .insert(symbol.to_string(), value.to_string());
    }

    #[test]
    fn filter_before_any_load_is_empty() {
        let (screener, _, _) = screener();
        let screened = screener.filter_only(&FilterParams::default()).unwrap();
        assert!(screened.rows.is_empty());
        assert_eq!(screened.as_of, None);
    }

    #[test]
    fn load_all_enriches_and_filters() {
        let (screener, quotes, prev) = screener();
        quotes.push(Some(vec![
            json!({"symbol": "X", "open": "102", "ltP": "150"}),
            json!({"symbol": "Y", "open": "1,000", "ltP": "1,010"}),
        ]));
        set_prev(&prev, "X", "100");
        set_prev(&prev, "Y", "1,000");

        let params = FilterParams {
            max_price: Some("200".into()),
            ..Default::default()
        };
        let screened = screener.load_all(&params).unwrap();
        assert_eq!(screened.rows.len(), 1);
        assert_eq!(screened.rows[0].symbol, "X");
        assert_eq!(screened.rows[0].prev_close, Some(100.0));
        assert!((screened.rows[0].gap_per.unwrap() - 2.0).abs() < 1e-9);
        assert!(screened.as_of.is_some());

        let all = screener.filter_only(&FilterParams::default()).unwrap();
        assert_eq!(all.rows.len(), 2);
    }

    #[test]
    fn refresh_reuses_prev_close_and_recomputes_gap() {
        let (screener, quotes, prev) = screener();
        quotes.push(Some(vec![json!({"symbol": "X", "open": "102"})]));
        quotes.push(Some(vec![json!({"symbol": "X", "open": "105"})]));
        set_prev(&prev, "X", "100");

        let loaded = screener.load_all(&FilterParams::default()).unwrap();
        let calls_after_load = prev.calls.load(Ordering::SeqCst);
        set_prev(&prev, "X", "999");

        let refreshed = screener.refresh(&FilterParams::default()).unwrap();
        assert_eq!(prev.calls.load(Ordering::SeqCst), calls_after_load);
        assert_eq!(refreshed.rows[0].prev_close, Some(100.0));
        assert_ne!(refreshed.rows[0].gap_per, loaded.rows[0].gap_per);
        assert!((refreshed.rows[0].gap_per.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn source_outage_leaves_cache_untouched() {
        let (screener, quotes, prev) = screener();
        quotes.push(Some(vec![json!({"symbol": "X", "open": "102"})]));
        quotes.push(None);
        set_prev(&prev, "X", "100");

        screener.load_all(&FilterParams::default()).unwrap();
        let err = screener.refresh(&FilterParams::default()).unwrap_err();
        assert!(matches!(err, ScreenerError::SourceUnavailable(_)));

        let cached = screener.filter_only(&FilterParams::default()).unwrap();
        assert_eq!(cached.rows[0].open, Some(102.0));
    }

    #[test]
    fn malformed_rows_leave_cache_untouched() {
        let (screener, quotes, prev) = screener();
        quotes.push(Some(vec![json!({"symbol": "X", "open": "102"})]));
        quotes.push(Some(vec![
            json!({"symbol": "X", "open": "1"}),
            json!({"symbol": "X", "open": "2"}),
        ]));
        set_prev(&prev, "X", "100");

        screener.load_all(&FilterParams::default()).unwrap();
        let err = screener.load_all(&FilterParams::default()).unwrap_err();
        assert!(matches!(err, ScreenerError::MalformedRow(_)));
        let cached = screener.filter_only(&FilterParams::default()).unwrap();
        assert_eq!(cached.rows[0].prev_close, Some(100.0));
    }

    #[test]
    fn bad_parameter_fails_before_fetch() {
        let (screener, quotes, _) = screener();
        quotes.push(Some(vec![json!({"symbol": "X", "open": "102"})]));
        let params = FilterParams {
            gap_up_per: Some("two".into()),
            ..Default::default()
        };
        let err = screener.load_all(&params).unwrap_err();
        assert!(matches!(err, ScreenerError::FilterParameter(_)));
        assert_eq!(quotes.payloads.lock().unwrap().len(), 1);
        assert!(screener.filter_only(&FilterParams::default()).unwrap().rows.is_empty());
    }

    #[test]
    fn refresh_without_cache_stores_fresh_rows() {
        let (screener, quotes, prev) = screener();
        quotes.push(Some(vec![json!({"symbol": "X", "open": "102"})]));
        let screened = screener.refresh(&FilterParams::default()).unwrap();
        assert_eq!(prev.calls.load(Ordering::SeqCst), 0);
        assert_eq!(screened.rows[0].prev_close, None);
        assert_eq!(screened.rows[0].gap_per, None);
    }

    #[test]
    fn filter_only_is_a_subset_in_order() {
        let (screener, quotes, prev) = screener();
        quotes.push(Some(vec![
            json!({"symbol": "C", "ltP": "150"}),
            json!({"symbol": "A", "ltP": "250"}),
            json!({"symbol": "B", "ltP": "120"}),
        ]));
        for s in ["A", "B", "C"] {
            set_prev(&prev, s, "100");
        }
        screener.load_all(&FilterParams::default()).unwrap();

        let params = FilterParams {
            min_price: Some(100.0.into()),
            max_price: Some(200.0.into()),
            ..Default::default()
        };
        let screened = screener.filter_only(&params).unwrap();
        let symbols: Vec<&str> = screened.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["C", "B"]);
        assert_eq!(screener.filter_only(&FilterParams::default()).unwrap().rows.len(), 3);
    }
}
