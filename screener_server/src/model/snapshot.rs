//! Snapshot of the market as last observed, and the builder producing it.
//!
//! A `Snapshot` is an insertion-ordered set of `QuoteRow`s indexed by symbol. The
//! `SnapshotBuilder` turns raw feed records into a snapshot: every text field is
//! normalized, the declared numeric columns are cast to `f64`, and each row is
//! indexed by its symbol. Any row that cannot be built fails the whole build, since
//! a partial snapshot would silently lose symbols from the index.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use screener_common::row::{DERIVED_COLUMNS, NUMERIC_COLUMNS, SYMBOL_COLUMN};
use screener_common::{QuoteRow, Result, ScreenerError};
use serde_json::Value;

use crate::model::normalizer::{DashPolicy, normalize_with};
use crate::source::{QuoteSource, RawRow};

/// Ordered mapping from symbol to row.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    rows: Vec<QuoteRow>,
    index: HashMap<String, usize>,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Creates an empty snapshot stamped with the time its live data was fetched.
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            fetched_at,
        }
    }

    /// Appends a row; a symbol that is already present is a `MalformedRow`.
    pub fn insert(&mut self, row: QuoteRow) -> Result<()> {
        if self.index.contains_key(&row.symbol) {
            return Err(ScreenerError::MalformedRow(format!(
                "Duplicate symbol {}",
                row.symbol
            )));
        }
        self.index.insert(row.symbol.clone(), self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[QuoteRow] {
        &self.rows
    }

    /// Mutable rows in insertion order. Symbols must not be changed through this.
    pub fn rows_mut(&mut self) -> &mut [QuoteRow] {
        &mut self.rows
    }

    /// Row of `symbol`, if present.
    pub fn get(&self, symbol: &str) -> Option<&QuoteRow> {
        self.index.get(symbol).map(|&i| &self.rows[i])
    }

    /// Mutable row of `symbol`, if present.
    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut QuoteRow> {
        self.index.get(symbol).map(|&i| &mut self.rows[i])
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.symbol.as_str())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// When the live columns were fetched.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Merges a freshly built snapshot into this one, column by column.
    ///
    /// Rows are aligned by symbol. Every live column of a known symbol is overwritten
    /// by the fresh value; a known symbol missing from `fresh` has its live columns
    /// cleared. Symbols new in `fresh` are appended. `prevClose` and `gapPer` are
    /// never touched here.
    pub fn merge_live(&mut self, fresh: Snapshot) {
        for row in self.rows.iter_mut() {
            match fresh.get(&row.symbol) {
                Some(fresh_row) => row.overwrite_live(fresh_row),
                None => row.clear_live(),
            }
        }
        for row in fresh.rows {
            if !self.index.contains_key(&row.symbol) {
                debug!("New symbol {} appended on refresh", row.symbol);
                self.index.insert(row.symbol.clone(), self.rows.len());
                self.rows.push(row);
            }
        }
        self.fetched_at = fresh.fetched_at;
    }
}

/// Builds snapshots from raw feed records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotBuilder {
    policy: DashPolicy,
}

impl SnapshotBuilder {
    /// Creates a builder interpreting `"-"` under `policy`.
    pub fn new(policy: DashPolicy) -> Self {
        Self { policy }
    }

    /// Fetches every record from `source` and builds a fresh snapshot from them.
    ///
    /// The result has no `prevClose`/`gapPer` values; run enrichment before filtering
    /// on gap metrics.
    pub fn build(&self, source: &dyn QuoteSource) -> Result<Snapshot> {
        let fetched_at = Utc::now();
        let records = source.fetch_rows()?;
        self.from_records(records, fetched_at)
    }

    /// Builds a snapshot from already fetched records.
    pub fn from_records(&self, records: Vec<RawRow>, fetched_at: DateTime<Utc>) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new(fetched_at);
        for (position, record) in records.into_iter().enumerate() {
            let row = self.build_row(position, record)?;
            snapshot.insert(row)?;
        }
        debug!("Built snapshot of {} rows", snapshot.len());
        Ok(snapshot)
    }

    fn build_row(&self, position: usize, record: RawRow) -> Result<QuoteRow> {
        let symbol = match record.get(SYMBOL_COLUMN) {
            Some(Value::String(raw)) => normalize_with(raw.trim(), self.policy)
                .filter(|s| !s.is_empty())
                .map(|s| s.into_owned()),
            _ => None,
        }
        .ok_or_else(|| {
            ScreenerError::MalformedRow(format!("Record {} has no symbol", position))
        })?;

        let mut row = QuoteRow::new(&symbol);
        for (column, value) in record {
            if column == SYMBOL_COLUMN {
                continue;
            }
            if DERIVED_COLUMNS.contains(&column.as_str()) {
                warn!("{}: ignoring feed column {} reserved for enrichment", symbol, column);
                continue;
            }
            if NUMERIC_COLUMNS.contains(&column.as_str()) {
                let number = self.cast(&symbol, &column, &value)?;
                if let Some(slot) = row.numeric_mut(&column) {
                    *slot = number;
                }
            } else if let Some(text) = self.text(&value) {
                row.extra.insert(column, text);
            }
        }
        Ok(row)
    }

    fn cast(&self, symbol: &str, column: &str, value: &Value) -> Result<Option<f64>> {
        let number = match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64(),
            Value::String(raw) => match normalize_with(raw.trim(), self.policy) {
                None => None,
                Some(clean) => Some(clean.parse::<f64>().map_err(|_| {
                    ScreenerError::MalformedRow(format!(
                        "{}: {}={:?} is not numeric",
                        symbol, column, raw
                    ))
                })?),
            },
            other => {
                return Err(ScreenerError::MalformedRow(format!(
                    "{}: {}={} is not numeric",
                    symbol, column, other
                )));
            }
        };
        Ok(number.filter(|n| n.is_finite()))
    }

    fn text(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(raw) => normalize_with(raw, self.policy).map(|s| s.into_owned()),
            other => Some(other.to_string()),
        }
    }
}
