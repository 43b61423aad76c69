//! Filter engine: independent row predicates combined with logical AND.
//!
//! `FilterSet::from_params` turns the client's `FilterParams` into a list of
//! `RowPredicate`s, one per enabled criterion. A criterion whose parameters are all
//! absent contributes no predicate, i.e. it passes every row. Comparisons against a
//! null column, or ratios over a non-positive denominator, fail the predicate.
use screener_common::{FilterParams, QuoteRow, Result, RowSet};

use crate::model::snapshot::Snapshot;

/// A single criterion evaluated against one row.
pub trait RowPredicate: Send + Sync {
    /// Whether `row` satisfies this criterion.
    fn matches(&self, row: &QuoteRow) -> bool;
}

/// `ltP` within `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    /// Lowest accepted price, `-inf` when open ended.
    pub min: f64,
    /// Highest accepted price, `+inf` when open ended.
    pub max: f64,
}

impl RowPredicate for PriceBand {
    fn matches(&self, row: &QuoteRow) -> bool {
        row.ltp.is_some_and(|ltp| ltp >= self.min && ltp <= self.max)
    }
}

/// Gap-up and/or gap-down window on `gapPer`; a row passes if either enabled side
/// accepts it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapBand {
    /// Largest accepted gap up, in percent.
    pub up: Option<f64>,
    /// Largest accepted gap down, in percent, as a positive number.
    pub down: Option<f64>,
}

impl RowPredicate for GapBand {
    fn matches(&self, row: &QuoteRow) -> bool {
        let Some(gap) = row.gap_per else {
            return false;
        };
        let up = self.up.is_some_and(|up| (0.0..=up).contains(&gap));
        let down = self.down.is_some_and(|down| gap <= 0.0 && gap >= -down);
        up || down
    }
}

/// Open within `max_per` percent above the day low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenNearLow {
    /// Largest accepted `(open - low) * 100 / low`.
    pub max_per: f64,
}

impl RowPredicate for OpenNearLow {
    fn matches(&self, row: &QuoteRow) -> bool {
        match (row.open, row.low) {
            (Some(open), Some(low)) if low > 0.0 => (open - low) * 100.0 / low <= self.max_per,
            _ => false,
        }
    }
}

/// Open within `max_per` percent below the day high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenNearHigh {
    /// Largest accepted `(high - open) * 100 / high`.
    pub max_per: f64,
}

impl RowPredicate for OpenNearHigh {
    fn matches(&self, row: &QuoteRow) -> bool {
        match (row.open, row.high) {
            (Some(open), Some(high)) if high > 0.0 => (high - open) * 100.0 / high <= self.max_per,
            _ => false,
        }
    }
}

/// Conjunction of the enabled predicates.
#[derive(Default)]
pub struct FilterSet {
    predicates: Vec<Box<dyn RowPredicate>>,
}

impl FilterSet {
    /// Parses `params` into predicates.
    ///
    /// Fails with `ScreenerError::FilterParameter` on the first bound that is not a
    /// number.
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        let mut set = FilterSet::default();

        let min = FilterParams::bound("min_price", &params.min_price)?;
        let max = FilterParams::bound("max_price", &params.max_price)?;
        if min.is_some() || max.is_some() {
            set.push(PriceBand {
                min: min.unwrap_or(f64::NEG_INFINITY),
                max: max.unwrap_or(f64::INFINITY),
            });
        }

        let up = FilterParams::bound("gap_up_per", &params.gap_up_per)?;
        let down = FilterParams::bound("gap_down_per", &params.gap_down_per)?;
        if up.is_some() || down.is_some() {
            set.push(GapBand { up, down });
        }

        if let Some(max_per) = FilterParams::bound("open_low_same_per", &params.open_low_same_per)? {
            set.push(OpenNearLow { max_per });
        }
        if let Some(max_per) = FilterParams::bound("open_high_same_per", &params.open_high_same_per)? {
            set.push(OpenNearHigh { max_per });
        }
        Ok(set)
    }

    /// Adds a predicate to the conjunction.
    pub fn push<P: RowPredicate + 'static>(&mut self, predicate: P) {
        self.predicates.push(Box::new(predicate));
    }

    /// Whether no criterion is enabled.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether `row` passes every predicate.
    pub fn matches(&self, row: &QuoteRow) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Copies the matching rows of `snapshot`, preserving snapshot order.
    pub fn apply(&self, snapshot: &Snapshot) -> RowSet {
        snapshot
            .rows()
            .iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use screener_common::ScreenerError;

    fn row(symbol: &str) -> QuoteRow {
        QuoteRow::new(symbol)
    }

    fn with_ltp(symbol: &str, ltp: f64) -> QuoteRow {
        QuoteRow {
            ltp: Some(ltp),
            ..row(symbol)
        }
    }

    fn with_gap(symbol: &str, gap: f64) -> QuoteRow {
        QuoteRow {
            gap_per: Some(gap),
            ..row(symbol)
        }
    }

    fn params(pairs: &[(&str, &str)]) -> FilterParams {
        let mut params = FilterParams::default();
        for (name, value) in pairs {
            let value = Some((*value).into());
            match *name {
                "min_price" => params.min_price = value,
                "max_price" => params.max_price = value,
                "gap_up_per" => params.gap_up_per = value,
                "gap_down_per" => params.gap_down_per = value,
                "open_low_same_per" => params.open_low_same_per = value,
                "open_high_same_per" => params.open_high_same_per = value,
                other => panic!("unknown parameter {other}"),
            }
        }
        params
    }

    #[test]
    fn empty_params_pass_everything() {
        let set = FilterSet::from_params(&FilterParams::default()).unwrap();
        assert!(set.is_empty());
        assert!(set.matches(&row("NULLS")));
    }

    #[test]
    fn price_band() {
        let set = FilterSet::from_params(&params(&[("min_price", "100"), ("max_price", "200")])).unwrap();
        assert!(!set.matches(&with_ltp("A", 250.0)));
        assert!(set.matches(&with_ltp("B", 150.0)));
        assert!(set.matches(&with_ltp("C", 100.0)));
        assert!(!set.matches(&row("D")));
    }

    #[test]
    fn open_ended_price_band() {
        let set = FilterSet::from_params(&params(&[("min_price", "100")])).unwrap();
        assert!(set.matches(&with_ltp("A", 1e9)));
        assert!(!set.matches(&with_ltp("B", 99.0)));
    }

    #[test]
    fn gap_up_only() {
        let set = FilterSet::from_params(&params(&[("gap_up_per", "2")])).unwrap();
        assert!(set.matches(&with_gap("A", 1.5)));
        assert!(!set.matches(&with_gap("B", 3.0)));
        assert!(!set.matches(&with_gap("C", -0.5)));
        assert!(!set.matches(&row("D")));
    }

    #[test]
    fn gap_down_only() {
        let set = FilterSet::from_params(&params(&[("gap_down_per", "1")])).unwrap();
        assert!(set.matches(&with_gap("A", -0.5)));
        assert!(!set.matches(&with_gap("B", -1.5)));
        assert!(!set.matches(&with_gap("C", 0.5)));
    }

    #[test]
    fn gap_either_side() {
        let set = FilterSet::from_params(&params(&[("gap_up_per", "2"), ("gap_down_per", "1")])).unwrap();
        assert!(set.matches(&with_gap("A", -0.5)));
        assert!(set.matches(&with_gap("B", 1.5)));
        assert!(set.matches(&with_gap("C", 0.0)));
        assert!(!set.matches(&with_gap("D", 3.0)));
        assert!(!set.matches(&with_gap("E", -1.5)));
    }

    #[test]
    fn open_near_low() {
        let abc = QuoteRow {
            open: Some(105.0),
            low: Some(100.0),
            ..row("ABC")
        };
        let strict = FilterSet::from_params(&params(&[("open_low_same_per", "4")])).unwrap();
        assert!(!strict.matches(&abc));
        let loose = FilterSet::from_params(&params(&[("open_low_same_per", "6")])).unwrap();
        assert!(loose.matches(&abc));
    }

    #[test]
    fn non_positive_denominators_fail() {
        let zero_low = QuoteRow {
            open: Some(5.0),
            low: Some(0.0),
            high: Some(0.0),
            ..row("Z")
        };
        let low = FilterSet::from_params(&params(&[("open_low_same_per", "100")])).unwrap();
        assert!(!low.matches(&zero_low));
        let high = FilterSet::from_params(&params(&[("open_high_same_per", "100")])).unwrap();
        assert!(!high.matches(&zero_low));
    }

    #[test]
    fn open_near_high() {
        let abc = QuoteRow {
            open: Some(97.0),
            high: Some(100.0),
            ..row("ABC")
        };
        assert!(!FilterSet::from_params(&params(&[("open_high_same_per", "2")])).unwrap().matches(&abc));
        assert!(FilterSet::from_params(&params(&[("open_high_same_per", "3")])).unwrap().matches(&abc));
    }

    #[test]
    fn bad_bound_is_an_error() {
        let err = FilterSet::from_params(&params(&[("max_price", "lots")])).err().unwrap();
        assert!(matches!(err, ScreenerError::FilterParameter(_)));
    }

    #[test]
    fn apply_preserves_snapshot_order() {
        let mut snapshot = Snapshot::new(Utc::now());
        for (symbol, ltp) in [("Z", 150.0), ("A", 300.0), ("M", 120.0)] {
            snapshot.insert(with_ltp(symbol, ltp)).unwrap();
        }
        let set = FilterSet::from_params(&params(&[("max_price", "200")])).unwrap();
        let rows = set.apply(&snapshot);
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["Z", "M"]);
        assert_eq!(snapshot.len(), 3);
    }
}
