//! Quote row shared by server and client.
//!
//! A `QuoteRow` is one traded symbol as last observed. The sixteen live numeric
//! columns come straight from the exchange feed; `prevClose` and `gapPer` are added
//! by enrichment on the server. Every declared column is always serialized, with
//! `null` standing in for a missing value, so all rows of a row set share one schema.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Live numeric columns fetched from the primary source, in feed order.
pub const NUMERIC_COLUMNS: [&str; 16] = [
    "open",
    "high",
    "low",
    "ltP",
    "ptsC",
    "per",
    "trdVol",
    "trdVolM",
    "ntP",
    "mVal",
    "wkhi",
    "wklo",
    "wkhicm_adj",
    "wklocm_adj",
    "yPC",
    "mPC",
];

/// Name of the unique key column.
pub const SYMBOL_COLUMN: &str = "symbol";

/// Columns computed by enrichment; a feed column with one of these names is not a
/// source value and must not reach `extra`.
pub const DERIVED_COLUMNS: [&str; 2] = ["prevClose", "gapPer"];

/// Ordered sequence of rows returned to a caller.
pub type RowSet = Vec<QuoteRow>;

/// Market quote row for a single symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    /// Unique symbol, e.g. `RELIANCE`.
    pub symbol: String,
    /// Opening price.
    pub open: Option<f64>,
    /// Day high.
    pub high: Option<f64>,
    /// Day low.
    pub low: Option<f64>,
    /// Last traded price.
    #[serde(rename = "ltP")]
    pub ltp: Option<f64>,
    /// Points change.
    #[serde(rename = "ptsC")]
    pub pts_c: Option<f64>,
    /// Percent change.
    pub per: Option<f64>,
    /// Traded volume.
    #[serde(rename = "trdVol")]
    pub trd_vol: Option<f64>,
    /// Traded volume in millions.
    #[serde(rename = "trdVolM")]
    pub trd_vol_m: Option<f64>,
    /// Turnover.
    #[serde(rename = "ntP")]
    pub ntp: Option<f64>,
    /// Traded value.
    #[serde(rename = "mVal")]
    pub m_val: Option<f64>,
    /// 52 week high.
    pub wkhi: Option<f64>,
    /// 52 week low.
    pub wklo: Option<f64>,
    /// Corporate-action adjusted 52 week high.
    pub wkhicm_adj: Option<f64>,
    /// Corporate-action adjusted 52 week low.
    pub wklocm_adj: Option<f64>,
    /// One year percent change.
    #[serde(rename = "yPC")]
    pub y_pc: Option<f64>,
    /// One month percent change.
    #[serde(rename = "mPC")]
    pub m_pc: Option<f64>,
    /// Previous session close, filled by enrichment.
    #[serde(rename = "prevClose")]
    pub prev_close: Option<f64>,
    /// Gap between open and previous close in percent, derived by enrichment.
    #[serde(rename = "gapPer")]
    pub gap_per: Option<f64>,
    /// Source columns outside the declared set, kept as normalized text.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl QuoteRow {
    /// Creates a row with every numeric column unset.
    pub fn new(symbol: &str) -> Self {
        QuoteRow {
            symbol: String::from(symbol),
            ..Default::default()
        }
    }

    /// Reads a live numeric column by its feed name.
    pub fn numeric(&self, column: &str) -> Option<Option<f64>> {
        let value = match column {
            "open" => self.open,
            "high" => self.high,
            "low" => self.low,
            "ltP" => self.ltp,
            "ptsC" => self.pts_c,
            "per" => self.per,
            "trdVol" => self.trd_vol,
            "trdVolM" => self.trd_vol_m,
            "ntP" => self.ntp,
            "mVal" => self.m_val,
            "wkhi" => self.wkhi,
            "wklo" => self.wklo,
            "wkhicm_adj" => self.wkhicm_adj,
            "wklocm_adj" => self.wklocm_adj,
            "yPC" => self.y_pc,
            "mPC" => self.m_pc,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable access to a live numeric column by its feed name.
    ///
    /// Returns `None` for names outside [`NUMERIC_COLUMNS`].
    pub fn numeric_mut(&mut self, column: &str) -> Option<&mut Option<f64>> {
        let slot = match column {
            "open" => &mut self.open,
            "high" => &mut self.high,
            "low" => &mut self.low,
            "ltP" => &mut self.ltp,
            "ptsC" => &mut self.pts_c,
            "per" => &mut self.per,
            "trdVol" => &mut self.trd_vol,
            "trdVolM" => &mut self.trd_vol_m,
            "ntP" => &mut self.ntp,
            "mVal" => &mut self.m_val,
            "wkhi" => &mut self.wkhi,
            "wklo" => &mut self.wklo,
            "wkhicm_adj" => &mut self.wkhicm_adj,
            "wklocm_adj" => &mut self.wklocm_adj,
            "yPC" => &mut self.y_pc,
            "mPC" => &mut self.m_pc,
            _ => return None,
        };
        Some(slot)
    }

    /// Overwrites every live column with the values of `fresh`.
    ///
    /// `prevClose` and `gapPer` are left untouched.
    pub fn overwrite_live(&mut self, fresh: &QuoteRow) {
        for column in NUMERIC_COLUMNS {
            if let (Some(slot), Some(value)) = (self.numeric_mut(column), fresh.numeric(column)) {
                *slot = value;
            }
        }
        self.extra = fresh.extra.clone();
    }

    /// Clears every live column to null, keeping symbol and enrichment columns.
    pub fn clear_live(&mut self) {
        self.overwrite_live(&QuoteRow::new(&self.symbol));
    }
}
