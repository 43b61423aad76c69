//! Offline market used when the exchange is not reachable.
//!
//! `SyntheticMarket` keeps a small random walk per symbol and renders every fetch the
//! way the exchange does: numbers as comma-grouped text and `"-"` where a value is
//! not published. It implements both source traits so the whole pipeline, including
//! normalization and the previous-close fan-out, runs unchanged against it.
use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;
use screener_common::{Result, ScreenerError};
use serde_json::Value;

use crate::source::{PrevCloseSource, QuoteSource, RawRow};

/// Symbols served when none are configured.
pub const DEFAULT_SYMBOLS: [&str; 20] = [
    "ADANIENT",
    "AXISBANK",
    "BAJFINANCE",
    "HDFCBANK",
    "HINDALCO",
    "ICICIBANK",
    "INFY",
    "ITC",
    "LT",
    "M&M",
    "MARUTI",
    "NTPC",
    "ONGC",
    "RELIANCE",
    "SBIN",
    "SUNPHARMA",
    "TATAMOTORS",
    "TATASTEEL",
    "TCS",
    "WIPRO",
];

struct Session {
    prev_close: f64,
    open: f64,
    high: f64,
    low: f64,
    last: f64,
    volume: f64,
}

impl Session {
    fn open_at(prev_close: f64) -> Self {
        let mut rng = rand::rng();
        let open = prev_close * (1.0 + rng.random_range(-0.03..0.03));
        Session {
            prev_close,
            open,
            high: open,
            low: open,
            last: open,
            volume: 0.0,
        }
    }

    fn tick(&mut self) {
        let mut rng = rand::rng();
        let change: f64 = rng.random_range(-0.01..0.01);
        self.last = (self.last * (1.0 + change)).max(0.05);
        self.high = self.high.max(self.last);
        self.low = self.low.min(self.last);
        self.volume += rng.random_range(1_000.0..50_000.0_f64).round();
    }

    fn to_raw(&self, symbol: &str) -> RawRow {
        let points = self.last - self.prev_close;
        let mut row = RawRow::new();
        let mut put = |column: &str, text: String| {
            row.insert(String::from(column), Value::String(text));
        };
        put("symbol", String::from(symbol));
        put("open", grouped(self.open));
        put("high", grouped(self.high));
        put("low", grouped(self.low));
        put("ltP", grouped(self.last));
        put("ptsC", grouped(points));
        put("per", format!("{:.2}", points * 100.0 / self.prev_close));
        put("trdVol", grouped(self.volume / 100_000.0));
        put("trdVolM", grouped(self.volume / 1_000_000.0));
        put("ntP", grouped(self.volume * self.last / 10_000_000.0));
        put("mVal", grouped(self.volume * self.last / 10_000_000.0));
        put("wkhi", grouped(self.prev_close * 1.4));
        put("wklo", grouped(self.prev_close * 0.7));
        put("wkhicm_adj", String::from("-"));
        put("wklocm_adj", String::from("-"));
        put("yPC", format!("{:.2}", self.prev_close / 30.0));
        put("mPC", format!("{:.2}", self.prev_close / 300.0));
        put("xDt", String::from("-"));
        row
    }
}

/// Random-walk market over a fixed symbol list.
pub struct SyntheticMarket {
    symbols: Vec<String>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SyntheticMarket {
    /// Creates a market with a random previous close per symbol.
    pub fn new(symbols: &[&str]) -> Self {
        let mut rng = rand::rng();
        let sessions = symbols
            .iter()
            .map(|s| {
                let prev_close = rng.random_range(50.0..5_000.0_f64);
                (String::from(*s), Session::open_at(prev_close))
            })
            .collect();
        Self {
            symbols: symbols.iter().map(|s| String::from(*s)).collect(),
            sessions: Mutex::new(sessions),
        }
    }
}

impl Default for SyntheticMarket {
    fn default() -> Self {
        Self::new(&DEFAULT_SYMBOLS)
    }
}

impl QuoteSource for SyntheticMarket {
    fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        let mut sessions = self.sessions.lock()?;
        let mut rows = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            if let Some(session) = sessions.get_mut(symbol) {
                session.tick();
                rows.push(session.to_raw(symbol));
            }
        }
        Ok(rows)
    }
}

impl PrevCloseSource for SyntheticMarket {
    fn fetch_previous_close(&self, symbol: &str) -> Result<String> {
        let sessions = self.sessions.lock()?;
        sessions
            .get(symbol)
            .map(|session| grouped(session.prev_close))
            .ok_or_else(|| ScreenerError::SourceUnavailable(format!("Unknown symbol {}", symbol)))
    }
}

/// Formats with two decimals and comma thousands grouping, e.g. `1,234.50`.
fn grouped(value: f64) -> String {
    let text = format!("{:.2}", value.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut out = String::with_capacity(text.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, out, frac_part)
}
