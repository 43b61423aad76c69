//! Filter parameter set supplied by a client with every request.
//!
//! Each criterion is optional. Values may arrive as JSON numbers or as text (the
//! way a web form posts them); an absent value or an empty string disables that
//! criterion. Parsing into numbers happens in [`FilterParams::bound`] so that an
//! unparseable bound is reported instead of being ignored.
use serde::{Deserialize, Serialize};

use crate::error::ScreenerError;
use crate::result::Result;

/// A single raw parameter value as posted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric JSON value.
    Number(f64),
    /// Textual value, possibly empty.
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(String::from(value))
    }
}

/// Named filter criteria. No defaults are persisted between requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Lower bound of the last traded price.
    #[serde(default)]
    pub min_price: Option<ParamValue>,
    /// Upper bound of the last traded price.
    #[serde(default)]
    pub max_price: Option<ParamValue>,
    /// Largest accepted positive gap, in percent.
    #[serde(default)]
    pub gap_up_per: Option<ParamValue>,
    /// Largest accepted negative gap, in percent (given as a positive number).
    #[serde(default)]
    pub gap_down_per: Option<ParamValue>,
    /// Largest accepted distance of open above low, in percent of low.
    #[serde(default)]
    pub open_low_same_per: Option<ParamValue>,
    /// Largest accepted distance of open below high, in percent of high.
    #[serde(default)]
    pub open_high_same_per: Option<ParamValue>,
}

impl FilterParams {
    /// Parses one named bound.
    ///
    /// Returns `Ok(None)` when the value is absent or blank, and
    /// `ScreenerError::FilterParameter` when it is present but not a finite number.
    pub fn bound(name: &str, value: &Option<ParamValue>) -> Result<Option<f64>> {
        let number = match value {
            None => return Ok(None),
            Some(ParamValue::Number(n)) => *n,
            Some(ParamValue::Text(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<f64>().map_err(|e| {
                    ScreenerError::FilterParameter(format!("{}={:?}: {}", name, text, e))
                })?
            }
        };
        if !number.is_finite() {
            return Err(ScreenerError::FilterParameter(format!(
                "{}={} is not a finite number",
                name, number
            )));
        }
        Ok(Some(number))
    }
}
