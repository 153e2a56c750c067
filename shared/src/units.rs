//! Units for care amounts
//!
//! Water is measured in milliliters, fertilizer and harvests in grams.
//! Amounts travel to the server in these base units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit of a care action amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountUnit {
    Milliliters,
    Grams,
}

impl AmountUnit {
    /// Get the unit abbreviation
    pub fn abbreviation(&self) -> &'static str {
        match self {
            AmountUnit::Milliliters => "ml",
            AmountUnit::Grams => "g",
        }
    }

    /// Convert a base-unit amount to liters or kilograms
    pub fn to_large(&self, value: f64) -> f64 {
        value / 1000.0
    }

    /// Convert liters or kilograms back to the base unit
    pub fn from_large(&self, value: f64) -> f64 {
        value * 1000.0
    }

    /// Human-readable amount, e.g. `250 ml` or `1.5 kg`
    pub fn format(&self, value: f64) -> String {
        if value >= 1000.0 {
            let large = match self {
                AmountUnit::Milliliters => "l",
                AmountUnit::Grams => "kg",
            };
            format!("{} {}", round_to(self.to_large(value), 2), large)
        } else {
            format!("{} {}", round_to(value, 1), self.abbreviation())
        }
    }
}

impl fmt::Display for AmountUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl std::str::FromStr for AmountUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ml" | "milliliter" | "milliliters" => Ok(AmountUnit::Milliliters),
            "g" | "gram" | "grams" => Ok(AmountUnit::Grams),
            _ => Err(format!("Unknown amount unit: {}", s)),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
