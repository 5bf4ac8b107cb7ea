//! Recovers a number and a unit from free-form Czech nutrition text.
//!
//! The site writes `1 234,5 g` (space or NBSP thousands separator, comma
//! decimal) but is not consistent about it. Quantities are normalized to a
//! dot-decimal value for validation and rendered back with a comma for display.
//! Percentages are recognized and then discarded: they are not comparable with
//! the absolute values on the same page.

use log::debug;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::model::NOT_AVAILABLE;

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[ \u{00A0}]\d{3})*(?:[.,]\d+)?)\s*(g|mg|kJ|kcal)")
        .expect("quantity pattern is valid")
});

static PERCENTAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*%").expect("percentage pattern is valid"));

/// Mass and energy units recognized on the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Gram,
    Milligram,
    Kilojoule,
    Kilocalorie,
    None,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Milligram => "mg",
            Unit::Kilojoule => "kJ",
            Unit::Kilocalorie => "kcal",
            Unit::None => "",
        }
    }

    fn from_token(token: &str) -> Unit {
        match token.to_ascii_lowercase().as_str() {
            "g" => Unit::Gram,
            "mg" => Unit::Milligram,
            "kj" => Unit::Kilojoule,
            "kcal" => Unit::Kilocalorie,
            _ => Unit::None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A number pulled out of page text.
///
/// `value` is either a dot-decimal number without separators or [`NOT_AVAILABLE`];
/// when it is a number, `unit` is never [`Unit::None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuantity {
    pub value: String,
    pub unit: Unit,
}

impl ParsedQuantity {
    pub fn not_available() -> Self {
        Self {
            value: NOT_AVAILABLE.to_string(),
            unit: Unit::None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.value != NOT_AVAILABLE
    }

    /// Value with the locale decimal comma, e.g. `1234,5`.
    pub fn locale_value(&self) -> String {
        self.value.replace('.', ",")
    }

    /// Display form used in nutrient records: `1234,5 g`, or `N/A`.
    pub fn display(&self) -> String {
        if !self.is_available() {
            return NOT_AVAILABLE.to_string();
        }
        format!("{} {}", self.locale_value(), self.unit)
            .trim()
            .to_string()
    }
}

/// Parses the first mass/energy quantity in `text`.
pub fn parse_quantity(text: &str) -> ParsedQuantity {
    if let Some(captures) = QUANTITY_RE.captures(text) {
        let raw = &captures[1];
        let cleaned: String = raw
            .chars()
            .filter(|c| !matches!(*c, ' ' | '\u{00A0}'))
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        if cleaned.parse::<f64>().is_ok() {
            return ParsedQuantity {
                value: cleaned,
                unit: Unit::from_token(&captures[2]),
            };
        }
        debug!("Discarding non-numeric quantity match '{}'", raw);
    }

    if let Some(captures) = PERCENTAGE_RE.captures(text) {
        debug!("Ignoring percentage value '{}'", &captures[0]);
    }

    ParsedQuantity::not_available()
}

/// Parses `text` and renders the bare value with a fixed energy unit.
///
/// Energy widgets carry their own unit label elsewhere in the block, so the
/// matched unit is ignored and `unit` is appended instead.
pub fn format_energy(text: &str, unit: Unit) -> String {
    let parsed = parse_quantity(text);
    if parsed.is_available() {
        format!("{} {}", parsed.locale_value(), unit)
    } else {
        NOT_AVAILABLE.to_string()
    }
}
