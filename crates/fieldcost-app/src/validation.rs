// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const DEFAULT_CURRENCY_SYMBOL: &str = "£";
pub const DEFAULT_AREA_UNIT: &str = "ha";

const EXACT_INTEGER_FLOOR: f64 = 4_503_599_627_370_496.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidCost,
    NegativeCost,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCost => f.write_str("invalid cost value"),
            Self::NegativeCost => f.write_str("negative cost value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Parses a typed cost-per-area draft into a non-negative decimal.
///
/// Accepts what a numeric input field accepts (`95.5`, `.5`, `12.`, `1e2`).
/// Named non-finite values (`inf`, `NaN`) and overflow to infinity are rejected.
pub fn parse_cost_per_ha(input: &str) -> ValidationResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidCost);
    }
    if !trimmed
        .bytes()
        .all(|byte| byte.is_ascii_digit() || matches!(byte, b'.' | b'-' | b'+' | b'e' | b'E'))
    {
        return Err(ValidationError::InvalidCost);
    }

    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidCost)?;
    if !value.is_finite() {
        return Err(ValidationError::InvalidCost);
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeCost);
    }
    // -0 compares equal to 0 and would otherwise render as "-0".
    Ok(if value == 0.0 { 0.0 } else { value })
}

/// Text a fresh draft starts from: the shortest decimal that reads back as `value`.
pub fn format_draft(value: f64) -> String {
    format!("{value}")
}

pub fn format_money(value: f64, symbol: &str) -> String {
    let magnitude = value.abs();
    let (whole, cents) = if magnitude < EXACT_INTEGER_FLOOR {
        let cents = (magnitude * 100.0).round() as u64;
        ((cents / 100).to_string(), cents % 100)
    } else {
        // Every f64 at or above 2^52 is a whole number.
        (format!("{magnitude:.0}"), 0)
    };
    let sign = if value < 0.0 && (cents != 0 || whole != "0") {
        "-"
    } else {
        ""
    };
    format!("{sign}{symbol}{}.{cents:02}", comma_format(&whole))
}

pub fn format_rate(value: f64, symbol: &str, unit: &str) -> String {
    format!("{}/{unit}", format_money(value, symbol))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub currency_symbol: String,
    pub area_unit: String,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_owned(),
            area_unit: DEFAULT_AREA_UNIT.to_owned(),
        }
    }
}

impl MoneyFormat {
    pub fn money(&self, value: f64) -> String {
        format_money(value, &self.currency_symbol)
    }

    pub fn rate(&self, value: f64) -> String {
        format_rate(value, &self.currency_symbol, &self.area_unit)
    }
}

fn comma_format(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
