//! Short-key query strings for sharing calculator state.
//!
//! Keys: `p` principal, `r` annual rate, `y` years, `f` compounding code, and
//! when a recurring contribution is set, `a` amount, `af` contribution code,
//! `as` start year. Decoding is per field: a bad value drops only that field.

use log::debug;
use url::form_urlencoded;

use super::types::{
    AdditionalFrequency, CalculatorInput, CompoundFrequency, MAX_ANNUAL_RATE, MAX_YEARS,
};

/// Fields recovered from a query string. Absent fields fall back to whatever
/// base input they are applied to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialInput {
    pub principal: Option<f64>,
    pub annual_rate: Option<f64>,
    pub years: Option<u32>,
    pub compound_frequency: Option<CompoundFrequency>,
    pub additional_amount: Option<f64>,
    pub additional_frequency: Option<AdditionalFrequency>,
    pub additional_start_year: Option<u32>,
}

impl PartialInput {
    pub fn is_empty(&self) -> bool {
        *self == PartialInput::default()
    }

    pub fn apply_to(self, base: CalculatorInput) -> CalculatorInput {
        CalculatorInput {
            principal: self.principal.unwrap_or(base.principal),
            annual_rate: self.annual_rate.unwrap_or(base.annual_rate),
            years: self.years.unwrap_or(base.years),
            compound_frequency: self.compound_frequency.unwrap_or(base.compound_frequency),
            additional_amount: self.additional_amount.unwrap_or(base.additional_amount),
            additional_frequency: self
                .additional_frequency
                .unwrap_or(base.additional_frequency),
            additional_start_year: self
                .additional_start_year
                .unwrap_or(base.additional_start_year),
        }
    }
}

pub fn encode_params(input: &CalculatorInput) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("p", &input.principal.to_string())
        .append_pair("r", &input.annual_rate.to_string())
        .append_pair("y", &input.years.to_string())
        .append_pair("f", input.compound_frequency.code());

    if input.additional_amount > 0.0 {
        query
            .append_pair("a", &input.additional_amount.to_string())
            .append_pair("af", input.additional_frequency.code())
            .append_pair("as", &input.additional_start_year.to_string());
    }

    query.finish()
}

pub fn decode_params(search: &str) -> PartialInput {
    let search = search.strip_prefix('?').unwrap_or(search);
    let mut partial = PartialInput::default();
    let mut seen: Vec<String> = Vec::new();

    for (key, value) in form_urlencoded::parse(search.as_bytes()) {
        // The first occurrence of a key wins.
        if seen.iter().any(|k| k.as_str() == &*key) {
            continue;
        }
        seen.push(key.to_string());
        if value.is_empty() {
            continue;
        }

        let accepted = match &*key {
            "p" => {
                partial.principal = parse_float_prefix(&value).filter(|v| *v >= 0.0);
                partial.principal.is_some()
            }
            "r" => {
                partial.annual_rate = parse_float_prefix(&value)
                    .filter(|v| (0.0..=MAX_ANNUAL_RATE).contains(v));
                partial.annual_rate.is_some()
            }
            "y" => {
                partial.years = parse_int_prefix(&value)
                    .filter(|v| (1..=i64::from(MAX_YEARS)).contains(v))
                    .and_then(|v| u32::try_from(v).ok());
                partial.years.is_some()
            }
            "f" => {
                partial.compound_frequency = CompoundFrequency::from_code(&value);
                partial.compound_frequency.is_some()
            }
            "a" => {
                partial.additional_amount = parse_float_prefix(&value).filter(|v| *v >= 0.0);
                partial.additional_amount.is_some()
            }
            "af" => {
                partial.additional_frequency = AdditionalFrequency::from_code(&value);
                partial.additional_frequency.is_some()
            }
            "as" => {
                partial.additional_start_year = parse_int_prefix(&value)
                    .filter(|v| *v >= 1)
                    .and_then(|v| u32::try_from(v).ok());
                partial.additional_start_year.is_some()
            }
            _ => true,
        };

        if !accepted {
            debug!("dropping share parameter {key}={value}");
        }
    }

    partial
}

/// Decodes `search` over the default input. An empty query yields defaults.
pub fn input_from_query(search: &str) -> CalculatorInput {
    decode_params(search).apply_to(CalculatorInput::default())
}

pub fn share_url(base: &str, input: &CalculatorInput) -> String {
    format!("{base}?{}", encode_params(input))
}

/// Reads the longest leading decimal number, ignoring trailing junk
/// (`"12.5abc"` is 12.5).
fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads the leading integer digits (`"10.5"` is 10).
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    s[..end].parse::<i64>().ok()
}
