//! Locale-aware display strings for projection output. Locale only changes
//! presentation; the engine never sees it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Zh,
    En,
    Ja,
}

impl Locale {
    /// Resolves a language tag such as `en-US` or `zh-hant`. Unknown tags
    /// fall back to `zh`.
    pub fn from_tag(tag: &str) -> Self {
        let lower = tag.trim().to_ascii_lowercase();
        let primary = lower.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "en" => Locale::En,
            "ja" => Locale::Ja,
            _ => Locale::Zh,
        }
    }

    fn currency_symbol(self) -> &'static str {
        match self {
            Locale::Zh => "¥",
            Locale::En => "$",
            Locale::Ja => "￥",
        }
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Locale::from_tag(s))
    }
}

/// Rounds to a whole number and groups thousands with commas.
pub fn format_number(value: f64, _locale: Locale) -> String {
    let rounded = value.round();
    let grouped = group_thousands(rounded.abs());
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_currency(value: f64, locale: Locale) -> String {
    let rounded = value.round();
    let grouped = group_thousands(rounded.abs());
    let symbol = locale.currency_symbol();
    if rounded < 0.0 {
        format!("-{symbol}{grouped}")
    } else {
        format!("{symbol}{grouped}")
    }
}

/// `value` is already a percentage (`12.34` renders as `12.3%`).
pub fn format_percent(value: f64, _locale: Locale) -> String {
    let fixed = format!("{:.1}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "0"));
    let int_value = int_part.parse::<f64>().unwrap_or_default();
    let sign = if value < 0.0 && fixed != "0.0" { "-" } else { "" };
    format!("{sign}{}.{frac_part}%", group_thousands(int_value))
}

/// Compact chart-axis label: `1.2M`, `350K`, or a plain integer.
pub fn format_axis(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.0}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

pub fn format_multiple(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}x"),
        None => "-".to_string(),
    }
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{value:.0}");
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_from_tag_uses_primary_subtag() {
        assert_eq!(Locale::from_tag("en-US"), Locale::En);
        assert_eq!(Locale::from_tag("ja_JP"), Locale::Ja);
        assert_eq!(Locale::from_tag("zh-hant"), Locale::Zh);
        assert_eq!(Locale::from_tag("fr"), Locale::Zh);
    }

    #[test]
    fn number_is_rounded_and_grouped() {
        assert_eq!(format_number(331_349.80, Locale::En), "331,350");
        assert_eq!(format_number(999.4, Locale::Zh), "999");
        assert_eq!(format_number(-1_234_567.0, Locale::Ja), "-1,234,567");
        assert_eq!(format_number(0.0, Locale::En), "0");
    }

    #[test]
    fn currency_uses_locale_symbol() {
        assert_eq!(format_currency(100_000.0, Locale::Zh), "¥100,000");
        assert_eq!(format_currency(1_500.6, Locale::En), "$1,501");
        assert_eq!(format_currency(42.0, Locale::Ja), "￥42");
        assert_eq!(format_currency(-5.0, Locale::En), "-$5");
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(231.3498, Locale::En), "231.3%");
        assert_eq!(format_percent(4.0, Locale::Zh), "4.0%");
        assert_eq!(format_percent(12_345.67, Locale::En), "12,345.7%");
        assert_eq!(format_percent(-2.26, Locale::En), "-2.3%");
    }

    #[test]
    fn axis_labels_are_compact() {
        assert_eq!(format_axis(2_460_000.0), "2.5M");
        assert_eq!(format_axis(350_400.0), "350K");
        assert_eq!(format_axis(999.0), "999");
    }

    #[test]
    fn multiple_handles_degenerate_principal() {
        assert_eq!(format_multiple(Some(3.313498)), "3.31x");
        assert_eq!(format_multiple(None), "-");
    }
}
