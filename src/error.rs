use thiserror::Error;

/// Rejected calculator input. Each variant names the offending field the way
/// the CLI flags and JSON keys spell it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("principal must be between 0 and {max}, got {value}")]
    Principal { value: f64, max: f64 },

    #[error("annualRate must be between 0 and {max}, got {value}")]
    AnnualRate { value: f64, max: f64 },

    #[error("years must be between 1 and {max}, got {value}")]
    Years { value: u32, max: u32 },

    #[error("additionalAmount must be between 0 and {max}, got {value}")]
    AdditionalAmount { value: f64, max: f64 },

    #[error("additionalStartYear must be between 1 and {years}, got {value}")]
    AdditionalStartYear { value: u32, years: u32 },

    #[error("unknown frequency '{0}'")]
    UnknownFrequency(String),
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_display_names_the_field() {
        let err = InputError::Years { value: 0, max: 100 };
        assert_eq!(err.to_string(), "years must be between 1 and 100, got 0");

        let err = InputError::AdditionalStartYear { value: 12, years: 10 };
        assert_eq!(
            err.to_string(),
            "additionalStartYear must be between 1 and 10, got 12"
        );
    }

    #[test]
    fn unknown_frequency_display_quotes_the_value() {
        let err = InputError::UnknownFrequency("weekly".to_string());
        assert_eq!(err.to_string(), "unknown frequency 'weekly'");
    }
}
