use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::InputError;

pub const MAX_PRINCIPAL: f64 = 999_999_999.0;
pub const MAX_ANNUAL_RATE: f64 = 200.0;
pub const MAX_YEARS: u32 = 100;
pub const MAX_ADDITIONAL_AMOUNT: f64 = 99_999_999.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundFrequency {
    Yearly,
    Quarterly,
    Monthly,
    Daily,
}

impl CompoundFrequency {
    /// Compounding sub-periods per year.
    pub fn periods_per_year(self) -> u32 {
        match self {
            CompoundFrequency::Yearly => 1,
            CompoundFrequency::Quarterly => 4,
            CompoundFrequency::Monthly => 12,
            CompoundFrequency::Daily => 365,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            CompoundFrequency::Yearly => "y",
            CompoundFrequency::Quarterly => "q",
            CompoundFrequency::Monthly => "m",
            CompoundFrequency::Daily => "d",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "y" => Some(CompoundFrequency::Yearly),
            "q" => Some(CompoundFrequency::Quarterly),
            "m" => Some(CompoundFrequency::Monthly),
            "d" => Some(CompoundFrequency::Daily),
            _ => None,
        }
    }
}

/// Accepts the long name or the share-query code, ignoring case.
impl FromStr for CompoundFrequency {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yearly" | "y" => Ok(CompoundFrequency::Yearly),
            "quarterly" | "q" => Ok(CompoundFrequency::Quarterly),
            "monthly" | "m" => Ok(CompoundFrequency::Monthly),
            "daily" | "d" => Ok(CompoundFrequency::Daily),
            _ => Err(InputError::UnknownFrequency(s.to_string())),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdditionalFrequency {
    Yearly,
    Quarterly,
    Monthly,
}

impl AdditionalFrequency {
    /// Contributions per year.
    pub fn contributions_per_year(self) -> u32 {
        match self {
            AdditionalFrequency::Yearly => 1,
            AdditionalFrequency::Quarterly => 4,
            AdditionalFrequency::Monthly => 12,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            AdditionalFrequency::Yearly => "y",
            AdditionalFrequency::Quarterly => "q",
            AdditionalFrequency::Monthly => "m",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "y" => Some(AdditionalFrequency::Yearly),
            "q" => Some(AdditionalFrequency::Quarterly),
            "m" => Some(AdditionalFrequency::Monthly),
            _ => None,
        }
    }
}

impl FromStr for AdditionalFrequency {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yearly" | "y" => Ok(AdditionalFrequency::Yearly),
            "quarterly" | "q" => Ok(AdditionalFrequency::Quarterly),
            "monthly" | "m" => Ok(AdditionalFrequency::Monthly),
            _ => Err(InputError::UnknownFrequency(s.to_string())),
        }
    }
}

/// One evaluation's worth of calculator settings. Any edit produces a new
/// value and a full recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculatorInput {
    pub principal: f64,
    /// Nominal annual rate in percent.
    pub annual_rate: f64,
    pub years: u32,
    pub compound_frequency: CompoundFrequency,
    pub additional_amount: f64,
    pub additional_frequency: AdditionalFrequency,
    pub additional_start_year: u32,
}

impl Default for CalculatorInput {
    fn default() -> Self {
        Self {
            principal: 100_000.0,
            annual_rate: 4.0,
            years: 30,
            compound_frequency: CompoundFrequency::Monthly,
            additional_amount: 0.0,
            additional_frequency: AdditionalFrequency::Yearly,
            additional_start_year: 1,
        }
    }
}

impl CalculatorInput {
    /// Checks the form boundaries. The engine never calls this; callers that
    /// accept user input do.
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.principal.is_finite() || !(0.0..=MAX_PRINCIPAL).contains(&self.principal) {
            return Err(InputError::Principal {
                value: self.principal,
                max: MAX_PRINCIPAL,
            });
        }

        if !self.annual_rate.is_finite() || !(0.0..=MAX_ANNUAL_RATE).contains(&self.annual_rate) {
            return Err(InputError::AnnualRate {
                value: self.annual_rate,
                max: MAX_ANNUAL_RATE,
            });
        }

        if !(1..=MAX_YEARS).contains(&self.years) {
            return Err(InputError::Years {
                value: self.years,
                max: MAX_YEARS,
            });
        }

        if !self.additional_amount.is_finite()
            || !(0.0..=MAX_ADDITIONAL_AMOUNT).contains(&self.additional_amount)
        {
            return Err(InputError::AdditionalAmount {
                value: self.additional_amount,
                max: MAX_ADDITIONAL_AMOUNT,
            });
        }

        if !(1..=self.years).contains(&self.additional_start_year) {
            return Err(InputError::AdditionalStartYear {
                value: self.additional_start_year,
                years: self.years,
            });
        }

        Ok(())
    }

    pub(crate) fn additional_per_year(&self) -> f64 {
        self.additional_amount * self.additional_frequency.contributions_per_year() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyResult {
    pub year: u32,
    pub start_balance: f64,
    pub interest: f64,
    pub additional_principal: f64,
    pub end_balance: f64,
    /// Percent change of the balance over the year; 0 when the year starts empty.
    pub growth_rate: f64,
    pub simple_interest_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub final_amount: f64,
    pub total_principal: f64,
    pub total_interest: f64,
    pub total_return: f64,
    pub doubling_count: usize,
    pub doubling_years: Vec<u32>,
    /// `None` when the principal is zero.
    pub return_multiple: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    pub yearly_results: Vec<YearlyResult>,
    pub summary: Summary,
}
