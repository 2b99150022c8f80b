mod engine;
mod share;
mod types;

pub use engine::{compound_amount, run_projection};
pub use share::{PartialInput, decode_params, encode_params, input_from_query, share_url};
pub use types::{
    AdditionalFrequency, CalculatorInput, CalculatorResult, CompoundFrequency, MAX_ADDITIONAL_AMOUNT,
    MAX_ANNUAL_RATE, MAX_PRINCIPAL, MAX_YEARS, Summary, YearlyResult,
};
