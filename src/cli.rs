use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ServerConfig, run_http_server};
use crate::core::{
    AdditionalFrequency, CalculatorInput, CalculatorResult, CompoundFrequency, input_from_query,
    run_projection, share_url,
};
use crate::error::InputError;
use crate::format::{
    Locale, format_axis, format_currency, format_multiple, format_number, format_percent,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliCompoundFrequency {
    #[value(alias = "y")]
    Yearly,
    #[value(alias = "q")]
    Quarterly,
    #[value(alias = "m")]
    Monthly,
    #[value(alias = "d")]
    Daily,
}

impl From<CliCompoundFrequency> for CompoundFrequency {
    fn from(value: CliCompoundFrequency) -> Self {
        match value {
            CliCompoundFrequency::Yearly => CompoundFrequency::Yearly,
            CliCompoundFrequency::Quarterly => CompoundFrequency::Quarterly,
            CliCompoundFrequency::Monthly => CompoundFrequency::Monthly,
            CliCompoundFrequency::Daily => CompoundFrequency::Daily,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliAdditionalFrequency {
    #[value(alias = "y")]
    Yearly,
    #[value(alias = "q")]
    Quarterly,
    #[value(alias = "m")]
    Monthly,
}

impl From<CliAdditionalFrequency> for AdditionalFrequency {
    fn from(value: CliAdditionalFrequency) -> Self {
        match value {
            CliAdditionalFrequency::Yearly => AdditionalFrequency::Yearly,
            CliAdditionalFrequency::Quarterly => AdditionalFrequency::Quarterly,
            CliAdditionalFrequency::Monthly => AdditionalFrequency::Monthly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound interest projections with shareable query strings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, help = "Persist recent runs to this JSON file")]
        history_file: Option<PathBuf>,
        #[arg(long, default_value_t = 300, help = "Projection cache lifetime in seconds")]
        cache_ttl_secs: u64,
    },
    /// Print a year-by-year projection
    Project {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "zh", help = "Display locale: zh, en or ja")]
        locale: Locale,
        #[arg(long, help = "Print JSON instead of a table")]
        json: bool,
    },
    /// Print a shareable link for the given input
    Share {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "")]
        base: String,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct InputArgs {
    #[arg(long, help = "Share query to start from, e.g. p=5000&r=10&y=1&f=y")]
    pub query: Option<String>,
    #[arg(long)]
    pub principal: Option<f64>,
    #[arg(long, help = "Nominal annual rate in percent")]
    pub rate: Option<f64>,
    #[arg(long)]
    pub years: Option<u32>,
    #[arg(long, value_enum)]
    pub frequency: Option<CliCompoundFrequency>,
    #[arg(long, help = "Recurring contribution per period")]
    pub additional: Option<f64>,
    #[arg(long, value_enum)]
    pub additional_frequency: Option<CliAdditionalFrequency>,
    #[arg(long)]
    pub additional_start_year: Option<u32>,
}

/// Flags override whatever the query decodes to; the result is validated.
pub fn build_input(args: &InputArgs) -> Result<CalculatorInput, InputError> {
    let mut input = input_from_query(args.query.as_deref().unwrap_or_default());

    if let Some(v) = args.principal {
        input.principal = v;
    }
    if let Some(v) = args.rate {
        input.annual_rate = v;
    }
    if let Some(v) = args.years {
        input.years = v;
    }
    if let Some(v) = args.frequency {
        input.compound_frequency = v.into();
    }
    if let Some(v) = args.additional {
        input.additional_amount = v;
    }
    if let Some(v) = args.additional_frequency {
        input.additional_frequency = v.into();
    }
    if let Some(v) = args.additional_start_year {
        input.additional_start_year = v;
    }

    input.validate()?;
    Ok(input)
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve {
            port,
            history_file,
            cache_ttl_secs,
        } => {
            let config = ServerConfig {
                port,
                history_file,
                cache_ttl: Duration::from_secs(cache_ttl_secs),
            };
            run_http_server(config)
                .await
                .map_err(|e| format!("Server error: {e}"))
        }
        Command::Project {
            input,
            locale,
            json,
        } => {
            let input = build_input(&input).map_err(|e| e.to_string())?;
            let result = run_projection(&input);
            if json {
                let out = serde_json::to_string_pretty(&result)
                    .map_err(|e| format!("failed to encode result: {e}"))?;
                println!("{out}");
            } else {
                print!("{}", render_report(&input, &result, locale));
            }
            Ok(())
        }
        Command::Share { input, base } => {
            let input = build_input(&input).map_err(|e| e.to_string())?;
            println!("{}", share_url(&base, &input));
            Ok(())
        }
    }
}

pub fn render_report(input: &CalculatorInput, result: &CalculatorResult, locale: Locale) -> String {
    let mut out = String::new();
    let summary = &result.summary;

    let _ = writeln!(
        out,
        "{:>5}  {:>16}  {:>14}  {:>12}  {:>16}  {:>8}",
        "year", "start", "interest", "added", "end", "growth"
    );
    for row in &result.yearly_results {
        let marker = if summary.doubling_years.contains(&row.year) {
            " *"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:>5}  {:>16}  {:>14}  {:>12}  {:>16}  {:>8}{marker}",
            row.year,
            format_number(row.start_balance, locale),
            format!("+{}", format_number(row.interest, locale)),
            if row.additional_principal > 0.0 {
                format!("+{}", format_number(row.additional_principal, locale))
            } else {
                "-".to_string()
            },
            format_number(row.end_balance, locale),
            format_percent(row.growth_rate, locale),
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "final amount     {} ({})",
        format_currency(summary.final_amount, locale),
        format_axis(summary.final_amount)
    );
    let _ = writeln!(
        out,
        "total principal  {}",
        format_currency(summary.total_principal, locale)
    );
    let _ = writeln!(
        out,
        "total interest   {} ({})",
        format_currency(summary.total_interest, locale),
        format_percent(summary.total_return, locale)
    );
    let _ = writeln!(
        out,
        "return multiple  {}",
        format_multiple(summary.return_multiple)
    );
    let doubling = if summary.doubling_years.is_empty() {
        "none".to_string()
    } else {
        summary
            .doubling_years
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(
        out,
        "doublings        {} (years: {doubling})",
        summary.doubling_count
    );
    let _ = writeln!(
        out,
        "simple interest  {}",
        result
            .yearly_results
            .last()
            .map(|row| format_currency(row.simple_interest_balance, locale))
            .unwrap_or_else(|| format_currency(input.principal, locale))
    );
    out
}
