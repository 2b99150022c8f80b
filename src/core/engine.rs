use super::types::{CalculatorInput, CalculatorResult, Summary, YearlyResult};

#[derive(Debug)]
struct Balances {
    current: f64,
    total_additional: f64,
}

/// Tracks successive power-of-two multiples of the principal.
#[derive(Debug)]
struct DoublingTracker {
    next_target: f64,
    years: Vec<u32>,
}

impl DoublingTracker {
    fn new(principal: f64) -> Self {
        // A zero principal would make every target zero and never advance.
        let next_target = if principal > 0.0 {
            principal * 2.0
        } else {
            f64::INFINITY
        };
        Self {
            next_target,
            years: Vec::new(),
        }
    }

    fn observe(&mut self, year: u32, end_balance: f64) {
        // Once the target overflows, `inf >= inf` would never terminate.
        while self.next_target.is_finite() && end_balance >= self.next_target {
            self.years.push(year);
            self.next_target *= 2.0;
        }
    }
}

pub fn run_projection(input: &CalculatorInput) -> CalculatorResult {
    let rate = input.annual_rate / 100.0;
    let factor = annual_compound_factor(rate, input.compound_frequency.periods_per_year());
    let additional_per_year = input.additional_per_year();

    let mut balances = Balances {
        current: input.principal,
        total_additional: 0.0,
    };
    let mut doubling = DoublingTracker::new(input.principal);
    let mut yearly_results = Vec::with_capacity(input.years as usize);

    for year in 1..=input.years {
        let start_balance = balances.current;
        let mut end_balance = start_balance * factor;

        let mut yearly_additional = 0.0;
        if input.additional_amount > 0.0 && year >= input.additional_start_year {
            yearly_additional = additional_per_year;
            end_balance += yearly_additional;
            balances.total_additional += yearly_additional;
        }

        let interest = end_balance - start_balance - yearly_additional;
        let growth_rate = if start_balance > 0.0 {
            (end_balance - start_balance) / start_balance * 100.0
        } else {
            0.0
        };
        let simple_interest_balance =
            input.principal + input.principal * rate * year as f64 + balances.total_additional;

        doubling.observe(year, end_balance);

        yearly_results.push(YearlyResult {
            year,
            start_balance,
            interest,
            additional_principal: yearly_additional,
            end_balance,
            growth_rate,
            simple_interest_balance,
        });

        balances.current = end_balance;
    }

    let summary = build_summary(input.principal, &balances, doubling.years);
    CalculatorResult {
        yearly_results,
        summary,
    }
}

/// Closed-form balance after `years` with no contributions. `rate` is a
/// fraction, not a percentage.
pub fn compound_amount(principal: f64, rate: f64, years: u32, compounds_per_year: u32) -> f64 {
    let n = compounds_per_year as f64;
    principal * (1.0 + rate / n).powf(n * years as f64)
}

fn annual_compound_factor(rate: f64, periods_per_year: u32) -> f64 {
    let n = periods_per_year as f64;
    (1.0 + rate / n).powi(periods_per_year as i32)
}

fn build_summary(principal: f64, balances: &Balances, doubling_years: Vec<u32>) -> Summary {
    let final_amount = balances.current;
    let total_principal = principal + balances.total_additional;
    let total_interest = final_amount - total_principal;
    let total_return = if total_principal > 0.0 {
        total_interest / total_principal * 100.0
    } else {
        0.0
    };
    let return_multiple = (principal > 0.0).then(|| final_amount / principal);

    Summary {
        final_amount,
        total_principal,
        total_interest,
        total_return,
        doubling_count: doubling_years.len(),
        doubling_years,
        return_multiple,
    }
}
