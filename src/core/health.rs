use thiserror::Error;

use super::types::{FinancialInputs, HealthReport};

pub const SAVINGS_TARGET_PERCENT: f64 = 20.0;
pub const DEBT_TO_INCOME_LIMIT_PERCENT: f64 = 36.0;
pub const EMERGENCY_FUND_MONTHS: u32 = 3;
pub const CURRENCY_PREFIX: &str = "RM";

pub const ADVICE_SAVE_MORE: &str = "Aim to save at least 20% of your income.";
pub const ADVICE_SAVINGS_HEALTHY: &str = "Great job on a healthy savings rate!";
pub const ADVICE_DEBT_HIGH: &str = "Your debt-to-income ratio is high. Consider reducing debt.";
pub const ADVICE_DEBT_HEALTHY: &str = "Your debt-to-income ratio is within a healthy range.";

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{field} must be a number, got {raw:?}")]
    NotANumber { field: &'static str, raw: String },
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be <= {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: f64,
        max: f64,
    },
}

/// Largest accepted amount; keeps `income * EMERGENCY_FUND_MONTHS` finite.
pub const MAX_AMOUNT: f64 = 1e15;

/// Lenient amount parsing: anything that is not a finite, non-negative number becomes `0`.
/// Negative amounts are clamped to `0` on purpose, amounts above [`MAX_AMOUNT`] to the cap.
pub fn parse_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) => clamp_amount(v),
        Err(_) => 0.0,
    }
}

fn clamp_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.min(MAX_AMOUNT)
    } else {
        0.0
    }
}

/// Strict amount parsing. Empty text still means `0`.
pub fn parse_amount_strict(field: &'static str, raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| InputError::NotANumber {
            field,
            raw: raw.to_string(),
        })?;
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(InputError::Negative { field, value });
    }
    if value > MAX_AMOUNT {
        return Err(InputError::TooLarge {
            field,
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(value)
}

impl FinancialInputs {
    pub fn parse(income: &str, expenses: &str, debt: &str) -> Self {
        Self {
            income: parse_amount(income),
            expenses: parse_amount(expenses),
            debt: parse_amount(debt),
        }
    }

    pub fn parse_strict(income: &str, expenses: &str, debt: &str) -> Result<Self, InputError> {
        Ok(Self {
            income: parse_amount_strict("income", income)?,
            expenses: parse_amount_strict("expenses", expenses)?,
            debt: parse_amount_strict("debt", debt)?,
        })
    }
}

pub fn compute(inputs: FinancialInputs) -> HealthReport {
    let income = clamp_amount(inputs.income);
    let expenses = clamp_amount(inputs.expenses);
    let debt = clamp_amount(inputs.debt);
    let has_income = income > 0.0;

    let savings_rate_percent = if has_income {
        (income - expenses) / income * 100.0
    } else {
        0.0
    };
    let debt_to_income_ratio_percent = if has_income {
        debt / income * 100.0
    } else {
        0.0
    };
    let recommended_emergency_fund = if has_income {
        round_to_cents(income * f64::from(EMERGENCY_FUND_MONTHS))
    } else {
        0.0
    };

    let mut advice = Vec::with_capacity(3);
    advice.push(
        if savings_rate_percent < SAVINGS_TARGET_PERCENT {
            ADVICE_SAVE_MORE
        } else {
            ADVICE_SAVINGS_HEALTHY
        }
        .to_string(),
    );
    advice.push(
        if debt_to_income_ratio_percent > DEBT_TO_INCOME_LIMIT_PERCENT {
            ADVICE_DEBT_HIGH
        } else {
            ADVICE_DEBT_HEALTHY
        }
        .to_string(),
    );
    let qualifier = if has_income {
        format!("{EMERGENCY_FUND_MONTHS} months")
    } else {
        "N/A".to_string()
    };
    let fund = format_currency(recommended_emergency_fund);
    advice.push(format!(
        "Recommended emergency fund: {CURRENCY_PREFIX} {fund} ({qualifier})."
    ));

    HealthReport {
        savings_rate_percent,
        debt_to_income_ratio_percent,
        recommended_emergency_fund,
        advice,
    }
}

/// Parses the three free-text fields leniently and computes the report.
pub fn compute_from_text(income: &str, expenses: &str, debt: &str) -> HealthReport {
    compute(FinancialInputs::parse(income, expenses, debt))
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}")
}

pub fn format_currency(value: f64) -> String {
    format!("{value:.2}")
}

impl HealthReport {
    pub fn savings_rate_display(&self) -> String {
        format_percent(self.savings_rate_percent)
    }

    pub fn debt_to_income_display(&self) -> String {
        format_percent(self.debt_to_income_ratio_percent)
    }

    pub fn emergency_fund_display(&self) -> String {
        format_currency(self.recommended_emergency_fund)
    }
}

/// Health-check form: raw field text plus the parsed inputs and report of the latest submission.
#[derive(Debug, Clone, Default)]
pub struct HealthCheckForm {
    pub income: String,
    pub expenses: String,
    pub debt: String,
    pub(crate) submitted: Option<(FinancialInputs, HealthReport)>,
}

impl HealthCheckForm {
    pub fn report(&self) -> Option<&HealthReport> {
        self.submitted.as_ref().map(|(_, report)| report)
    }

    pub fn submitted(&self) -> Option<(FinancialInputs, &HealthReport)> {
        self.submitted.as_ref().map(|(inputs, report)| (*inputs, report))
    }

    pub fn submit(&mut self) -> &HealthReport {
        let inputs = FinancialInputs::parse(&self.income, &self.expenses, &self.debt);
        self.store(inputs)
    }

    pub fn submit_strict(&mut self) -> Result<&HealthReport, InputError> {
        let inputs = FinancialInputs::parse_strict(&self.income, &self.expenses, &self.debt)?;
        Ok(self.store(inputs))
    }

    fn store(&mut self, inputs: FinancialInputs) -> &HealthReport {
        let (_, report) = self.submitted.insert((inputs, compute(inputs)));
        report
    }
}
