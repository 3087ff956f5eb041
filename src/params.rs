//! Scoring parameters: the two operator inputs plus the fixed business
//! defaults every request carries.
//!
//! The fixed values are policy constants of the workflow, not configuration.
//! They mirror the scoring service's contract and must be sent in full on
//! every request.

pub const EMAIL_LIST_SIZE: u32 = 100_000;
pub const UNSUB_RATE_PER_SALES_EMAIL: f64 = 0.005;
pub const SALES_EMAILS_PER_MONTH: u32 = 5;
pub const AVG_SALES_EMAILS_PER_MONTH: u32 = 5;
pub const CUSTOMER_CONVERSION_RATE: f64 = 0.05;
pub const AVG_CUSTOMER_VALUE: f64 = 2000.0;

pub const DEFAULT_AVG_SALES_PER_MONTH: u64 = 250_000;
pub const SALES_INPUT_STEP: u64 = 1000;
pub const DEFAULT_SAFE_GUARD: f64 = 0.90;
pub const SAFE_GUARD_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    /// Estimated monthly email sales in dollars.
    pub avg_sales_per_month: u64,
    /// Fraction of monthly sales the chosen strategy must preserve, in [0, 1].
    pub safe_guard: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            avg_sales_per_month: DEFAULT_AVG_SALES_PER_MONTH,
            safe_guard: DEFAULT_SAFE_GUARD,
        }
    }
}

impl ScoringParams {
    /// The guardrail shown to the operator before a run: monthly sales will
    /// not drop below this amount.
    pub fn sales_floor(&self) -> f64 {
        self.safe_guard * self.avg_sales_per_month as f64
    }

    pub fn sales_floor_label(&self) -> String {
        format_usd(self.sales_floor())
    }

    /// Query parameters for one scoring request: both operator values coerced
    /// to floating point, merged with the fixed defaults.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "monthly_sales_reduction_safe_guard",
                fmt_float(self.safe_guard),
            ),
            ("email_list_size", EMAIL_LIST_SIZE.to_string()),
            (
                "unsub_rate_per_sales_email",
                fmt_float(UNSUB_RATE_PER_SALES_EMAIL),
            ),
            (
                "sales_emails_per_month",
                SALES_EMAILS_PER_MONTH.to_string(),
            ),
            (
                "avg_sales_per_month",
                fmt_float(self.avg_sales_per_month as f64),
            ),
            (
                "avg_sales_emails_per_month",
                AVG_SALES_EMAILS_PER_MONTH.to_string(),
            ),
            (
                "customer_conversion_rate",
                fmt_float(CUSTOMER_CONVERSION_RATE),
            ),
            ("avg_customer_value", fmt_float(AVG_CUSTOMER_VALUE)),
        ]
    }
}

/// Float form for query values: integral floats keep one decimal so the
/// service sees an unambiguous float (`250000.0`, not `250000`).
fn fmt_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Currency with thousands separators and no decimals, e.g. `$225,000`.
pub fn format_usd(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if whole < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
