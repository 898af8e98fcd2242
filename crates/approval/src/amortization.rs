// Rust guideline compliant 2026-10-18

//! Level-payment amortization math shared by the engine and the workflow.

use rust_decimal::{Decimal, MathematicalOps as _};
use rust_decimal_macros::dec;

/// Iterations of the affordability bisection. The resulting amounts depend on it.
pub const SEARCH_ITERATIONS: usize = 20;

/// Lower bound of the affordability bisection.
const SEARCH_FLOOR: Decimal = dec!(100);

/// Monthly installment of a level-payment loan, rounded to cents.
///
/// `principal * r * (1+r)^n / ((1+r)^n - 1)` with `r = annual_interest / 12`,
/// or plain `principal / n` when the rate is zero. A zero `months` is treated
/// as one month.
///
/// Returns `None` when the computation leaves the `Decimal` range, which
/// happens for terms of several thousand months.
#[must_use]
pub fn monthly_payment(principal: Decimal, annual_interest: Decimal, months: u32) -> Option<Decimal> {
    let months = months.max(1);
    let monthly_rate = annual_interest / dec!(12);
    if monthly_rate.is_zero() {
        return principal.checked_div(Decimal::from(months)).map(|p| p.round_dp(2));
    }
    let factor = (Decimal::ONE + monthly_rate).checked_powu(u64::from(months))?;
    let numerator = principal.checked_mul(monthly_rate)?.checked_mul(factor)?;
    numerator.checked_div(factor - Decimal::ONE).map(|p| p.round_dp(2))
}

/// Largest principal in `[100, upper]` whose installment fits `max_installment`,
/// floored to a multiple of 10.
///
/// Bisects for exactly [`SEARCH_ITERATIONS`] rounds. A midpoint whose
/// installment cannot be computed counts as unaffordable.
#[must_use]
pub fn max_affordable_principal(
    upper: Decimal,
    annual_interest: Decimal,
    months: u32,
    max_installment: Decimal,
) -> Decimal {
    let mut lo = SEARCH_FLOOR;
    let mut hi = upper;
    for _ in 0..SEARCH_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        if monthly_payment(mid, annual_interest, months).is_some_and(|p| p <= max_installment) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo / dec!(10)).floor() * dec!(10)
}
