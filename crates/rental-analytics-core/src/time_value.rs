use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{round_to, CashFlow, Money, Percent, Rate, Years};

const INITIAL_GUESS: Rate = dec!(0.10);
const MAX_IRR_ITERATIONS: u32 = 100;
const STEP_TOLERANCE: Decimal = dec!(0.00000001);
const DERIVATIVE_FLOOR: Decimal = dec!(0.000000000001);
/// Discount factors are undefined at r = -1; iterates are pulled back here.
const RATE_FLOOR: Rate = dec!(-0.999);
const DAYS_PER_YEAR: Decimal = dec!(365.25);
/// ln of the smallest discount factor kept; e^-64 is below Decimal's 28 places.
const UNDERFLOW_LN: Decimal = dec!(-64);

/// How a Newton-Raphson IRR solve ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IrrOutcome {
    /// |Δr| fell below tolerance.
    Converged { rate: Rate, iterations: u32 },
    /// NPV'(r) vanished; the last iterate is kept.
    Stalled { rate: Rate, iterations: u32 },
    /// Iteration cap reached; the last iterate is kept.
    Exhausted { rate: Rate },
    /// Arithmetic left the representable domain, or the rate fell to -100%.
    Diverged { iterations: u32 },
    /// The series cannot have an IRR.
    Undefined { reason: String },
}

impl IrrOutcome {
    /// The solved rate as a decimal (0.125 = 12.5%), when there is one.
    pub fn rate(&self) -> Option<Rate> {
        match self {
            IrrOutcome::Converged { rate, .. }
            | IrrOutcome::Stalled { rate, .. }
            | IrrOutcome::Exhausted { rate } => Some(*rate),
            IrrOutcome::Diverged { .. } | IrrOutcome::Undefined { .. } => None,
        }
    }

    /// The solved rate as a percentage rounded to 2 places.
    pub fn percent(&self) -> Option<Percent> {
        self.rate().map(|r| round_to(r * dec!(100), 2))
    }
}

/// Year offsets of dated flows from the earliest date, on 365.25-day years.
pub fn year_fractions(flows: &[CashFlow]) -> Vec<(Years, Money)> {
    let mut sorted: Vec<&CashFlow> = flows.iter().collect();
    sorted.sort_by_key(|cf| cf.date);
    let Some(first) = sorted.first() else {
        return Vec::new();
    };
    let base = first.date;
    sorted
        .iter()
        .map(|cf| {
            let days = (cf.date - base).num_days();
            (Decimal::from(days) / DAYS_PER_YEAR, cf.amount)
        })
        .collect()
}

/// NPV(r) = Σ cf / (1+r)^t over (t, cf) pairs. `None` if out of range.
pub fn npv(rate: Rate, flows: &[(Years, Money)]) -> Option<Money> {
    let scaled = scaled_npv(rate, flows)?;
    scaled.value.checked_div(scaled.scale)
}

/// NPV and dNPV/dr, both multiplied by `scale` = (1+r)^p for a pivot p.
///
/// The pivot is the latest time (at least 0) when 1+r < 1 and the earliest
/// time (at most 0) when 1+r >= 1, so every per-flow factor lies in (0, 1]. Near r = -1 the factors of early
/// flows underflow to zero instead of the whole evaluation failing. The
/// Newton step NPV/NPV' is unchanged by the common scale.
struct ScaledNpv {
    value: Decimal,
    derivative: Decimal,
    scale: Decimal,
}

/// base^exponent for base in (0, 1] and exponent >= 0, flushing to zero
/// instead of failing when the result is below Decimal's resolution.
fn decay(base: Decimal, exponent: Decimal) -> Option<Decimal> {
    if exponent.is_zero() || base == Decimal::ONE {
        return Some(Decimal::ONE);
    }
    if base.checked_ln()?.checked_mul(exponent)? < UNDERFLOW_LN {
        return Some(Decimal::ZERO);
    }
    base.checked_powd(exponent)
}

fn scaled_npv(rate: Rate, flows: &[(Years, Money)]) -> Option<ScaledNpv> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let growing = one_plus_r >= Decimal::ONE;
    let (base, pivot) = if growing {
        let earliest = flows.iter().map(|(t, _)| *t).min()?;
        (Decimal::ONE.checked_div(one_plus_r)?, earliest.min(Decimal::ZERO))
    } else {
        let latest = flows.iter().map(|(t, _)| *t).max()?;
        (one_plus_r, latest.max(Decimal::ZERO))
    };

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    for (t, cf) in flows {
        let exponent = if growing { t.checked_sub(pivot)? } else { pivot.checked_sub(*t)? };
        let factor = decay(base, exponent)?;
        let term = cf.checked_mul(factor)?;
        value = value.checked_add(term)?;
        derivative = derivative.checked_sub(t.checked_mul(term)?.checked_div(one_plus_r)?)?;
    }

    Some(ScaledNpv {
        value,
        derivative,
        scale: decay(base, pivot.abs())?,
    })
}

/// Solve NPV(r) = 0 by Newton-Raphson from r₀ = 10%.
///
/// Needs at least two flows with both an outflow and an inflow. Stops when
/// the step is below 1e-8, when the derivative is below 1e-12, or after 100
/// iterations.
pub fn solve_irr(flows: &[(Years, Money)]) -> IrrOutcome {
    if flows.len() < 2 {
        return IrrOutcome::Undefined {
            reason: "IRR requires at least 2 cash flows".into(),
        };
    }
    let all_non_negative = flows.iter().all(|(_, cf)| *cf >= Decimal::ZERO);
    let all_non_positive = flows.iter().all(|(_, cf)| *cf <= Decimal::ZERO);
    if all_non_negative || all_non_positive {
        return IrrOutcome::Undefined {
            reason: "IRR requires both an outflow and an inflow".into(),
        };
    }

    let mut rate = INITIAL_GUESS;

    for i in 0..MAX_IRR_ITERATIONS {
        let Some(ScaledNpv {
            value,
            derivative,
            scale,
        }) = scaled_npv(rate, flows)
        else {
            return IrrOutcome::Diverged { iterations: i };
        };

        // |NPV'| = |derivative| / scale
        if derivative.is_zero() || derivative.abs() < DERIVATIVE_FLOOR * scale {
            return finish(IrrOutcome::Stalled {
                rate,
                iterations: i,
            });
        }

        let Some(next) = value
            .checked_div(derivative)
            .and_then(|step| rate.checked_sub(step))
        else {
            return IrrOutcome::Diverged { iterations: i };
        };

        if (next - rate).abs() < STEP_TOLERANCE {
            return finish(IrrOutcome::Converged {
                rate: next,
                iterations: i + 1,
            });
        }

        rate = if next <= -Decimal::ONE { RATE_FLOOR } else { next };
    }

    finish(IrrOutcome::Exhausted { rate })
}

/// Solve IRR for dated flows (XIRR convention).
pub fn xirr(flows: &[CashFlow]) -> IrrOutcome {
    solve_irr(&year_fractions(flows))
}

fn finish(outcome: IrrOutcome) -> IrrOutcome {
    match outcome.rate() {
        Some(r) if r <= -Decimal::ONE => IrrOutcome::Diverged { iterations: MAX_IRR_ITERATIONS },
        _ => outcome,
    }
}
