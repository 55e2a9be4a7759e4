use crate::error::EngineError;
use crate::types::{Money, Percent, Rate};
use crate::EngineResult;

const CONVERGENCE_THRESHOLD: f64 = 1e-6;
const DERIVATIVE_FLOOR: f64 = 1e-10;
const MAX_IRR_ITERATIONS: u32 = 50;
const IRR_GUESS: Rate = 0.10;
/// Largest NPV residual at which an unconverged IRR is still reported.
const IRR_RESIDUAL_LIMIT: f64 = 1_000.0;
const MIN_RATE: Rate = -0.99;
const MAX_RATE: Rate = 10.0;

/// Monthly-equivalent of an annual rate given in percent.
pub fn monthly_rate(annual_pct: Percent) -> Rate {
    (1.0 + annual_pct / 100.0).powf(1.0 / 12.0) - 1.0
}

/// Net Present Value of monthly flows (first flow at month 1) after an
/// upfront outlay.
pub fn npv(monthly_rate: Rate, initial_outlay: Money, flows: &[Money]) -> EngineResult<Money> {
    if monthly_rate <= -1.0 {
        return Err(EngineError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = 1.0 + monthly_rate;
    let mut discount = 1.0;
    let mut result = -initial_outlay;

    for cf in flows {
        discount *= one_plus_r;
        result += cf / discount;
    }

    Ok(result)
}

/// NPV at an annual rate with monthly flows discounted at `month / 12` years.
fn npv_annual(rate: Rate, initial_outlay: Money, flows: &[Money]) -> f64 {
    let one_plus_r = 1.0 + rate;
    flows
        .iter()
        .enumerate()
        .map(|(i, cf)| cf / one_plus_r.powf((i + 1) as f64 / 12.0))
        .sum::<f64>()
        - initial_outlay
}

fn npv_annual_derivative(rate: Rate, flows: &[Money]) -> f64 {
    let one_plus_r = 1.0 + rate;
    flows
        .iter()
        .enumerate()
        .map(|(i, cf)| {
            let years = (i + 1) as f64 / 12.0;
            -cf * years / one_plus_r.powf(years + 1.0)
        })
        .sum()
}

/// Annual Internal Rate of Return of monthly flows using Newton-Raphson.
///
/// Starts at 10%, runs at most 50 iterations and fails as soon as the
/// rate leaves (-99%, 1000%).
pub fn irr(initial_outlay: Money, flows: &[Money]) -> EngineResult<Rate> {
    if flows.is_empty() {
        return Err(EngineError::InsufficientData(
            "IRR requires at least 1 cash flow after the outlay".into(),
        ));
    }

    let mut rate = IRR_GUESS;

    for i in 0..MAX_IRR_ITERATIONS {
        let npv_val = npv_annual(rate, initial_outlay, flows);
        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        let dnpv = npv_annual_derivative(rate, flows);
        if dnpv.abs() < DERIVATIVE_FLOOR {
            break;
        }

        rate -= npv_val / dnpv;

        if !(MIN_RATE..=MAX_RATE).contains(&rate) {
            return Err(EngineError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i + 1,
                last_delta: npv_val,
            });
        }
    }

    let residual = npv_annual(rate, initial_outlay, flows);
    if residual.abs() < IRR_RESIDUAL_LIMIT {
        Ok(rate)
    } else {
        Err(EngineError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: MAX_IRR_ITERATIONS,
            last_delta: residual,
        })
    }
}

/// Annual Modified Internal Rate of Return of monthly flows.
///
/// Positive flows are compounded to the horizon and negative flows (plus the
/// outlay) discounted to today, both at `annual_rate`.
pub fn mirr(initial_outlay: Money, flows: &[Money], annual_rate: Rate) -> EngineResult<Rate> {
    if flows.is_empty() {
        return Err(EngineError::InsufficientData(
            "MIRR requires at least 1 cash flow after the outlay".into(),
        ));
    }

    let n = flows.len();
    let one_plus_r = 1.0 + annual_rate;

    let mut fv_positive = 0.0;
    let mut pv_negative = initial_outlay;
    for (i, cf) in flows.iter().enumerate() {
        let month = (i + 1) as f64;
        if *cf > 0.0 {
            fv_positive += cf * one_plus_r.powf((n as f64 - month) / 12.0);
        } else {
            pv_negative += cf.abs() / one_plus_r.powf(month / 12.0);
        }
    }

    if pv_negative == 0.0 {
        return Err(EngineError::DivisionByZero {
            context: "MIRR present value of outflows".into(),
        });
    }
    if fv_positive <= 0.0 {
        return Err(EngineError::FinancialImpossibility(
            "MIRR needs at least one positive flow".into(),
        ));
    }

    let years = n as f64 / 12.0;
    let result = (fv_positive / pv_negative).powf(1.0 / years) - 1.0;

    if (MIN_RATE..=MAX_RATE).contains(&result) {
        Ok(result)
    } else {
        Err(EngineError::ConvergenceFailure {
            function: "MIRR".into(),
            iterations: 0,
            last_delta: result,
        })
    }
}

/// First 1-based month in which the cumulative flow, starting at
/// `-initial_outlay`, turns non-negative.
pub fn payback_month(initial_outlay: Money, flows: &[Money]) -> Option<u32> {
    let mut cumulative = -initial_outlay;
    for (i, cf) in flows.iter().enumerate() {
        cumulative += cf;
        if cumulative >= 0.0 {
            return Some(i as u32 + 1);
        }
    }
    None
}
