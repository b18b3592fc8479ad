use super::types::{Params, StrategyProfits};

// Lattice resolutions for the embedded searches. These trade accuracy for
// work per cell; winner classifications are stable from ~15 points/axis up.
const LEASE_INTEGRAL_STEPS: usize = 29;
const LEASE_MODULAR_STEPS: usize = 17;

// Each underlying profit is evaluated once and shared where one strategy
// falls back on another.
pub fn evaluate_point(params: &Params) -> StrategyProfits {
    let sell_integral = profit_sell_integral(params);
    let lease_integral = profit_lease_integral(params);
    let (d1l, d2l) = params.lease_durability();

    StrategyProfits {
        sell_integral,
        lease_integral,
        sell_modular: modular_component_profit(params).max(sell_integral),
        lease_modular: lease_modular_search(d1l, d2l, params.c, params.k, LEASE_MODULAR_STEPS)
            .max(lease_integral)
            .max(0.0),
    }
}

pub fn profit_sell_integral(params: &Params) -> f64 {
    integral_closed_form(params.d1 + params.d2, params.c)
}

// Below the reuse threshold the closed form is invalid (the firm re-leases
// only part of the returned fleet) and the lattice search takes over.
pub fn profit_lease_integral(params: &Params) -> f64 {
    let (d1l, d2l) = params.lease_durability();
    let d_sum_l = d1l + d2l;
    let reuse_threshold = (2.0 - d_sum_l) / 8.0;
    if params.c < reuse_threshold {
        lease_integral_search(d_sum_l, params.c, LEASE_INTEGRAL_STEPS)
    } else {
        integral_closed_form(d_sum_l, params.c)
    }
}

// Integral production stays available to the modular seller, so the result
// never drops below Sell-Integral.
pub fn profit_sell_modular(params: &Params) -> f64 {
    modular_component_profit(params).max(profit_sell_integral(params))
}

pub fn profit_lease_modular(params: &Params) -> f64 {
    let (d1l, d2l) = params.lease_durability();
    lease_modular_search(d1l, d2l, params.c, params.k, LEASE_MODULAR_STEPS)
        .max(profit_lease_integral(params))
        .max(0.0)
}

fn integral_closed_form(d_sum: f64, c: f64) -> f64 {
    if 2.0 * c > 1.0 + d_sum / 2.0 {
        return 0.0;
    }
    let numerator = 2.0 - 4.0 * c + d_sum;
    numerator * numerator / (8.0 * (2.0 + 3.0 * d_sum))
}

fn modular_component_profit(params: &Params) -> f64 {
    // Weak component: sold fresh every cycle, its margin erodes with its own
    // durability. A non-positive margin means the component line is shut down.
    let margin_weak = 1.0 - 2.0 * params.c - params.d2 - params.k;
    let weak = if margin_weak > 0.0 {
        margin_weak * margin_weak / (8.0 * (1.0 - params.d2))
    } else {
        0.0
    };

    // Strong component: benefits from both durabilities on the demand side.
    let margin_strong = 1.0 - 2.0 * params.c - params.k + 2.0 * params.d2 + params.d1;
    let strong = if margin_strong > 0.0 {
        margin_strong * margin_strong / (8.0 * (1.0 + 3.0 * params.d1 + 4.0 * params.d2))
    } else {
        0.0
    };

    weak + strong
}

// Exhaustive search over new-lease and used-lease quantities, Lu <= Ln.
// Prices clear a vertically differentiated market with used quality
// d_sum_l/2; lattice points implying a negative price are infeasible.
fn lease_integral_search(d_sum_l: f64, c: f64, steps: usize) -> f64 {
    let half_d = d_sum_l / 2.0;
    let last = (steps - 1) as f64;
    let mut best = 0.0;
    for i in 0..steps {
        let ln = i as f64 / last;
        for j in 0..steps {
            let lu = j as f64 / last;
            if lu > ln {
                break;
            }
            let rn = 1.0 - ln - half_d * lu;
            let ru = half_d * (1.0 - ln - lu);
            if rn < 0.0 || ru < 0.0 {
                continue;
            }
            let profit = rn * ln + ru * lu - 2.0 * c * ln;
            if profit > best {
                best = profit;
            }
        }
    }
    best
}

// The three modular lease segments: both components new (nn), used strong
// with a fresh weak (un), both used (uu). Used strong components come out of
// earlier nn leases, so un + uu cannot exceed nn, and the market cannot be
// more than covered.
fn lease_modular_search(d1l: f64, d2l: f64, c: f64, k: f64, steps: usize) -> f64 {
    let q_un = (1.0 + d1l) / 2.0;
    let q_uu = (d1l + d2l) / 2.0;
    let last = (steps - 1) as f64;
    let mut best = 0.0;
    for i in 0..steps {
        let lnn = i as f64 / last;
        for j in 0..steps {
            let lun = j as f64 / last;
            for l in 0..steps {
                let luu = l as f64 / last;
                if lun + luu > lnn {
                    break;
                }
                let total = lnn + lun + luu;
                if total >= 1.0 {
                    break;
                }
                // Unit rates by backward induction from the lowest-quality
                // segment; each marginal lessee is indifferent to the segment
                // below.
                let ruu = q_uu * (1.0 - total);
                let run = ruu + (q_un - q_uu) * (1.0 - lnn - lun);
                let rnn = run + (1.0 - q_un) * (1.0 - lnn);
                let profit = rnn * lnn + run * lun + ruu * luu
                    - (2.0 * c + k) * lnn
                    - (c + k) * lun
                    - k * luu;
                if profit > best {
                    best = profit;
                }
            }
        }
    }
    best
}
