use super::engine::evaluate_point;
use super::sweep::{linspace, validate_finite, validate_value_list};
use super::types::{EndogenousDurabilityResult, EndogenousPath, Params, Strategy};

// Coarse lattice of candidate durability pairs; convex cost of building
// durability into each component on top of the base unit cost.
const DURABILITY_SEARCH_MIN: f64 = 0.1;
const DURABILITY_SEARCH_MAX: f64 = 0.9;
const DURABILITY_SEARCH_STEPS: usize = 17;
const STRONG_DURABILITY_COST: f64 = 0.08;
const WEAK_DURABILITY_COST: f64 = 0.16;

// Endogenous durability: for each base cost the firm also chooses its
// durability pair, so every point of the sweep is itself a search over the
// (d1, d2) lattice with all four strategies evaluated at the induced total
// cost.
pub fn sweep_endogenous_durability(
    c0_min: f64,
    c0_max: f64,
    steps: usize,
    gammas: &[f64],
) -> Result<EndogenousDurabilityResult, String> {
    validate_finite("c0Min", c0_min)?;
    validate_finite("c0Max", c0_max)?;
    if steps < 2 {
        return Err(format!("steps must be at least 2, got {steps}"));
    }
    if c0_max <= c0_min {
        return Err(format!(
            "c0Max must exceed c0Min, got {c0_min}..{c0_max}"
        ));
    }
    validate_value_list("gammas", gammas)?;

    let c0_values = linspace(c0_min, c0_max, steps);
    let durability_axis = linspace(
        DURABILITY_SEARCH_MIN,
        DURABILITY_SEARCH_MAX,
        DURABILITY_SEARCH_STEPS,
    );

    let mut per_gamma = Vec::with_capacity(gammas.len());
    for &gamma in gammas {
        let mut opt_d1 = Vec::with_capacity(steps);
        let mut opt_d2 = Vec::with_capacity(steps);
        let mut winning_strategy = Vec::with_capacity(steps);
        for &c0 in &c0_values {
            let best = best_durability_choice(c0, gamma, &durability_axis);
            opt_d1.push(best.d1);
            opt_d2.push(best.d2);
            winning_strategy.push(best.strategy.label());
        }
        per_gamma.push(EndogenousPath {
            gamma,
            c0_values: c0_values.clone(),
            opt_d1,
            opt_d2,
            winning_strategy,
        });
    }

    Ok(EndogenousDurabilityResult { per_gamma })
}

struct DurabilityChoice {
    d1: f64,
    d2: f64,
    strategy: Strategy,
}

fn best_durability_choice(c0: f64, gamma: f64, durability_axis: &[f64]) -> DurabilityChoice {
    let mut best: Option<DurabilityChoice> = None;
    let mut best_profit = f64::NEG_INFINITY;
    for &d1 in durability_axis {
        for &d2 in durability_axis {
            if d2 >= d1 {
                break;
            }
            let c_total =
                c0 + STRONG_DURABILITY_COST * d1 * d1 + WEAK_DURABILITY_COST * d2 * d2;
            let profits = evaluate_point(&Params {
                d1,
                d2,
                gamma,
                c: c_total,
                k: 0.0,
            });
            // Strictly-greater keeps the first candidate in d1-major order on
            // ties, so repeat calls return identical paths.
            if profits.max() > best_profit {
                best_profit = profits.max();
                best = Some(DurabilityChoice {
                    d1,
                    d2,
                    strategy: profits.best(),
                });
            }
        }
    }
    best.expect("durability lattice always contains feasible pairs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_pairs_stay_inside_the_search_lattice() {
        let result =
            sweep_endogenous_durability(0.01, 0.05, 3, &[1.0]).expect("valid sweep");
        assert_eq!(result.per_gamma.len(), 1);
        let path = &result.per_gamma[0];
        assert_eq!(path.c0_values.len(), 3);
        assert_eq!(path.opt_d1.len(), 3);
        assert_eq!(path.opt_d2.len(), 3);
        assert_eq!(path.winning_strategy.len(), 3);
        for i in 0..3 {
            assert!(path.opt_d1[i] >= DURABILITY_SEARCH_MIN);
            assert!(path.opt_d1[i] <= DURABILITY_SEARCH_MAX);
            assert!(path.opt_d2[i] >= DURABILITY_SEARCH_MIN);
            assert!(path.opt_d2[i] < path.opt_d1[i]);
            assert!(["SI", "LI", "SM", "LM"].contains(&path.winning_strategy[i]));
        }
    }

    #[test]
    fn base_cost_axis_spans_the_requested_range() {
        let result =
            sweep_endogenous_durability(0.02, 0.14, 7, &[0.8, 1.2]).expect("valid sweep");
        for path in &result.per_gamma {
            assert!((path.c0_values[0] - 0.02).abs() < 1e-12);
            assert!((path.c0_values[6] - 0.14).abs() < 1e-12);
        }
    }

    #[test]
    fn repeat_calls_return_identical_paths() {
        let first = sweep_endogenous_durability(0.01, 0.1, 4, &[0.8, 1.2]).expect("valid");
        let second = sweep_endogenous_durability(0.01, 0.1, 4, &[0.8, 1.2]).expect("valid");
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let err = sweep_endogenous_durability(0.01, 0.1, 1, &[1.0]).expect_err("must reject");
        assert!(err.contains("steps"));

        let err = sweep_endogenous_durability(0.1, 0.1, 5, &[1.0]).expect_err("must reject");
        assert!(err.contains("c0Max"));

        let err = sweep_endogenous_durability(0.01, 0.1, 5, &[]).expect_err("must reject");
        assert!(err.contains("gammas"));

        let err =
            sweep_endogenous_durability(f64::NAN, 0.1, 5, &[1.0]).expect_err("must reject");
        assert!(err.contains("c0Min"));
    }
}
