use super::engine::evaluate_point;
use super::types::{
    ArchitectureChoiceGrid, BusinessModelGrid, IntegrationCostGrid, IntegrationCostLayer,
    JointCase, JointChoiceGrid, JointChoiceLayer, Params, StrategyProfits, SwitchingGrid,
    SwitchingLayer,
};

const DURABILITY_AXIS_MIN: f64 = 0.05;
const DURABILITY_AXIS_MAX: f64 = 0.95;
const COST_AXIS_MIN: f64 = 0.01;
const COST_AXIS_MAX: f64 = 0.35;
const SPILLOVER_AXIS_MIN: f64 = 0.5;
const SPILLOVER_AXIS_MAX: f64 = 1.5;

pub fn sweep_architecture_choice(
    gamma: f64,
    c: f64,
    k: f64,
    resolution: usize,
) -> Result<ArchitectureChoiceGrid, String> {
    validate_resolution(resolution)?;
    validate_finite("gamma", gamma)?;
    validate_finite("c", c)?;
    validate_finite("k", k)?;

    let axis_d1 = linspace(DURABILITY_AXIS_MIN, DURABILITY_AXIS_MAX, resolution);
    let axis_d2 = axis_d1.clone();

    let mut sell_matrix = Vec::with_capacity(resolution);
    let mut lease_matrix = Vec::with_capacity(resolution);
    for &d2 in &axis_d2 {
        let mut sell_row = Vec::with_capacity(resolution);
        let mut lease_row = Vec::with_capacity(resolution);
        for &d1 in &axis_d1 {
            if d2 >= d1 {
                sell_row.push(None);
                lease_row.push(None);
                continue;
            }
            let profits = evaluate_point(&Params {
                d1,
                d2,
                gamma,
                c,
                k,
            });
            sell_row.push(Some(u8::from(
                profits.sell_modular > profits.sell_integral,
            )));
            lease_row.push(Some(u8::from(
                profits.lease_modular > profits.lease_integral,
            )));
        }
        sell_matrix.push(sell_row);
        lease_matrix.push(lease_row);
    }

    Ok(ArchitectureChoiceGrid {
        axis_d1,
        axis_d2,
        sell_matrix,
        lease_matrix,
    })
}

pub fn sweep_switching(
    c: f64,
    resolution: usize,
    gammas: &[f64],
) -> Result<SwitchingGrid, String> {
    validate_resolution(resolution)?;
    validate_finite("c", c)?;
    validate_value_list("gammas", gammas)?;

    let axis_d1 = linspace(DURABILITY_AXIS_MIN, DURABILITY_AXIS_MAX, resolution);
    let axis_d2 = axis_d1.clone();

    let mut per_gamma = Vec::with_capacity(gammas.len());
    for &gamma in gammas {
        let mut matrix = Vec::with_capacity(resolution);
        for &d2 in &axis_d2 {
            let mut row = Vec::with_capacity(resolution);
            for &d1 in &axis_d1 {
                if d2 >= d1 {
                    row.push(None);
                    continue;
                }
                let profits = evaluate_point(&Params {
                    d1,
                    d2,
                    gamma,
                    c,
                    k: 0.0,
                });
                row.push(Some(switch_code(&profits)));
            }
            matrix.push(row);
        }
        per_gamma.push(SwitchingLayer { gamma, matrix });
    }

    Ok(SwitchingGrid {
        axis_d1,
        axis_d2,
        per_gamma,
    })
}

// The swept axis upper bounds vary between published figures, so they are
// caller inputs.
pub fn sweep_business_model(
    d1: f64,
    d2: f64,
    resolution: usize,
    c_max: f64,
    gamma_max: f64,
) -> Result<BusinessModelGrid, String> {
    validate_resolution(resolution)?;
    validate_finite("d1", d1)?;
    validate_finite("d2", d2)?;
    validate_finite("cMax", c_max)?;
    validate_finite("gammaMax", gamma_max)?;
    if c_max <= COST_AXIS_MIN {
        return Err(format!("cMax must exceed {COST_AXIS_MIN}, got {c_max}"));
    }
    if gamma_max <= SPILLOVER_AXIS_MIN {
        return Err(format!(
            "gammaMax must exceed {SPILLOVER_AXIS_MIN}, got {gamma_max}"
        ));
    }

    let axis_c = linspace(COST_AXIS_MIN, c_max, resolution);
    let axis_gamma = linspace(SPILLOVER_AXIS_MIN, gamma_max, resolution);

    let mut integral_pref = Vec::with_capacity(resolution);
    let mut modular_pref = Vec::with_capacity(resolution);
    let mut switch_matrix = Vec::with_capacity(resolution);
    let feasible = d2 < d1;
    for &gamma in &axis_gamma {
        let mut integral_row = Vec::with_capacity(resolution);
        let mut modular_row = Vec::with_capacity(resolution);
        let mut switch_row = Vec::with_capacity(resolution);
        for &c in &axis_c {
            if !feasible {
                integral_row.push(None);
                modular_row.push(None);
                switch_row.push(None);
                continue;
            }
            let profits = evaluate_point(&Params {
                d1,
                d2,
                gamma,
                c,
                k: 0.0,
            });
            integral_row.push(Some(u8::from(
                profits.lease_integral > profits.sell_integral,
            )));
            modular_row.push(Some(u8::from(
                profits.lease_modular > profits.sell_modular,
            )));
            switch_row.push(Some(switch_code(&profits)));
        }
        integral_pref.push(integral_row);
        modular_pref.push(modular_row);
        switch_matrix.push(switch_row);
    }

    Ok(BusinessModelGrid {
        axis_c,
        axis_gamma,
        integral_pref,
        modular_pref,
        switch_code: switch_matrix,
    })
}

pub fn sweep_joint_choice(
    resolution: usize,
    cases: &[JointCase],
) -> Result<JointChoiceGrid, String> {
    validate_resolution(resolution)?;
    if cases.is_empty() {
        return Err("cases must not be empty".to_string());
    }
    for case in cases {
        validate_finite("case d1", case.d1)?;
        validate_finite("case d2", case.d2)?;
    }

    let axis_c = linspace(COST_AXIS_MIN, COST_AXIS_MAX, resolution);
    let axis_gamma = linspace(SPILLOVER_AXIS_MIN, SPILLOVER_AXIS_MAX, resolution);

    let mut per_case = Vec::with_capacity(cases.len());
    for case in cases {
        per_case.push(JointChoiceLayer {
            label: case.label.clone(),
            strategy_code: strategy_code_matrix(case.d1, case.d2, 0.0, &axis_c, &axis_gamma),
        });
    }

    Ok(JointChoiceGrid {
        axis_c,
        axis_gamma,
        per_case,
    })
}

pub fn sweep_integration_cost(
    d1: f64,
    d2: f64,
    resolution: usize,
    k_values: &[f64],
) -> Result<IntegrationCostGrid, String> {
    validate_resolution(resolution)?;
    validate_finite("d1", d1)?;
    validate_finite("d2", d2)?;
    validate_value_list("kValues", k_values)?;

    let axis_c = linspace(COST_AXIS_MIN, COST_AXIS_MAX, resolution);
    let axis_gamma = linspace(SPILLOVER_AXIS_MIN, SPILLOVER_AXIS_MAX, resolution);

    let mut per_k = Vec::with_capacity(k_values.len());
    for &k in k_values {
        per_k.push(IntegrationCostLayer {
            k,
            strategy_code: strategy_code_matrix(d1, d2, k, &axis_c, &axis_gamma),
        });
    }

    Ok(IntegrationCostGrid {
        axis_c,
        axis_gamma,
        per_k,
    })
}

fn strategy_code_matrix(
    d1: f64,
    d2: f64,
    k: f64,
    axis_c: &[f64],
    axis_gamma: &[f64],
) -> Vec<Vec<Option<u8>>> {
    let feasible = d2 < d1;
    let mut matrix = Vec::with_capacity(axis_gamma.len());
    for &gamma in axis_gamma {
        let mut row = Vec::with_capacity(axis_c.len());
        for &c in axis_c {
            if !feasible {
                row.push(None);
                continue;
            }
            let profits = evaluate_point(&Params {
                d1,
                d2,
                gamma,
                c,
                k,
            });
            row.push(Some(profits.best().code()));
        }
        matrix.push(row);
    }
    matrix
}

fn switch_code(profits: &StrategyProfits) -> u8 {
    let integral_prefers_lease = profits.lease_integral > profits.sell_integral;
    let modular_prefers_lease = profits.lease_modular > profits.sell_modular;
    match (integral_prefers_lease, modular_prefers_lease) {
        (true, false) => 1,
        (true, true) => 2,
        // The sell-integral/lease-modular disagreement maps to 0 as well,
        // not to a code of its own.
        _ => 0,
    }
}

pub(super) fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    let last = (points - 1) as f64;
    (0..points)
        .map(|i| start + (end - start) * i as f64 / last)
        .collect()
}

pub(super) fn validate_resolution(resolution: usize) -> Result<(), String> {
    if resolution < 2 {
        return Err(format!("resolution must be at least 2, got {resolution}"));
    }
    Ok(())
}

pub(super) fn validate_finite(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{name} must be finite, got {value}"));
    }
    Ok(())
}

pub(super) fn validate_value_list(name: &str, values: &[f64]) -> Result<(), String> {
    if values.is_empty() {
        return Err(format!("{name} must not be empty"));
    }
    for &value in values {
        validate_finite(name, value)?;
    }
    Ok(())
}
