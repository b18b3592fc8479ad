use serde::Serialize;

// Effective leasing durability stays below 1 so the leasing closed forms
// keep non-degenerate denominators.
pub const MAX_LEASE_DURABILITY: f64 = 0.999;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    SellIntegral,
    LeaseIntegral,
    SellModular,
    LeaseModular,
}

impl Strategy {
    // The ordering is fixed; downstream colorscale/legend mappings depend
    // on it.
    pub fn code(self) -> u8 {
        match self {
            Strategy::SellIntegral => 0,
            Strategy::LeaseIntegral => 1,
            Strategy::SellModular => 2,
            Strategy::LeaseModular => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::SellIntegral => "SI",
            Strategy::LeaseIntegral => "LI",
            Strategy::SellModular => "SM",
            Strategy::LeaseModular => "LM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub d1: f64,
    pub d2: f64,
    pub gamma: f64,
    pub c: f64,
    pub k: f64,
}

impl Params {
    pub fn lease_durability(&self) -> (f64, f64) {
        (
            (self.gamma * self.d1).min(MAX_LEASE_DURABILITY),
            (self.gamma * self.d2).min(MAX_LEASE_DURABILITY),
        )
    }

    pub fn is_feasible(&self) -> bool {
        self.d2 < self.d1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyProfits {
    pub sell_integral: f64,
    pub lease_integral: f64,
    pub sell_modular: f64,
    pub lease_modular: f64,
}

impl StrategyProfits {
    // Ties go to the earlier entry in the fixed SI, LI, SM, LM enumeration.
    pub fn best(&self) -> Strategy {
        let mut best = Strategy::SellIntegral;
        let mut best_profit = self.sell_integral;
        for (strategy, profit) in [
            (Strategy::LeaseIntegral, self.lease_integral),
            (Strategy::SellModular, self.sell_modular),
            (Strategy::LeaseModular, self.lease_modular),
        ] {
            if profit > best_profit {
                best = strategy;
                best_profit = profit;
            }
        }
        best
    }

    pub fn max(&self) -> f64 {
        self.sell_integral
            .max(self.lease_integral)
            .max(self.sell_modular)
            .max(self.lease_modular)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointCase {
    pub d1: f64,
    pub d2: f64,
    pub label: String,
}

// Grid matrices are indexed [row][column]; rows follow the second listed axis
// (d2 or gamma), columns the first (d1 or c). A `None` cell is the
// infeasibility sentinel and serializes to JSON null.

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureChoiceGrid {
    pub axis_d1: Vec<f64>,
    pub axis_d2: Vec<f64>,
    // 1 where modular strictly beats integral under the given regime.
    pub sell_matrix: Vec<Vec<Option<u8>>>,
    pub lease_matrix: Vec<Vec<Option<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchingLayer {
    pub gamma: f64,
    // 0 stay-sell, 1 switch-down, 2 stay-lease.
    pub matrix: Vec<Vec<Option<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchingGrid {
    pub axis_d1: Vec<f64>,
    pub axis_d2: Vec<f64>,
    pub per_gamma: Vec<SwitchingLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessModelGrid {
    pub axis_c: Vec<f64>,
    pub axis_gamma: Vec<f64>,
    // 1 where leasing strictly beats selling for the respective firm.
    pub integral_pref: Vec<Vec<Option<u8>>>,
    pub modular_pref: Vec<Vec<Option<u8>>>,
    pub switch_code: Vec<Vec<Option<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JointChoiceLayer {
    pub label: String,
    pub strategy_code: Vec<Vec<Option<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JointChoiceGrid {
    pub axis_c: Vec<f64>,
    pub axis_gamma: Vec<f64>,
    pub per_case: Vec<JointChoiceLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationCostLayer {
    pub k: f64,
    pub strategy_code: Vec<Vec<Option<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationCostGrid {
    pub axis_c: Vec<f64>,
    pub axis_gamma: Vec<f64>,
    pub per_k: Vec<IntegrationCostLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndogenousPath {
    pub gamma: f64,
    pub c0_values: Vec<f64>,
    pub opt_d1: Vec<f64>,
    pub opt_d2: Vec<f64>,
    pub winning_strategy: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndogenousDurabilityResult {
    pub per_gamma: Vec<EndogenousPath>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_codes_are_fixed() {
        assert_eq!(Strategy::SellIntegral.code(), 0);
        assert_eq!(Strategy::LeaseIntegral.code(), 1);
        assert_eq!(Strategy::SellModular.code(), 2);
        assert_eq!(Strategy::LeaseModular.code(), 3);
    }

    #[test]
    fn best_breaks_ties_toward_lower_code() {
        let profits = StrategyProfits {
            sell_integral: 0.2,
            lease_integral: 0.2,
            sell_modular: 0.1,
            lease_modular: 0.1,
        };
        assert_eq!(profits.best(), Strategy::SellIntegral);

        let profits = StrategyProfits {
            sell_integral: 0.1,
            lease_integral: 0.1,
            sell_modular: 0.3,
            lease_modular: 0.3,
        };
        assert_eq!(profits.best(), Strategy::SellModular);

        let profits = StrategyProfits {
            sell_integral: 0.0,
            lease_integral: 0.0,
            sell_modular: 0.0,
            lease_modular: 0.0,
        };
        assert_eq!(profits.best(), Strategy::SellIntegral);
    }

    #[test]
    fn best_picks_strict_maximum() {
        let profits = StrategyProfits {
            sell_integral: 0.1,
            lease_integral: 0.4,
            sell_modular: 0.2,
            lease_modular: 0.3,
        };
        assert_eq!(profits.best(), Strategy::LeaseIntegral);
        assert_eq!(profits.max(), 0.4);
    }

    #[test]
    fn lease_durability_applies_spillover_and_clamp() {
        let params = Params {
            d1: 0.9,
            d2: 0.4,
            gamma: 1.5,
            c: 0.1,
            k: 0.0,
        };
        let (d1l, d2l) = params.lease_durability();
        assert_eq!(d1l, MAX_LEASE_DURABILITY);
        assert!((d2l - 0.6).abs() < 1e-12);
    }

    #[test]
    fn feasibility_requires_weak_below_strong() {
        let mut params = Params {
            d1: 0.5,
            d2: 0.2,
            gamma: 1.0,
            c: 0.15,
            k: 0.0,
        };
        assert!(params.is_feasible());
        params.d2 = 0.5;
        assert!(!params.is_feasible());
    }
}
