mod engine;
mod solver;
mod sweep;
mod types;

pub use engine::{
    evaluate_point, profit_lease_integral, profit_lease_modular, profit_sell_integral,
    profit_sell_modular,
};
pub use solver::sweep_endogenous_durability;
pub use sweep::{
    sweep_architecture_choice, sweep_business_model, sweep_integration_cost, sweep_joint_choice,
    sweep_switching,
};
pub use types::{
    ArchitectureChoiceGrid, BusinessModelGrid, EndogenousDurabilityResult, EndogenousPath,
    IntegrationCostGrid, IntegrationCostLayer, JointCase, JointChoiceGrid, JointChoiceLayer,
    Params, Strategy, StrategyProfits, SwitchingGrid, SwitchingLayer,
};
