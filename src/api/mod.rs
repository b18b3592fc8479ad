use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    JointCase, Params, StrategyProfits, evaluate_point, sweep_architecture_choice,
    sweep_business_model, sweep_endogenous_durability, sweep_integration_cost,
    sweep_joint_choice, sweep_switching,
};

const DEFAULT_SWITCHING_GAMMAS: [f64; 2] = [0.8, 1.2];
const DEFAULT_INTEGRATION_COSTS: [f64; 3] = [0.0, 0.02, 0.05];

#[derive(Parser, Debug)]
#[command(
    name = "recirc",
    about = "Circular-economy strategy comparison: sell/lease x integral/modular profit model"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 0.5,
        help = "Strong-component durability, strictly between 0 and 1"
    )]
    d1: f64,
    #[arg(
        long,
        default_value_t = 0.2,
        help = "Weak-component durability, must stay below --d1"
    )]
    d2: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Leasing durability spillover, between 0.5 and 1.5"
    )]
    gamma: f64,
    #[arg(
        long,
        default_value_t = 0.15,
        help = "Per-unit production cost, positive and at most 0.35"
    )]
    c: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Extra modular-integration unit cost, between 0 and 0.05"
    )]
    k: f64,
    #[arg(long, default_value_t = 31, help = "Points per swept axis")]
    resolution: usize,
    #[arg(
        long,
        default_value_t = 0.15,
        help = "Upper bound of the swept cost axis in the business-model sweep"
    )]
    c_max: f64,
    #[arg(
        long,
        default_value_t = 1.3,
        help = "Upper bound of the swept spillover axis in the business-model sweep"
    )]
    gamma_max: f64,
    #[arg(
        long,
        default_value_t = 0.01,
        help = "Lowest base unit cost in the endogenous-durability sweep"
    )]
    c0_min: f64,
    #[arg(
        long,
        default_value_t = 0.15,
        help = "Highest base unit cost in the endogenous-durability sweep"
    )]
    c0_max: f64,
    #[arg(
        long,
        default_value_t = 10,
        help = "Base-cost steps in the endogenous-durability sweep"
    )]
    c0_steps: usize,
}

fn default_cli_for_api() -> Cli {
    Cli {
        d1: 0.5,
        d2: 0.2,
        gamma: 1.0,
        c: 0.15,
        k: 0.0,
        resolution: 31,
        c_max: 0.15,
        gamma_max: 1.3,
        c0_min: 0.01,
        c0_max: 0.15,
        c0_steps: 10,
    }
}

fn default_joint_cases() -> Vec<JointCase> {
    vec![
        JointCase {
            d1: 0.5,
            d2: 0.2,
            label: "low durability".to_string(),
        },
        JointCase {
            d1: 0.9,
            d2: 0.6,
            label: "high durability".to_string(),
        },
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EvaluatePayload {
    d1: Option<f64>,
    d2: Option<f64>,
    gamma: Option<f64>,
    c: Option<f64>,
    k: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ArchitecturePayload {
    gamma: Option<f64>,
    c: Option<f64>,
    k: Option<f64>,
    resolution: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SwitchingPayload {
    c: Option<f64>,
    resolution: Option<usize>,
    gammas: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BusinessModelPayload {
    d1: Option<f64>,
    d2: Option<f64>,
    resolution: Option<usize>,
    c_max: Option<f64>,
    gamma_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JointCasePayload {
    d1: f64,
    d2: f64,
    label: String,
}

impl From<JointCasePayload> for JointCase {
    fn from(value: JointCasePayload) -> Self {
        JointCase {
            d1: value.d1,
            d2: value.d2,
            label: value.label,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JointChoicePayload {
    resolution: Option<usize>,
    cases: Option<Vec<JointCasePayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IntegrationCostPayload {
    d1: Option<f64>,
    d2: Option<f64>,
    resolution: Option<usize>,
    k_values: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EndogenousPayload {
    c0_min: Option<f64>,
    c0_max: Option<f64>,
    steps: Option<usize>,
    gammas: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateResponse {
    d1: f64,
    d2: f64,
    gamma: f64,
    c: f64,
    k: f64,
    profits: StrategyProfits,
    best_strategy: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/evaluate",
            get(evaluate_get_handler).post(evaluate_post_handler),
        )
        .route(
            "/api/sweep/architecture",
            get(architecture_get_handler).post(architecture_post_handler),
        )
        .route(
            "/api/sweep/switching",
            get(switching_get_handler).post(switching_post_handler),
        )
        .route(
            "/api/sweep/business-model",
            get(business_model_get_handler).post(business_model_post_handler),
        )
        .route(
            "/api/sweep/joint-choice",
            get(joint_choice_get_handler).post(joint_choice_post_handler),
        )
        .route(
            "/api/sweep/integration-cost",
            get(integration_cost_get_handler).post(integration_cost_post_handler),
        )
        .route(
            "/api/sweep/endogenous-durability",
            get(endogenous_get_handler).post(endogenous_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("recirc HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/evaluate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn evaluate_get_handler(Query(payload): Query<EvaluatePayload>) -> Response {
    evaluate_handler_impl(payload)
}

async fn evaluate_post_handler(Json(payload): Json<EvaluatePayload>) -> Response {
    evaluate_handler_impl(payload)
}

fn evaluate_handler_impl(payload: EvaluatePayload) -> Response {
    let params = match point_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let profits = evaluate_point(&params);
    json_response(
        StatusCode::OK,
        EvaluateResponse {
            d1: params.d1,
            d2: params.d2,
            gamma: params.gamma,
            c: params.c,
            k: params.k,
            profits,
            best_strategy: profits.best().label(),
        },
    )
}

async fn architecture_get_handler(Query(payload): Query<ArchitecturePayload>) -> Response {
    architecture_handler_impl(payload)
}

async fn architecture_post_handler(Json(payload): Json<ArchitecturePayload>) -> Response {
    architecture_handler_impl(payload)
}

fn architecture_handler_impl(payload: ArchitecturePayload) -> Response {
    let defaults = default_cli_for_api();
    let gamma = payload.gamma.unwrap_or(defaults.gamma);
    let c = payload.c.unwrap_or(defaults.c);
    let k = payload.k.unwrap_or(defaults.k);
    let resolution = payload.resolution.unwrap_or(defaults.resolution);

    if let Err(msg) = validate_spillover("--gamma", gamma)
        .and_then(|()| validate_unit_cost("--c", c))
        .and_then(|()| validate_integration_cost("--k", k))
    {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }

    match sweep_architecture_choice(gamma, c, k, resolution) {
        Ok(grid) => json_response(StatusCode::OK, grid),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn switching_get_handler(Query(payload): Query<SwitchingPayload>) -> Response {
    switching_handler_impl(payload)
}

async fn switching_post_handler(Json(payload): Json<SwitchingPayload>) -> Response {
    switching_handler_impl(payload)
}

fn switching_handler_impl(payload: SwitchingPayload) -> Response {
    let defaults = default_cli_for_api();
    let c = payload.c.unwrap_or(defaults.c);
    let resolution = payload.resolution.unwrap_or(defaults.resolution);
    let gammas = payload
        .gammas
        .unwrap_or_else(|| DEFAULT_SWITCHING_GAMMAS.to_vec());

    if let Err(msg) = validate_unit_cost("--c", c) {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }
    for &gamma in &gammas {
        if let Err(msg) = validate_spillover("gammas", gamma) {
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    }

    match sweep_switching(c, resolution, &gammas) {
        Ok(grid) => json_response(StatusCode::OK, grid),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn business_model_get_handler(Query(payload): Query<BusinessModelPayload>) -> Response {
    business_model_handler_impl(payload)
}

async fn business_model_post_handler(Json(payload): Json<BusinessModelPayload>) -> Response {
    business_model_handler_impl(payload)
}

fn business_model_handler_impl(payload: BusinessModelPayload) -> Response {
    let defaults = default_cli_for_api();
    let d1 = payload.d1.unwrap_or(defaults.d1);
    let d2 = payload.d2.unwrap_or(defaults.d2);
    let resolution = payload.resolution.unwrap_or(defaults.resolution);
    let c_max = payload.c_max.unwrap_or(defaults.c_max);
    let gamma_max = payload.gamma_max.unwrap_or(defaults.gamma_max);

    // d2 >= d1 is not rejected here: the builder emits fully masked matrices
    // for it, matching the per-cell sentinel policy of the other sweeps.
    if let Err(msg) = validate_durability("--d1", d1)
        .and_then(|()| validate_durability("--d2", d2))
        .and_then(|()| validate_unit_cost("--c-max", c_max))
        .and_then(|()| validate_spillover("--gamma-max", gamma_max))
    {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }

    match sweep_business_model(d1, d2, resolution, c_max, gamma_max) {
        Ok(grid) => json_response(StatusCode::OK, grid),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn joint_choice_get_handler(Query(payload): Query<JointChoicePayload>) -> Response {
    joint_choice_handler_impl(payload)
}

async fn joint_choice_post_handler(Json(payload): Json<JointChoicePayload>) -> Response {
    joint_choice_handler_impl(payload)
}

fn joint_choice_handler_impl(payload: JointChoicePayload) -> Response {
    let defaults = default_cli_for_api();
    let resolution = payload.resolution.unwrap_or(defaults.resolution);
    let cases: Vec<JointCase> = match payload.cases {
        Some(cases) => cases.into_iter().map(JointCase::from).collect(),
        None => default_joint_cases(),
    };

    for case in &cases {
        if let Err(msg) = validate_durability("case d1", case.d1)
            .and_then(|()| validate_durability("case d2", case.d2))
        {
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    }

    match sweep_joint_choice(resolution, &cases) {
        Ok(grid) => json_response(StatusCode::OK, grid),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn integration_cost_get_handler(Query(payload): Query<IntegrationCostPayload>) -> Response {
    integration_cost_handler_impl(payload)
}

async fn integration_cost_post_handler(Json(payload): Json<IntegrationCostPayload>) -> Response {
    integration_cost_handler_impl(payload)
}

fn integration_cost_handler_impl(payload: IntegrationCostPayload) -> Response {
    let defaults = default_cli_for_api();
    let d1 = payload.d1.unwrap_or(defaults.d1);
    let d2 = payload.d2.unwrap_or(defaults.d2);
    let resolution = payload.resolution.unwrap_or(defaults.resolution);
    let k_values = payload
        .k_values
        .unwrap_or_else(|| DEFAULT_INTEGRATION_COSTS.to_vec());

    if let Err(msg) =
        validate_durability("--d1", d1).and_then(|()| validate_durability("--d2", d2))
    {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }
    for &k in &k_values {
        if let Err(msg) = validate_integration_cost("kValues", k) {
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    }

    match sweep_integration_cost(d1, d2, resolution, &k_values) {
        Ok(grid) => json_response(StatusCode::OK, grid),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn endogenous_get_handler(Query(payload): Query<EndogenousPayload>) -> Response {
    endogenous_handler_impl(payload)
}

async fn endogenous_post_handler(Json(payload): Json<EndogenousPayload>) -> Response {
    endogenous_handler_impl(payload)
}

fn endogenous_handler_impl(payload: EndogenousPayload) -> Response {
    let defaults = default_cli_for_api();
    let c0_min = payload.c0_min.unwrap_or(defaults.c0_min);
    let c0_max = payload.c0_max.unwrap_or(defaults.c0_max);
    let steps = payload.steps.unwrap_or(defaults.c0_steps);
    let gammas = payload
        .gammas
        .unwrap_or_else(|| DEFAULT_SWITCHING_GAMMAS.to_vec());

    if let Err(msg) = validate_unit_cost("--c0-min", c0_min)
        .and_then(|()| validate_unit_cost("--c0-max", c0_max))
    {
        return error_response(StatusCode::BAD_REQUEST, &msg);
    }
    for &gamma in &gammas {
        if let Err(msg) = validate_spillover("gammas", gamma) {
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    }

    match sweep_endogenous_durability(c0_min, c0_max, steps, &gammas) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn point_from_payload(payload: EvaluatePayload) -> Result<Params, String> {
    let mut cli = default_cli_for_api();
    if let Some(v) = payload.d1 {
        cli.d1 = v;
    }
    if let Some(v) = payload.d2 {
        cli.d2 = v;
    }
    if let Some(v) = payload.gamma {
        cli.gamma = v;
    }
    if let Some(v) = payload.c {
        cli.c = v;
    }
    if let Some(v) = payload.k {
        cli.k = v;
    }
    build_point(&cli)
}

fn build_point(cli: &Cli) -> Result<Params, String> {
    validate_durability("--d1", cli.d1)?;
    validate_durability("--d2", cli.d2)?;
    validate_spillover("--gamma", cli.gamma)?;
    validate_unit_cost("--c", cli.c)?;
    validate_integration_cost("--k", cli.k)?;

    let params = Params {
        d1: cli.d1,
        d2: cli.d2,
        gamma: cli.gamma,
        c: cli.c,
        k: cli.k,
    };
    if !params.is_feasible() {
        return Err("--d2 must stay below --d1".to_string());
    }
    Ok(params)
}

fn validate_durability(flag: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(format!("{flag} must be strictly between 0 and 1"));
    }
    Ok(())
}

fn validate_spillover(flag: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.5..=1.5).contains(&value) {
        return Err(format!("{flag} must be between 0.5 and 1.5"));
    }
    Ok(())
}

fn validate_unit_cost(flag: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 || value > 0.35 {
        return Err(format!("{flag} must be positive and at most 0.35"));
    }
    Ok(())
}

fn validate_integration_cost(flag: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=0.05).contains(&value) {
        return Err(format!("{flag} must be between 0 and 0.05"));
    }
    Ok(())
}

#[cfg(test)]
fn point_from_json(json: &str) -> Result<Params, String> {
    let payload = serde_json::from_str::<EvaluatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    point_from_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn point_from_payload_uses_documented_defaults() {
        let params = point_from_payload(EvaluatePayload::default()).expect("valid defaults");
        assert_approx(params.d1, 0.5);
        assert_approx(params.d2, 0.2);
        assert_approx(params.gamma, 1.0);
        assert_approx(params.c, 0.15);
        assert_approx(params.k, 0.0);
    }

    #[test]
    fn point_from_json_parses_web_keys() {
        let params = point_from_json(
            r#"{"d1": 0.6, "d2": 0.3, "gamma": 1.2, "c": 0.12, "k": 0.01}"#,
        )
        .expect("json should parse");
        assert_approx(params.d1, 0.6);
        assert_approx(params.d2, 0.3);
        assert_approx(params.gamma, 1.2);
        assert_approx(params.c, 0.12);
        assert_approx(params.k, 0.01);
    }

    #[test]
    fn build_point_rejects_d2_at_or_above_d1() {
        let mut cli = default_cli_for_api();
        cli.d2 = cli.d1;
        let err = build_point(&cli).expect_err("must reject equal durabilities");
        assert!(err.contains("--d2"));
    }

    #[test]
    fn build_point_rejects_out_of_domain_scalars() {
        let mut cli = default_cli_for_api();
        cli.gamma = 2.0;
        assert!(build_point(&cli).expect_err("bad gamma").contains("--gamma"));

        let mut cli = default_cli_for_api();
        cli.c = 0.0;
        assert!(build_point(&cli).expect_err("bad cost").contains("--c"));

        let mut cli = default_cli_for_api();
        cli.c = 0.5;
        assert!(build_point(&cli).expect_err("bad cost").contains("--c"));

        let mut cli = default_cli_for_api();
        cli.k = 0.2;
        assert!(build_point(&cli).expect_err("bad k").contains("--k"));

        let mut cli = default_cli_for_api();
        cli.d1 = f64::NAN;
        assert!(build_point(&cli).expect_err("bad d1").contains("--d1"));
    }

    #[test]
    fn evaluate_response_serializes_expected_fields() {
        let params = point_from_payload(EvaluatePayload::default()).expect("valid defaults");
        let profits = evaluate_point(&params);
        let response = EvaluateResponse {
            d1: params.d1,
            d2: params.d2,
            gamma: params.gamma,
            c: params.c,
            k: params.k,
            profits,
            best_strategy: profits.best().label(),
        };
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"profits\""));
        assert!(json.contains("\"sellIntegral\""));
        assert!(json.contains("\"leaseModular\""));
        assert!(json.contains("\"bestStrategy\""));
    }

    #[test]
    fn architecture_grid_serializes_sentinel_cells_as_null() {
        let grid = sweep_architecture_choice(1.0, 0.15, 0.0, 3).expect("valid sweep");
        let value = serde_json::to_value(&grid).expect("grid should serialize");
        // Diagonal cell (d2 == d1) must be the JSON null sentinel.
        assert!(value["sellMatrix"][0][0].is_null());
        assert!(value["axisD1"].is_array());
        assert!(value["leaseMatrix"].is_array());
    }

    #[test]
    fn switching_defaults_cover_both_reference_gammas() {
        let response = switching_handler_impl(SwitchingPayload {
            c: Some(0.1),
            resolution: Some(5),
            gammas: None,
        });
        assert_eq!(response.status(), StatusCode::OK);

        let grid = sweep_switching(0.1, 5, &DEFAULT_SWITCHING_GAMMAS).expect("valid sweep");
        assert_eq!(grid.per_gamma.len(), 2);
        assert_approx(grid.per_gamma[0].gamma, 0.8);
        assert_approx(grid.per_gamma[1].gamma, 1.2);
    }

    #[test]
    fn joint_choice_defaults_produce_labeled_layers() {
        let grid = sweep_joint_choice(4, &default_joint_cases()).expect("valid sweep");
        assert_eq!(grid.per_case.len(), 2);
        assert_eq!(grid.per_case[0].label, "low durability");
        assert_eq!(grid.per_case[1].label, "high durability");
    }

    #[test]
    fn handlers_reject_invalid_parameters() {
        let response = architecture_handler_impl(ArchitecturePayload {
            gamma: Some(3.0),
            c: None,
            k: None,
            resolution: None,
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = switching_handler_impl(SwitchingPayload {
            c: Some(0.1),
            resolution: Some(1),
            gammas: None,
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = endogenous_handler_impl(EndogenousPayload {
            c0_min: Some(0.2),
            c0_max: Some(0.1),
            steps: None,
            gammas: None,
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = integration_cost_handler_impl(IntegrationCostPayload {
            d1: None,
            d2: None,
            resolution: None,
            k_values: Some(vec![0.3]),
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
