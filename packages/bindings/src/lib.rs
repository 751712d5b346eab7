use napi::Result as NapiResult;
use napi_derive::napi;

use ratio_diagnostics_core::engine::parameters::ParameterTable;
use ratio_diagnostics_core::{Engine, MetricRequest};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate(request_json: String) -> NapiResult<String> {
    let request: MetricRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let output = ratio_diagnostics_core::evaluate(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Evaluate against the bundled constants overlaid with `parameters_json`.
#[napi]
pub fn evaluate_with_parameters(request_json: String, parameters_json: String) -> NapiResult<String> {
    let request: MetricRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let overrides: ParameterTable = serde_json::from_str(&parameters_json).map_err(to_napi_error)?;
    let engine = Engine::new(ParameterTable::bundled().with_overrides(overrides));
    let output = engine.evaluate(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[napi]
pub fn list_metrics() -> NapiResult<String> {
    let definitions = ratio_diagnostics_core::catalogue::definitions();
    serde_json::to_string(&definitions).map_err(to_napi_error)
}

#[napi]
pub fn default_parameters() -> NapiResult<String> {
    serde_json::to_string(&ParameterTable::bundled()).map_err(to_napi_error)
}
