use clap::Args;
use serde_json::{json, Value};

use ratio_diagnostics_core::engine::definition::MetricDefinition;
use ratio_diagnostics_core::Engine;

/// Arguments for the metric catalogue
#[derive(Args)]
pub struct MetricsArgs {
    /// Describe one metric in full (inputs, categories, rules)
    pub metric: Option<String>,
}

/// Arguments for the parameter table dump
#[derive(Args)]
pub struct ParametersArgs {
    /// Limit output to one metric
    pub metric: Option<String>,
}

pub fn run_metrics(engine: &Engine, args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref key) = args.metric {
        let definition = engine.definition(key)?;
        return Ok(serde_json::to_value(definition)?);
    }
    Ok(Value::Array(engine.definitions().iter().map(summary).collect()))
}

pub fn run_parameters(engine: &Engine, args: ParametersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let Some(ref key) = args.metric else {
        return Ok(serde_json::to_value(engine.parameters())?);
    };
    let definition = engine.definition(key)?;
    let parameters = engine
        .parameters()
        .metric(definition.key)
        .ok_or_else(|| format!("no parameters configured for {}", definition.key))?;
    Ok(serde_json::to_value(parameters)?)
}

/// One catalogue row per metric.
fn summary(definition: &MetricDefinition) -> Value {
    let inputs: Vec<String> = definition
        .inputs
        .iter()
        .map(|i| if i.required { i.name.to_string() } else { format!("[{}]", i.name) })
        .collect();
    let dimensions: Vec<&str> = definition.dimensions.iter().map(|d| d.name).collect();

    json!({
        "key": definition.key,
        "title": definition.title,
        "family": definition.family,
        "unit": definition.precision.unit,
        "inputs": inputs.join(" "),
        "categories": dimensions.join(" "),
        "stress": definition.stress.is_some(),
        "tiers": definition.tiers.join(" > "),
    })
}
