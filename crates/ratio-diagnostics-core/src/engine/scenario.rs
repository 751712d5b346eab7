use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::calculator::{self, Ratio};
use super::definition::MetricDefinition;
use super::parameters::ParameterSet;
use super::validator::Profile;

/// Builds the shocked profile from the base profile and the shock magnitude.
pub type ShockTransform = fn(&Profile, Decimal, &ParameterSet) -> Profile;

/// A single deterministic downside scenario.
#[derive(Clone, Serialize)]
pub struct StressScenario {
    pub label: &'static str,
    /// Parameter key holding the shock magnitude.
    pub shock_param: &'static str,
    #[serde(skip)]
    pub transform: ShockTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub value: Ratio,
    pub is_saturated: bool,
    pub label: String,
    pub shock: Decimal,
    /// Inputs the shock changed, with their stressed values.
    pub shocked_inputs: BTreeMap<String, Decimal>,
}

/// Apply the metric's stress scenario, if it has one, and recompute the
/// ratio on the shocked profile with the same rounding and saturation rules.
pub fn apply(
    definition: &MetricDefinition,
    profile: &Profile,
    parameters: &ParameterSet,
) -> Option<StressResult> {
    let scenario = definition.stress.as_ref()?;
    let shock = parameters.value(scenario.shock_param);
    let shocked = (scenario.transform)(profile, shock, parameters);
    let stressed = calculator::compute(definition, &shocked, parameters);

    Some(StressResult {
        value: stressed.value,
        is_saturated: stressed.is_saturated,
        label: scenario.label.to_string(),
        shock,
        shocked_inputs: profile.changed_in(&shocked),
    })
}

/// Reduce `value` by `fraction`, floored at zero.
pub fn haircut(value: Decimal, fraction: Decimal) -> Decimal {
    (value * (Decimal::ONE - fraction)).max(Decimal::ZERO)
}

/// Subtract `amount`, floored at zero.
pub fn drawdown(value: Decimal, amount: Decimal) -> Decimal {
    (value - amount).max(Decimal::ZERO)
}
