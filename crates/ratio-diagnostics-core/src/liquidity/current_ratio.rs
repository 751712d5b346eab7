use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, BaseResult, Computation};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{Constraint, CrossCheck, InputSpec, MetricDefinition, MetricFamily, Precision};
use crate::engine::drivers::{DriverFormula, DriverTerm};
use crate::engine::parameters::{constants, MetricParameters, ParameterSet};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "current_ratio";

pub const SURPLUS: &str = "surplus";
pub const ADEQUATE: &str = "adequate";
pub const TIGHT: &str = "tight";

pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "Current Ratio",
        family: MetricFamily::Liquidity,
        methodology: "Current ratio = current assets / current liabilities",
        inputs: vec![
            InputSpec::required("current_assets", "Current assets", Constraint::NonNegative),
            InputSpec::required("current_liabilities", "Current liabilities", Constraint::Positive),
            InputSpec::optional("inventory", "Inventory within current assets", Constraint::NonNegative),
        ],
        dimensions: Vec::new(),
        precision: Precision::new(Unit::Multiple, 2),
        formula,
        cross_checks: vec![CrossCheck {
            fields: &["inventory", "current_assets"],
            reason: "inventory cannot exceed current assets",
            holds: inventory_within_assets,
        }],
        stress: None,
        tiers: vec![SURPLUS, ADEQUATE, TIGHT],
        rules: rules(),
        drivers: Some(DriverFormula::Additive { terms: drivers }),
        advisories: None,
    }
}

pub fn parameters() -> MetricParameters {
    MetricParameters::new(constants(&[("surplus_above", dec!(2.5)), ("adequate_from", dec!(1.5))]))
}

fn rules() -> RuleSet {
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![Operand::Base.gt(Operand::param("surplus_above"))],
                SURPLUS,
                "High ratio: funds may be sitting idle; consider putting surplus current assets to work.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.ge(Operand::param("adequate_from"))],
                ADEQUATE,
                "Ratio in the normal range: watch the mix of current assets, inventory turnover in particular.",
            ),
        ],
        Outcome::new(
            TIGHT,
            "Low ratio: make sure short-term cash flow covers maturing obligations.",
        ),
    )
}

fn inventory_within_assets(profile: &Profile) -> bool {
    profile
        .optional("inventory")
        .map_or(true, |inventory| inventory <= profile.amount("current_assets"))
}

fn formula(profile: &Profile, _params: &ParameterSet) -> Computation {
    let assets = profile.amount("current_assets");
    let liabilities = profile.amount("current_liabilities");

    let computation = Computation::new(divide(assets, liabilities));
    match profile.optional("inventory") {
        Some(inventory) => computation.figure(
            "inventory_portion",
            Unit::Multiple,
            2,
            divide(inventory, liabilities),
        ),
        None => computation,
    }
}

/// Quick assets take whatever the rounded inventory portion leaves, so the
/// two terms add up to the reported ratio.
fn drivers(base: &BaseResult, _params: &ParameterSet) -> Option<Vec<DriverTerm>> {
    let inventory = base.amount("inventory_portion")?;
    let ratio = base.value.finite()?;
    Some(vec![
        DriverTerm::new("Quick assets", ratio.checked_sub(inventory)?),
        DriverTerm::new("Inventory", inventory),
    ])
}
