use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, BaseResult, Computation, Ratio};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{
    CategoryDimension, CategoryOption, Constraint, InputSpec, MetricDefinition, MetricFamily, Precision,
};
use crate::engine::drivers::{DriverFormula, DriverTerm};
use crate::engine::parameters::{constants, DimensionParameters, MetricParameters, ParameterSet};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "eva";

pub const VALUE_CREATOR_GROWTH: &str = "value_creator_growth";
pub const VALUE_CREATOR_STABLE: &str = "value_creator_stable";
pub const BREAKEVEN: &str = "breakeven";
pub const VALUE_DESTROYER: &str = "value_destroyer";

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Economic Value Added: NOPAT less a capital charge at a WACC that depends
/// on the company's ownership type. The base ratio is the EVA yield on
/// capital employed, in percent.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "Economic Value Added",
        family: MetricFamily::Profitability,
        methodology: "EVA = NOPAT - capital employed x WACC; EVA yield = EVA / capital employed",
        inputs: vec![
            InputSpec::required("nopat", "NOPAT", Constraint::Positive),
            InputSpec::required("capital_employed", "Capital employed", Constraint::Positive),
            InputSpec::optional("eva_last_year", "Prior-year EVA", Constraint::Unbounded),
        ],
        dimensions: vec![CategoryDimension {
            name: "company_type",
            description: "Ownership type, drives the financing cost",
            options: vec![
                CategoryOption {
                    key: "state_owned",
                    label: "State-owned",
                    menu: "1",
                    aliases: &["国企", "soe"],
                },
                CategoryOption {
                    key: "private",
                    label: "Private",
                    menu: "2",
                    aliases: &["民企"],
                },
                CategoryOption {
                    key: "foreign",
                    label: "Foreign-invested",
                    menu: "3",
                    aliases: &["外企"],
                },
            ],
            default_key: "unspecified",
        }],
        precision: Precision::new(Unit::Percent, 2),
        formula,
        cross_checks: Vec::new(),
        stress: None,
        tiers: vec![VALUE_CREATOR_GROWTH, VALUE_CREATOR_STABLE, BREAKEVEN, VALUE_DESTROYER],
        rules: rules(),
        drivers: Some(DriverFormula::Additive { terms: drivers }),
        advisories: Some(advisories),
    }
}

/// WACC in percent per ownership type; 6.5% when the type is unknown.
pub fn parameters() -> MetricParameters {
    MetricParameters::new(constants(&[("growth_threshold", dec!(0.10))])).dimension(
        "company_type",
        DimensionParameters::new(constants(&[("wacc_pct", dec!(6.5))]))
            .category("state_owned", constants(&[("wacc_pct", dec!(5.5))]))
            .category("private", constants(&[("wacc_pct", dec!(7.5))]))
            .category("foreign", constants(&[("wacc_pct", dec!(6.5))])),
    )
}

fn rules() -> RuleSet {
    let zero = || Operand::Const(Decimal::ZERO);
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![
                    Operand::figure("eva").gt(zero()),
                    Operand::figure("eva_growth").gt(Operand::param("growth_threshold")),
                ],
                VALUE_CREATOR_GROWTH,
                "Positive EVA growing by more than 10%: the business earns well above its cost of capital and can keep expanding investment.",
            ),
            ThresholdRule::new(
                vec![Operand::figure("eva").gt(zero())],
                VALUE_CREATOR_STABLE,
                "Positive EVA with growth of 10% or less: value creation is steady; optimise the capital structure to lower WACC.",
            ),
            ThresholdRule::new(
                vec![Operand::figure("eva").equals(zero())],
                BREAKEVEN,
                "EVA is zero: returns just cover the cost of capital and create no excess value; improve operating efficiency.",
            ),
        ],
        Outcome::new(
            VALUE_DESTROYER,
            "Negative EVA: the cost of capital exceeds returns; divest low-return assets or fix operations urgently.",
        ),
    )
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

fn formula(profile: &Profile, params: &ParameterSet) -> Computation {
    let nopat = profile.amount("nopat");
    let capital = profile.amount("capital_employed");
    let wacc_pct = params.value("wacc_pct");

    let capital_charge = capital * wacc_pct / HUNDRED;
    let eva = nopat - capital_charge;

    let computation = Computation::new(divide(eva, capital).scaled(HUNDRED))
        .amount("eva", Unit::Money, 2, eva)
        .amount("capital_charge", Unit::Money, 2, capital_charge)
        .amount("wacc_pct", Unit::Percent, 2, wacc_pct)
        .figure("nopat_yield_pct", Unit::Percent, 2, divide(nopat, capital).scaled(HUNDRED));

    match growth(eva, profile.optional("eva_last_year")) {
        Some(g) => computation.figure("eva_growth", Unit::Rate, 4, g),
        None => computation,
    }
}

/// Year-over-year EVA growth against the signed prior year. Only defined
/// against a nonzero prior year.
fn growth(eva: Decimal, prior: Option<Decimal>) -> Option<Ratio> {
    let prior = prior.filter(|p| !p.is_zero())?;
    Some(divide(eva - prior, prior))
}

fn drivers(base: &BaseResult, _params: &ParameterSet) -> Option<Vec<DriverTerm>> {
    Some(vec![
        DriverTerm::new("NOPAT yield", base.amount("nopat_yield_pct")?),
        DriverTerm::new("WACC", -base.amount("wacc_pct")?),
    ])
}

fn advisories(profile: &Profile, _base: &BaseResult, _params: &ParameterSet) -> Vec<String> {
    match profile.optional("eva_last_year") {
        Some(prior) if prior < Decimal::ZERO => vec![format!(
            "Prior-year EVA is negative ({prior}); the growth rate is taken against the signed prior year, so an improvement reads as negative growth."
        )],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
