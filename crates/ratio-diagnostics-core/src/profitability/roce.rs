use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, BaseResult, Computation};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{
    CategoryDimension, CategoryOption, Constraint, CrossCheck, InputSpec, MetricDefinition, MetricFamily,
    Precision,
};
use crate::engine::drivers::{DriverFormula, DriverTerm};
use crate::engine::parameters::{constants, DimensionParameters, MetricParameters, ParameterSet};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "roce";

pub const EXCELLENT: &str = "excellent";
pub const GOOD: &str = "good";
pub const WATCH: &str = "watch";
pub const POOR: &str = "poor";

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Return on Capital Employed against an industry benchmark.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "Return on Capital Employed",
        family: MetricFamily::Profitability,
        methodology: "ROCE = operating profit / capital employed, compared with the industry benchmark",
        inputs: vec![
            InputSpec::required("operating_profit", "Operating profit (EBIT)", Constraint::Positive),
            InputSpec::required("capital_employed", "Capital employed", Constraint::Positive),
            InputSpec::optional("equity", "Shareholders' equity", Constraint::NonNegative),
            InputSpec::optional("non_current_liabilities", "Non-current liabilities", Constraint::NonNegative),
        ],
        dimensions: vec![CategoryDimension {
            name: "industry",
            description: "Industry, sets the ROCE benchmark",
            options: vec![
                option("technology", "Technology", "1", &["科技"]),
                option("manufacturing", "Manufacturing", "2", &["制造业"]),
                option("retail", "Retail", "3", &["零售"]),
                option("financials", "Financials", "4", &["金融"]),
                option("energy", "Energy", "5", &["能源"]),
            ],
            default_key: "general",
        }],
        precision: Precision::new(Unit::Percent, 2),
        formula,
        cross_checks: vec![CrossCheck {
            fields: &["capital_employed", "operating_profit"],
            reason: "capital employed cannot be smaller than operating profit",
            holds: capital_covers_profit,
        }],
        stress: None,
        tiers: vec![EXCELLENT, GOOD, WATCH, POOR],
        rules: rules(),
        drivers: Some(DriverFormula::Additive { terms: drivers }),
        advisories: Some(advisories),
    }
}

fn option(
    key: &'static str,
    label: &'static str,
    menu: &'static str,
    aliases: &'static [&'static str],
) -> CategoryOption {
    CategoryOption {
        key,
        label,
        menu,
        aliases,
    }
}

pub fn parameters() -> MetricParameters {
    let bm = |v: Decimal| constants(&[("benchmark_pct", v)]);
    MetricParameters::new(constants(&[("structure_tolerance", dec!(0.10))])).dimension(
        "industry",
        DimensionParameters::new(bm(dec!(15)))
            .category("technology", bm(dec!(20)))
            .category("manufacturing", bm(dec!(15)))
            .category("retail", bm(dec!(18)))
            .category("financials", bm(dec!(12)))
            .category("energy", bm(dec!(10))),
    )
}

fn rules() -> RuleSet {
    let benchmark = || Operand::param("benchmark_pct");
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![Operand::Base.gt(benchmark()).scaled(dec!(1.2))],
                EXCELLENT,
                "ROCE is more than 20% above the industry benchmark: capital is used very efficiently.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.ge(benchmark())],
                GOOD,
                "ROCE meets the industry benchmark: keep the current capital allocation.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.gt(benchmark()).scaled(dec!(0.8))],
                WATCH,
                "ROCE is slightly below the benchmark: review project returns and idle assets.",
            ),
        ],
        Outcome::new(
            POOR,
            "ROCE is well below the benchmark: capital efficiency is weak; restructure or dispose of low-return assets.",
        ),
    )
}

fn capital_covers_profit(profile: &Profile) -> bool {
    profile.amount("capital_employed") >= profile.amount("operating_profit")
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

fn formula(profile: &Profile, params: &ParameterSet) -> Computation {
    let capital = profile.amount("capital_employed");
    let roce = divide(profile.amount("operating_profit"), capital).scaled(HUNDRED);
    let benchmark = params.value("benchmark_pct");

    let mut computation = Computation::new(roce).amount("benchmark_pct", Unit::Percent, 2, benchmark);
    if let Some(spread) = roce.finite().and_then(|r| r.checked_sub(benchmark)) {
        computation = computation.amount("spread_pp", Unit::Percent, 2, spread);
    }

    // A zero structure means the breakdown was not provided.
    let structure = profile.optional("equity").unwrap_or_default()
        + profile.optional("non_current_liabilities").unwrap_or_default();
    if structure > Decimal::ZERO {
        computation = computation.figure(
            "structure_gap_pct",
            Unit::Percent,
            2,
            divide(structure - capital, capital).scaled(HUNDRED),
        );
    }
    computation
}

fn drivers(base: &BaseResult, _params: &ParameterSet) -> Option<Vec<DriverTerm>> {
    Some(vec![
        DriverTerm::new("Industry benchmark", base.amount("benchmark_pct")?),
        DriverTerm::new("Spread over benchmark", base.amount("spread_pp")?),
    ])
}

/// Equity plus non-current liabilities should approximate capital employed.
fn advisories(_profile: &Profile, base: &BaseResult, params: &ParameterSet) -> Vec<String> {
    let Some(gap) = base.amount("structure_gap_pct") else {
        return Vec::new();
    };
    let tolerance = params.value("structure_tolerance") * HUNDRED;
    if gap.abs() > tolerance {
        vec![format!(
            "Equity plus non-current liabilities differs from capital employed by {gap}%; check the capital structure inputs."
        )]
    } else {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::Ratio;
    use crate::{evaluate, DiagnosticsError, MetricRequest};

    fn request(profit: i64, capital: i64, industry: &str) -> MetricRequest {
        MetricRequest::new(KEY)
            .input("operating_profit", profit)
            .input("capital_employed", capital)
            .category("industry", industry)
    }

    fn tier(req: MetricRequest) -> String {
        evaluate(&req).unwrap().result.classification.tier
    }

    #[test]
    fn test_manufacturing_boundary_case() {
        let r = evaluate(&request(5000, 30000, "manufacturing")).unwrap().result;
        assert_eq!(r.base.value, Ratio::Finite(dec!(16.67)));
        assert_eq!(r.base.amount("spread_pp"), Some(dec!(1.67)));
        assert_eq!(r.classification.tier, GOOD);
    }

    #[test]
    fn test_tier_boundaries_against_technology_benchmark() {
        // benchmark 20: excellent above 24, watch above 16
        assert_eq!(tier(request(2401, 10000, "technology")), EXCELLENT);
        assert_eq!(tier(request(2400, 10000, "technology")), GOOD);
        assert_eq!(tier(request(2000, 10000, "technology")), GOOD);
        assert_eq!(tier(request(1601, 10000, "technology")), WATCH);
        assert_eq!(tier(request(1600, 10000, "technology")), POOR);
    }

    #[test]
    fn test_alias_and_default_benchmark() {
        let r = evaluate(&request(1000, 10000, "能源")).unwrap().result;
        assert_eq!(r.parameters.value("benchmark_pct"), dec!(10));
        assert_eq!(r.classification.tier, GOOD);

        let output = evaluate(&request(1000, 10000, "shipping")).unwrap();
        assert_eq!(output.result.parameters.category("industry"), Some("general"));
        assert_eq!(output.result.parameters.value("benchmark_pct"), dec!(15));
        assert!(output.result.parameters.categories["industry"].defaulted);
    }

    #[test]
    fn test_profit_above_capital_rejected() {
        match evaluate(&request(40000, 30000, "2")).unwrap_err() {
            DiagnosticsError::CrossFieldCheck { fields, .. } => {
                assert!(fields.contains("capital_employed"));
            }
            other => panic!("Expected CrossFieldCheck, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_capital_rejected() {
        let err = evaluate(&request(5000, 0, "2")).unwrap_err();
        assert_eq!(err.field(), Some("capital_employed"));
    }

    #[test]
    fn test_structure_gap_advisory() {
        let consistent = request(5000, 30000, "2")
            .input("equity", 20000)
            .input("non_current_liabilities", 11000);
        let output = evaluate(&consistent).unwrap();
        assert_eq!(output.result.base.amount("structure_gap_pct"), Some(dec!(3.33)));
        assert!(output.warnings.iter().all(|w| !w.contains("capital structure")));

        let inconsistent = request(5000, 30000, "2").input("equity", 20000);
        let output = evaluate(&inconsistent).unwrap();
        assert_eq!(output.result.base.amount("structure_gap_pct"), Some(dec!(-33.33)));
        assert!(output.warnings.iter().any(|w| w.contains("capital structure")));
    }

    #[test]
    fn test_no_structure_gap_without_inputs() {
        let r = evaluate(&request(5000, 30000, "2")).unwrap().result;
        assert_eq!(r.base.figure("structure_gap_pct"), None);
    }

    #[test]
    fn test_zero_structure_treated_as_absent() {
        let req = request(5000, 30000, "2")
            .input("equity", 0)
            .input("non_current_liabilities", 0);
        let output = evaluate(&req).unwrap();
        assert_eq!(output.result.base.figure("structure_gap_pct"), None);
        assert!(output.warnings.iter().all(|w| !w.contains("capital structure")));
    }
}
