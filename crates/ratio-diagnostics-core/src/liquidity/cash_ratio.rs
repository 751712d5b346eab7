use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, BaseResult, Computation};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{
    CategoryDimension, CategoryOption, Constraint, InputSpec, MetricDefinition, MetricFamily, Precision,
};
use crate::engine::parameters::{constants, DimensionParameters, MetricParameters, ParameterSet};
use crate::engine::scenario::{drawdown, StressScenario};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "cash_ratio_stress";

pub const SAFE: &str = "safe";
pub const WATCH: &str = "watch";
pub const DANGER: &str = "danger";
pub const CRISIS: &str = "crisis";

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Cash ratio with a survival-days check and a no-revenue stress window.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "Cash Ratio Stress Test",
        family: MetricFamily::Liquidity,
        methodology: "Cash ratio = cash and equivalents / current liabilities; survival days = cash / daily burn",
        inputs: vec![
            InputSpec::required("cash", "Cash and cash equivalents", Constraint::NonNegative),
            InputSpec::required("current_liabilities", "Current liabilities", Constraint::NonNegative),
            InputSpec::required("daily_cash_burn", "Average daily cash burn", Constraint::NonNegative),
        ],
        dimensions: vec![CategoryDimension {
            name: "industry",
            description: "Asset intensity, sets the minimum cash ratio and reserve days",
            options: vec![
                CategoryOption {
                    key: "heavy_asset",
                    label: "Heavy asset",
                    menu: "1",
                    aliases: &["重资产"],
                },
                CategoryOption {
                    key: "light_asset",
                    label: "Light asset",
                    menu: "2",
                    aliases: &["轻资产"],
                },
                CategoryOption {
                    key: "financial",
                    label: "Financial",
                    menu: "3",
                    aliases: &["金融"],
                },
                CategoryOption {
                    key: "services",
                    label: "Services",
                    menu: "4",
                    aliases: &["服务业"],
                },
            ],
            default_key: "heavy_asset",
        }],
        precision: Precision::new(Unit::Multiple, 2),
        formula,
        cross_checks: Vec::new(),
        stress: Some(StressScenario {
            label: "No revenue for the stress window",
            shock_param: "stress_days",
            transform: burn_through_window,
        }),
        tiers: vec![SAFE, WATCH, DANGER, CRISIS],
        rules: rules(),
        drivers: None,
        advisories: Some(advisories),
    }
}

pub fn parameters() -> MetricParameters {
    let floor = |ratio: Decimal, days: Decimal| constants(&[("min_cash_ratio", ratio), ("min_days", days)]);
    MetricParameters::new(constants(&[("stress_days", dec!(60))])).dimension(
        "industry",
        DimensionParameters::new(floor(dec!(0.5), dec!(90)))
            .category("heavy_asset", floor(dec!(0.5), dec!(90)))
            .category("light_asset", floor(dec!(0.3), dec!(60)))
            .category("financial", floor(dec!(0.8), dec!(120)))
            .category("services", floor(dec!(0.4), dec!(75))),
    )
}

fn rules() -> RuleSet {
    let min_ratio = || Operand::param("min_cash_ratio");
    let min_days = || Operand::param("min_days");
    let days = || Operand::figure("survival_days");
    let zero = || Operand::Const(Decimal::ZERO);
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![
                    Operand::Base.ge(min_ratio()).scaled(dec!(1.5)),
                    days().ge(min_days()).scaled(dec!(1.5)),
                ],
                SAFE,
                "Ample cash reserves with a wide safety margin even under extreme conditions.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.ge(min_ratio()), days().ge(min_days())],
                WATCH,
                "Cash is broadly healthy; monitor cash flow so reserves are not consumed too quickly.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.gt(zero()), days().gt(zero())],
                DANGER,
                "Cash is tight: speed up receivable collection or cut non-essential spending.",
            ),
        ],
        Outcome::new(
            CRISIS,
            "Risk of running out of cash: start financing or asset sales immediately.",
        ),
    )
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

fn formula(profile: &Profile, params: &ParameterSet) -> Computation {
    let cash = profile.amount("cash");
    let burn = profile.amount("daily_cash_burn");
    let needed = burn * params.value("stress_days");

    Computation::new(divide(cash, profile.amount("current_liabilities")))
        .figure("survival_days", Unit::Days, 1, divide(cash, burn))
        .amount("stress_cash_needed", Unit::Money, 1, needed)
        .amount("stress_shortfall", Unit::Money, 1, (needed - cash).max(Decimal::ZERO))
}

fn burn_through_window(profile: &Profile, days: Decimal, _params: &ParameterSet) -> Profile {
    let spent = profile.amount("daily_cash_burn") * days;
    profile.with_amount("cash", drawdown(profile.amount("cash"), spent))
}

fn advisories(_profile: &Profile, base: &BaseResult, params: &ParameterSet) -> Vec<String> {
    match base.amount("stress_shortfall") {
        Some(gap) if gap > Decimal::ZERO => vec![format!(
            "Stress test: {} days without revenue leaves a cash gap of {gap}.",
            params.value("stress_days")
        )],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::Ratio;
    use crate::{evaluate, DiagnosticResult, MetricRequest};

    fn run(cash: &str, liabilities: &str, burn: &str, industry: &str) -> (DiagnosticResult, Vec<String>) {
        let req = MetricRequest::new(KEY)
            .input("cash", cash)
            .input("current_liabilities", liabilities)
            .input("daily_cash_burn", burn)
            .category("industry", industry);
        let output = evaluate(&req).unwrap();
        (output.result, output.warnings)
    }

    #[test]
    fn test_heavy_asset_watch() {
        // ratio 0.5, 100 days: clears the floor but not 1.5x
        let (r, warnings) = run("500", "1000", "5", "重资产");
        assert_eq!(r.base.value, Ratio::Finite(dec!(0.5)));
        assert_eq!(r.base.amount("survival_days"), Some(dec!(100)));
        assert_eq!(r.classification.tier, WATCH);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_safe_needs_both_margins() {
        let (r, _) = run("800", "1000", "5", "1");
        // ratio 0.8 >= 0.75 and 160 days >= 135
        assert_eq!(r.classification.tier, SAFE);

        let (r, _) = run("800", "1000", "6.5", "1");
        // 123.1 days misses the 135 day margin
        assert_eq!(r.base.amount("survival_days"), Some(dec!(123.1)));
        assert_eq!(r.classification.tier, WATCH);
    }

    #[test]
    fn test_danger_and_shortfall_advisory() {
        let (r, warnings) = run("100", "1000", "5", "2");
        assert_eq!(r.classification.tier, DANGER);
        assert_eq!(r.base.amount("stress_cash_needed"), Some(dec!(300)));
        assert_eq!(r.base.amount("stress_shortfall"), Some(dec!(200)));
        assert!(warnings.iter().any(|w| w.contains("cash gap of 200")));
    }

    #[test]
    fn test_stress_drains_cash() {
        let (r, _) = run("500", "1000", "5", "1");
        let stress = r.stress.unwrap();
        assert_eq!(stress.shock, dec!(60));
        assert_eq!(stress.shocked_inputs["cash"], dec!(200));
        assert_eq!(stress.value, Ratio::Finite(dec!(0.2)));
    }

    #[test]
    fn test_stress_cash_floored_at_zero() {
        let (r, _) = run("100", "1000", "5", "1");
        let stress = r.stress.unwrap();
        assert_eq!(stress.shocked_inputs["cash"], Decimal::ZERO);
        assert_eq!(stress.value, Ratio::Finite(Decimal::ZERO));
    }

    #[test]
    fn test_zero_burn_saturates_survival_days() {
        let (r, _) = run("600", "1000", "0", "2");
        assert_eq!(r.base.figure("survival_days"), Some(Ratio::Saturated));
        assert_eq!(r.classification.tier, SAFE);
    }

    #[test]
    fn test_zero_liabilities_saturate_ratio() {
        let (output_result, warnings) = run("600", "0", "5", "2");
        assert!(output_result.base.is_saturated);
        assert!(warnings.iter().any(|w| w.contains("saturated")));
    }

    #[test]
    fn test_no_cash_is_crisis() {
        let (r, _) = run("0", "1000", "5", "1");
        assert_eq!(r.classification.tier, CRISIS);
    }

    #[test]
    fn test_unknown_industry_uses_heavy_asset_floor() {
        let (r, _) = run("500", "1000", "5", "mining");
        assert_eq!(r.parameters.category("industry"), Some("heavy_asset"));
        assert_eq!(r.parameters.value("min_days"), dec!(90));
        assert!(r.parameters.categories["industry"].defaulted);
    }
}
