use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, BaseResult, Computation};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{
    CategoryDimension, CategoryOption, Constraint, InputSpec, MetricDefinition, MetricFamily, Precision,
};
use crate::engine::drivers::{DriverFormula, DriverTerm};
use crate::engine::parameters::{constants, DimensionParameters, MetricParameters, ParameterSet};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "inventory_turnover";

pub const GRADE_A: &str = "A";
pub const GRADE_B: &str = "B";
pub const GRADE_C: &str = "C";
pub const GRADE_D: &str = "D";

/// Inventory turnover days graded against the industry's day bands.
///
/// Days are derived from the unrounded inputs, not from the rounded
/// turnover rate.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "Inventory Turnover Days",
        family: MetricFamily::Efficiency,
        methodology: "Turnover rate = COGS / average inventory; turnover days = days in year / turnover rate",
        inputs: vec![
            InputSpec::required("cogs", "Cost of goods sold", Constraint::Positive),
            InputSpec::required("average_inventory", "Average inventory", Constraint::Positive),
        ],
        dimensions: vec![CategoryDimension {
            name: "industry",
            description: "Industry sub-type, sets the day bands",
            options: vec![
                CategoryOption {
                    key: "fmcg",
                    label: "Fast-moving consumer goods",
                    menu: "1",
                    aliases: &["快消品"],
                },
                CategoryOption {
                    key: "durables",
                    label: "Consumer durables",
                    menu: "2",
                    aliases: &["耐用品"],
                },
                CategoryOption {
                    key: "luxury",
                    label: "Luxury goods",
                    menu: "3",
                    aliases: &["奢侈品"],
                },
                CategoryOption {
                    key: "manufacturing",
                    label: "Manufacturing",
                    menu: "4",
                    aliases: &["制造业"],
                },
            ],
            default_key: "manufacturing",
        }],
        precision: Precision::new(Unit::Days, 1),
        formula,
        cross_checks: Vec::new(),
        stress: None,
        tiers: vec![GRADE_A, GRADE_B, GRADE_C, GRADE_D],
        rules: rules(),
        drivers: Some(DriverFormula::Additive { terms: drivers }),
        advisories: Some(advisories),
    }
}

pub fn parameters() -> MetricParameters {
    let bands = |excellent: Decimal, good: Decimal, warning: Decimal| {
        constants(&[
            ("excellent_days", excellent),
            ("good_days", good),
            ("warning_days", warning),
        ])
    };
    MetricParameters::new(constants(&[
        ("days_in_year", dec!(365)),
        ("carrying_rate", dec!(0.05)),
    ]))
    .dimension(
        "industry",
        DimensionParameters::new(bands(dec!(60), dec!(90), dec!(150)))
            .category("fmcg", bands(dec!(30), dec!(45), dec!(60)))
            .category("durables", bands(dec!(60), dec!(90), dec!(120)))
            .category("luxury", bands(dec!(90), dec!(150), dec!(200)))
            .category("manufacturing", bands(dec!(60), dec!(90), dec!(150))),
    )
}

fn rules() -> RuleSet {
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![Operand::Base.le(Operand::param("excellent_days"))],
                GRADE_A,
                "Efficient supply chain: inventory turns into cash quickly and ties up little capital.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.le(Operand::param("good_days"))],
                GRADE_B,
                "Normal turnover; purchasing plans could trim stock levels further.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.le(Operand::param("warning_days"))],
                GRADE_C,
                "Slow turnover with a risk of unsold stock; consider promotions to clear inventory.",
            ),
        ],
        Outcome::new(
            GRADE_D,
            "Severe build-up: analyse the inventory mix and deal with obsolete stock urgently.",
        ),
    )
}

fn formula(profile: &Profile, params: &ParameterSet) -> Computation {
    let cogs = profile.amount("cogs");
    let inventory = profile.amount("average_inventory");
    let good_days = params.value("good_days");

    let days = divide(params.value("days_in_year") * inventory, cogs);
    let mut computation = Computation::new(days)
        .figure("turnover_rate", Unit::Rate, 2, divide(cogs, inventory))
        .amount("good_days", Unit::Days, 1, good_days);

    let carrying = days
        .finite()
        .and_then(|days| days.checked_div(good_days))
        .and_then(|share| share.checked_sub(Decimal::ONE))
        .and_then(|excess| (inventory * params.value("carrying_rate")).checked_mul(excess));
    if let Some(carrying) = carrying {
        computation = computation.amount("carrying_cost", Unit::Money, 2, carrying.max(Decimal::ZERO));
    }
    computation
}

fn drivers(base: &BaseResult, _params: &ParameterSet) -> Option<Vec<DriverTerm>> {
    let good = base.amount("good_days")?;
    Some(vec![
        DriverTerm::new("Good-band days", good),
        DriverTerm::new("Excess days", base.value.finite()?.checked_sub(good)?),
    ])
}

fn advisories(_profile: &Profile, base: &BaseResult, params: &ParameterSet) -> Vec<String> {
    match base.amount("carrying_cost") {
        Some(cost) if cost > Decimal::ZERO => vec![format!(
            "Inventory beyond the good band carries an estimated financing cost of {cost} per year at {}%.",
            params.value("carrying_rate") * dec!(100)
        )],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::Ratio;
    use crate::engine::drivers::DriverBreakdown;
    use crate::{evaluate, DiagnosticResult, MetricRequest};

    fn run(cogs: &str, inventory: &str, industry: &str) -> (DiagnosticResult, Vec<String>) {
        let req = MetricRequest::new(KEY)
            .input("cogs", cogs)
            .input("average_inventory", inventory)
            .category("industry", industry);
        let output = evaluate(&req).unwrap();
        (output.result, output.warnings)
    }

    #[test]
    fn test_fmcg_grades() {
        // 8000 / 1000 = 8 turns, 45.6 days
        let (r, _) = run("8000", "1000", "快消品");
        assert_eq!(r.base.amount("turnover_rate"), Some(dec!(8)));
        assert_eq!(r.base.value, Ratio::Finite(dec!(45.6)));
        assert_eq!(r.classification.tier, GRADE_C);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        // 365 days of COGS against 30 days of stock
        let (r, _) = run("365", "30", "fmcg");
        assert_eq!(r.base.value, Ratio::Finite(dec!(30)));
        assert_eq!(r.classification.tier, GRADE_A);

        let (r, _) = run("365", "200", "luxury");
        assert_eq!(r.classification.tier, GRADE_C);
        let (r, _) = run("365", "201", "luxury");
        assert_eq!(r.classification.tier, GRADE_D);
    }

    #[test]
    fn test_days_use_unrounded_rate() {
        // Rate 3 / 0.7 rounds to 4.29; 365 / 4.29 would give 85.1, not 85.2
        let (r, _) = run("3", "0.7", "4");
        assert_eq!(r.base.amount("turnover_rate"), Some(dec!(4.29)));
        assert_eq!(r.base.value, Ratio::Finite(dec!(85.2)));
        assert_eq!(r.classification.tier, GRADE_B);
    }

    #[test]
    fn test_carrying_cost_only_above_good_band() {
        let (r, warnings) = run("365", "180", "manufacturing");
        // 180 days vs 90: 180 x 0.05 x 1 = 9
        assert_eq!(r.base.amount("carrying_cost"), Some(dec!(9)));
        assert!(warnings.iter().any(|w| w.contains("financing cost of 9")));

        let (r, warnings) = run("365", "60", "manufacturing");
        assert_eq!(r.base.amount("carrying_cost"), Some(Decimal::ZERO));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unknown_industry_uses_manufacturing_bands() {
        let (r, _) = run("365", "100", "textiles");
        assert_eq!(r.parameters.category("industry"), Some("manufacturing"));
        assert_eq!(r.parameters.value("warning_days"), dec!(150));
        assert_eq!(r.classification.tier, GRADE_C);
    }

    #[test]
    fn test_drivers_split_around_good_band() {
        let (r, _) = run("365", "120", "2");
        match r.drivers.unwrap() {
            DriverBreakdown::Additive { terms, total, .. } => {
                assert_eq!(terms[0].contribution, dec!(90));
                assert_eq!(terms[1].contribution, dec!(30));
                assert_eq!(total, dec!(120));
            }
            other => panic!("Expected additive drivers, got {other:?}"),
        }
    }
}
