use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, Computation};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{Constraint, InputSpec, MetricDefinition, MetricFamily, Precision};
use crate::engine::parameters::{constants, MetricParameters, ParameterSet};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "quick_ratio";

pub const STRONG: &str = "strong";
pub const HEALTHY: &str = "healthy";
pub const DEFICIENT: &str = "deficient";

/// Acid test: assets convertible to cash at once (current assets less
/// inventory and prepayments) over current liabilities.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "Quick Ratio",
        family: MetricFamily::Liquidity,
        methodology: "Quick ratio = quick assets / current liabilities",
        inputs: vec![
            InputSpec::required("quick_assets", "Quick assets", Constraint::NonNegative),
            InputSpec::required("current_liabilities", "Current liabilities", Constraint::Positive),
        ],
        dimensions: Vec::new(),
        precision: Precision::new(Unit::Multiple, 2),
        formula,
        cross_checks: Vec::new(),
        stress: None,
        tiers: vec![STRONG, HEALTHY, DEFICIENT],
        rules: rules(),
        drivers: None,
        advisories: None,
    }
}

pub fn parameters() -> MetricParameters {
    MetricParameters::new(constants(&[("strong_above", dec!(1.5)), ("healthy_from", dec!(0.8))]))
}

fn rules() -> RuleSet {
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![Operand::Base.gt(Operand::param("strong_above"))],
                STRONG,
                "Strong immediate solvency with ample cash reserves; short-term investment of the surplus is an option.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.ge(Operand::param("healthy_from"))],
                HEALTHY,
                "Quick assets are healthy; keep an eye on the receivables collection cycle.",
            ),
        ],
        Outcome::new(
            DEFICIENT,
            "Quick assets are insufficient: collect receivables or add cash first.",
        ),
    )
}

fn formula(profile: &Profile, _params: &ParameterSet) -> Computation {
    Computation::new(divide(profile.amount("quick_assets"), profile.amount("current_liabilities")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::Ratio;
    use crate::{evaluate, MetricRequest};

    fn run(quick: &str, liabilities: &str) -> (Ratio, String) {
        let req = MetricRequest::new(KEY)
            .input("quick_assets", quick)
            .input("current_liabilities", liabilities);
        let r = evaluate(&req).unwrap().result;
        (r.base.value, r.classification.tier)
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(run("800", "500"), (Ratio::Finite(dec!(1.6)), STRONG.to_string()));
        assert_eq!(run("750", "500"), (Ratio::Finite(dec!(1.5)), HEALTHY.to_string()));
        assert_eq!(run("400", "500"), (Ratio::Finite(dec!(0.8)), HEALTHY.to_string()));
        assert_eq!(run("399", "500"), (Ratio::Finite(dec!(0.8)), HEALTHY.to_string()));
        assert_eq!(run("395", "500"), (Ratio::Finite(dec!(0.79)), DEFICIENT.to_string()));
    }

    #[test]
    fn test_negative_quick_assets_rejected() {
        let req = MetricRequest::new(KEY)
            .input("quick_assets", "-1")
            .input("current_liabilities", "500");
        assert_eq!(evaluate(&req).unwrap_err().field(), Some("quick_assets"));
    }
}
