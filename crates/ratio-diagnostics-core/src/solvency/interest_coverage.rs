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
use crate::engine::scenario::{haircut, StressScenario};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "interest_coverage";

pub const SAFE: &str = "safe";
pub const WATCH: &str = "watch";
pub const RISK: &str = "risk";
pub const CRITICAL: &str = "critical";

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Times-interest-earned, read under normal conditions and under a recession
/// haircut on EBIT sized by the industry's cyclicality.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "Interest Coverage Stress Test",
        family: MetricFamily::Solvency,
        methodology: "Interest coverage = EBIT / interest expense; stressed EBIT = EBIT x (1 - cyclical drop)",
        inputs: vec![
            InputSpec::required("ebit", "EBIT", Constraint::Positive),
            InputSpec::required("interest_expense", "Total interest expense", Constraint::Positive),
            InputSpec::optional("short_term_interest", "Short-term interest expense", Constraint::NonNegative),
        ],
        dimensions: vec![CategoryDimension {
            name: "industry_cycle",
            description: "Cyclicality, sets the EBIT drop in a recession",
            options: vec![
                CategoryOption {
                    key: "strong_cycle",
                    label: "Strong cycle",
                    menu: "1",
                    aliases: &["强周期"],
                },
                CategoryOption {
                    key: "weak_cycle",
                    label: "Weak cycle",
                    menu: "2",
                    aliases: &["弱周期"],
                },
                CategoryOption {
                    key: "defensive",
                    label: "Defensive",
                    menu: "3",
                    aliases: &["防御性"],
                },
            ],
            default_key: "neutral",
        }],
        precision: Precision::new(Unit::Multiple, 2),
        formula,
        cross_checks: vec![CrossCheck {
            fields: &["short_term_interest", "interest_expense"],
            reason: "short-term interest cannot exceed total interest expense",
            holds: short_term_within_total,
        }],
        stress: Some(StressScenario {
            label: "Recession EBIT drop",
            shock_param: "ebit_drop",
            transform: recession,
        }),
        tiers: vec![SAFE, WATCH, RISK, CRITICAL],
        rules: rules(),
        drivers: Some(DriverFormula::Additive { terms: drivers }),
        advisories: Some(advisories),
    }
}

pub fn parameters() -> MetricParameters {
    let drop = |v: Decimal| constants(&[("ebit_drop", v)]);
    MetricParameters::new(constants(&[("short_term_alert_pct", dec!(60))])).dimension(
        "industry_cycle",
        DimensionParameters::new(drop(dec!(0.20)))
            .category("strong_cycle", drop(dec!(0.30)))
            .category("weak_cycle", drop(dec!(0.15)))
            .category("defensive", drop(dec!(0.10))),
    )
}

fn rules() -> RuleSet {
    let at = |v: Decimal| Operand::Const(v);
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![Operand::Base.ge(at(dec!(5))), Operand::Stress.ge(at(dec!(3)))],
                SAFE,
                "Interest is well covered and stays safe in a recession.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.ge(at(dec!(3))), Operand::Stress.ge(at(dec!(2)))],
                WATCH,
                "Safe under normal conditions; monitor EBIT closely for a downturn.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.ge(at(dec!(2))), Operand::Stress.gt(at(Decimal::ONE))],
                RISK,
                "Thin interest cover: cap the debt load and avoid new high-rate borrowing.",
            ),
        ],
        Outcome::new(
            CRITICAL,
            "Interest cannot be covered reliably: default risk; restructure debt or raise EBIT now.",
        ),
    )
}

fn short_term_within_total(profile: &Profile) -> bool {
    profile
        .optional("short_term_interest")
        .map_or(true, |short| short <= profile.amount("interest_expense"))
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

fn formula(profile: &Profile, params: &ParameterSet) -> Computation {
    let ebit = profile.amount("ebit");
    let interest = profile.amount("interest_expense");
    let drop = params.value("ebit_drop");

    let coverage = divide(ebit, interest);
    let mut computation = Computation::new(coverage)
        .amount("ebit_drop_pct", Unit::Percent, 1, drop * HUNDRED)
        .figure("shock_erosion", Unit::Multiple, 2, coverage.scaled(drop));

    if let Some(short) = profile.optional("short_term_interest").filter(|s| *s > Decimal::ZERO) {
        computation = computation.figure(
            "short_term_share_pct",
            Unit::Percent,
            1,
            divide(short, interest).scaled(HUNDRED),
        );
    }
    computation
}

fn recession(profile: &Profile, drop: Decimal, _params: &ParameterSet) -> Profile {
    profile.with_amount("ebit", haircut(profile.amount("ebit"), drop))
}

/// Stressed coverage is the balancing term so both terms sum to the base.
fn drivers(base: &BaseResult, _params: &ParameterSet) -> Option<Vec<DriverTerm>> {
    let erosion = base.amount("shock_erosion")?;
    Some(vec![
        DriverTerm::new("Stressed coverage", base.value.finite()?.checked_sub(erosion)?),
        DriverTerm::new("Recession erosion", erosion),
    ])
}

fn advisories(_profile: &Profile, base: &BaseResult, params: &ParameterSet) -> Vec<String> {
    let alert = params.value("short_term_alert_pct");
    match base.amount("short_term_share_pct") {
        Some(share) if share > alert => vec![format!(
            "Short-term interest is {share}% of the total (above {alert}%): near-term repayment pressure is high."
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
    use crate::engine::drivers::DriverBreakdown;
    use crate::engine::parameters::ParameterTable;
    use crate::{evaluate, DiagnosticsError, Engine, MetricRequest};

    fn request(ebit: &str, interest: &str, cycle: &str) -> MetricRequest {
        MetricRequest::new(KEY)
            .input("ebit", ebit)
            .input("interest_expense", interest)
            .category("industry_cycle", cycle)
    }

    /// Engine whose strong-cycle shock halves EBIT, so base and stress
    /// bounds can be probed independently.
    fn halving_engine() -> Engine {
        let mut overrides = ParameterTable::default();
        overrides.insert(
            KEY,
            MetricParameters::default().dimension(
                "industry_cycle",
                DimensionParameters::default().category("strong_cycle", constants(&[("ebit_drop", dec!(0.5))])),
            ),
        );
        Engine::new(ParameterTable::bundled().with_overrides(overrides))
    }

    #[test]
    fn test_strong_cycle_boundary_case() {
        let r = evaluate(&request("500", "100", "强周期")).unwrap().result;
        assert_eq!(r.base.value, Ratio::Finite(dec!(5.0)));
        let stress = r.stress.unwrap();
        assert_eq!(stress.value, Ratio::Finite(dec!(3.5)));
        assert_eq!(stress.shocked_inputs["ebit"], dec!(350));
        assert_eq!(r.classification.tier, SAFE);
    }

    #[test]
    fn test_neutral_default_drop() {
        let output = evaluate(&request("500", "100", "")).unwrap();
        assert_eq!(output.result.parameters.category("industry_cycle"), Some("neutral"));
        assert_eq!(output.result.stress.unwrap().value, Ratio::Finite(dec!(4)));
        assert!(output.warnings.iter().any(|w| w.contains("industry_cycle")));
    }

    #[test]
    fn test_clauses_are_anded_at_boundaries() {
        let engine = halving_engine();
        let tier = |ebit: &str| {
            engine
                .evaluate(&request(ebit, "100", "1"))
                .unwrap()
                .result
                .classification
                .tier
        };
        // base 6.0, stress 3.0
        assert_eq!(tier("600"), SAFE);
        // base 5.9, stress 2.95: fails the safe stress bound
        assert_eq!(tier("590"), WATCH);
        // base 3.0, stress 1.5
        assert_eq!(tier("300"), RISK);
        // base 2.0, stress 1.0: stress must be strictly above 1
        assert_eq!(tier("200"), CRITICAL);
    }

    #[test]
    fn test_safe_base_with_weak_stress_is_not_safe() {
        let engine = halving_engine();
        let r = engine.evaluate(&request("1000", "200", "strong_cycle")).unwrap().result;
        // base 5.0 passes the safe bound, stress 2.5 does not
        assert_eq!(r.base.value, Ratio::Finite(dec!(5)));
        assert_eq!(r.classification.tier, WATCH);
    }

    #[test]
    fn test_drivers_sum_to_base() {
        let r = evaluate(&request("500", "100", "1")).unwrap().result;
        match r.drivers.unwrap() {
            DriverBreakdown::Additive { terms, total, residual } => {
                assert_eq!(terms[0].contribution, dec!(3.5));
                assert_eq!(terms[1].contribution, dec!(1.5));
                assert_eq!(total, dec!(5));
                assert!(residual.is_zero());
            }
            other => panic!("Expected additive drivers, got {other:?}"),
        }
    }

    #[test]
    fn test_short_term_share_advisory() {
        let high = request("500", "100", "1").input("short_term_interest", "65");
        let output = evaluate(&high).unwrap();
        assert_eq!(output.result.base.amount("short_term_share_pct"), Some(dec!(65)));
        assert!(output.warnings.iter().any(|w| w.contains("Short-term interest")));

        let low = request("500", "100", "1").input("short_term_interest", "60");
        let output = evaluate(&low).unwrap();
        assert!(output.warnings.iter().all(|w| !w.contains("Short-term interest")));
    }

    #[test]
    fn test_zero_short_term_interest_has_no_share() {
        let r = evaluate(&request("500", "100", "1").input("short_term_interest", "0"))
            .unwrap()
            .result;
        assert_eq!(r.base.figure("short_term_share_pct"), None);
    }

    #[test]
    fn test_short_term_above_total_rejected() {
        let err = evaluate(&request("500", "100", "1").input("short_term_interest", "120")).unwrap_err();
        assert!(matches!(err, DiagnosticsError::CrossFieldCheck { .. }));
    }

    #[test]
    fn test_non_positive_ebit_rejected() {
        let err = evaluate(&request("0", "100", "1")).unwrap_err();
        assert_eq!(err.field(), Some("ebit"));
    }
}
