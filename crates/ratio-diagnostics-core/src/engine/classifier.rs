use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::calculator::{BaseResult, Ratio};
use super::definition::MetricDefinition;
use super::parameters::ParameterSet;
use super::scenario::StressResult;

// ---------------------------------------------------------------------------
// Rule language
// ---------------------------------------------------------------------------

/// A value a clause can compare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum Operand {
    /// The base ratio.
    Base,
    /// The stressed ratio; absent for metrics without a scenario.
    Stress,
    /// A secondary figure reported by the formula.
    Figure(String),
    /// A resolved constant from the parameter set.
    Param(String),
    Const(Decimal),
}

impl Operand {
    pub fn figure(name: &str) -> Self {
        Self::Figure(name.to_string())
    }

    pub fn param(key: &str) -> Self {
        Self::Param(key.to_string())
    }

    pub fn gt(self, right: Operand) -> Clause {
        Clause::new(self, Comparison::Gt, right)
    }

    pub fn ge(self, right: Operand) -> Clause {
        Clause::new(self, Comparison::Ge, right)
    }

    pub fn lt(self, right: Operand) -> Clause {
        Clause::new(self, Comparison::Lt, right)
    }

    pub fn le(self, right: Operand) -> Clause {
        Clause::new(self, Comparison::Le, right)
    }

    pub fn equals(self, right: Operand) -> Clause {
        Clause::new(self, Comparison::Eq, right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl Comparison {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Eq => ordering == Ordering::Equal,
        }
    }
}

/// `left <op> right × factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub left: Operand,
    pub op: Comparison,
    pub right: Operand,
    #[serde(default = "unit_factor")]
    pub factor: Decimal,
}

fn unit_factor() -> Decimal {
    Decimal::ONE
}

impl Clause {
    pub fn new(left: Operand, op: Comparison, right: Operand) -> Self {
        Self {
            left,
            op,
            right,
            factor: Decimal::ONE,
        }
    }

    /// Scale the right-hand operand.
    pub fn scaled(mut self, factor: Decimal) -> Self {
        self.factor = factor;
        self
    }

    /// A clause whose operand is missing is false.
    pub fn holds(&self, facts: &Facts<'_>) -> bool {
        let (Some(left), Some(right)) = (facts.resolve(&self.left), facts.resolve(&self.right)) else {
            return false;
        };
        self.op.accepts(left.compare(right.scaled(self.factor)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub tier: String,
    pub note: String,
}

impl Outcome {
    pub fn new(tier: &str, note: &str) -> Self {
        Self {
            tier: tier.to_string(),
            note: note.to_string(),
        }
    }
}

/// Clauses joined with AND, checked left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub when: Vec<Clause>,
    pub then: Outcome,
}

impl ThresholdRule {
    pub fn new(when: Vec<Clause>, tier: &str, note: &str) -> Self {
        Self {
            when,
            then: Outcome::new(tier, note),
        }
    }

    pub fn matches(&self, facts: &Facts<'_>) -> bool {
        self.when.iter().all(|clause| clause.holds(facts))
    }
}

/// Ordered rules, first match wins. The catch-all lives in its own field so
/// every rule set is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<ThresholdRule>,
    pub otherwise: Outcome,
}

impl RuleSet {
    pub fn new(rules: Vec<ThresholdRule>, otherwise: Outcome) -> Self {
        Self { rules, otherwise }
    }

    /// Returns the winning outcome and the index of the matching rule
    /// (`None` for the catch-all).
    pub fn evaluate(&self, facts: &Facts<'_>) -> (&Outcome, Option<usize>) {
        self.rules
            .iter()
            .position(|rule| rule.matches(facts))
            .map(|i| (&self.rules[i].then, Some(i)))
            .unwrap_or((&self.otherwise, None))
    }

    /// Every tier this rule set can produce, catch-all last.
    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|r| r.then.tier.as_str())
            .chain(std::iter::once(self.otherwise.tier.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Everything a clause may look at.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a> {
    pub base: &'a BaseResult,
    pub stress: Option<&'a StressResult>,
    pub parameters: &'a ParameterSet,
}

impl Facts<'_> {
    fn resolve(&self, operand: &Operand) -> Option<Ratio> {
        match operand {
            Operand::Base => Some(self.base.value),
            Operand::Stress => self.stress.map(|s| s.value),
            Operand::Figure(name) => self.base.figure(name),
            Operand::Param(key) => self.parameters.get(key).map(Ratio::Finite),
            Operand::Const(v) => Some(Ratio::Finite(*v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub tier: String,
    /// Position in the metric's tier ladder, 0 = most favourable.
    pub rank: usize,
    pub note: String,
    /// Index of the matching rule; `None` when the catch-all applied.
    pub rule: Option<usize>,
}

/// Classify the (base, stress) pair against the metric's threshold rules.
pub fn classify(
    definition: &MetricDefinition,
    base: &BaseResult,
    stress: Option<&StressResult>,
    parameters: &ParameterSet,
) -> Classification {
    let facts = Facts {
        base,
        stress,
        parameters,
    };
    let (outcome, rule) = definition.rules.evaluate(&facts);
    Classification {
        tier: outcome.tier.clone(),
        rank: definition.rank(&outcome.tier),
        note: outcome.note.clone(),
        rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;
    use rust_decimal_macros::dec;

    fn base(value: Ratio) -> BaseResult {
        BaseResult {
            value,
            is_saturated: value.is_saturated(),
            unit: Unit::Multiple,
            figures: Vec::new(),
        }
    }

    fn stress(value: Ratio) -> StressResult {
        StressResult {
            value,
            is_saturated: value.is_saturated(),
            label: "test".into(),
            shock: dec!(0.3),
            shocked_inputs: Default::default(),
        }
    }

    fn coverage_rules() -> RuleSet {
        RuleSet::new(
            vec![
                ThresholdRule::new(
                    vec![
                        Operand::Base.ge(Operand::Const(dec!(5))),
                        Operand::Stress.ge(Operand::Const(dec!(3))),
                    ],
                    "safe",
                    "",
                ),
                ThresholdRule::new(
                    vec![
                        Operand::Base.ge(Operand::Const(dec!(3))),
                        Operand::Stress.ge(Operand::Const(dec!(2))),
                    ],
                    "watch",
                    "",
                ),
            ],
            Outcome::new("critical", ""),
        )
    }

    fn run(rules: &RuleSet, b: Ratio, s: Option<Ratio>) -> String {
        let params = ParameterSet::default();
        let base = base(b);
        let stress = s.map(stress);
        let facts = Facts {
            base: &base,
            stress: stress.as_ref(),
            parameters: &params,
        };
        rules.evaluate(&facts).0.tier.clone()
    }

    #[test]
    fn test_first_match_wins() {
        let rules = coverage_rules();
        assert_eq!(run(&rules, Ratio::Finite(dec!(6)), Some(Ratio::Finite(dec!(4)))), "safe");
        assert_eq!(run(&rules, Ratio::Finite(dec!(6)), Some(Ratio::Finite(dec!(2.5)))), "watch");
    }

    #[test]
    fn test_and_requires_both_axes() {
        let rules = coverage_rules();
        // Base passes the safe bound but stress fails every ladder step.
        assert_eq!(run(&rules, Ratio::Finite(dec!(9)), Some(Ratio::Finite(dec!(1)))), "critical");
    }

    #[test]
    fn test_boundaries_are_inclusive_for_ge() {
        let rules = coverage_rules();
        assert_eq!(run(&rules, Ratio::Finite(dec!(5)), Some(Ratio::Finite(dec!(3)))), "safe");
        assert_eq!(run(&rules, Ratio::Finite(dec!(4.99)), Some(Ratio::Finite(dec!(3)))), "watch");
    }

    #[test]
    fn test_missing_stress_never_matches() {
        let rules = coverage_rules();
        assert_eq!(run(&rules, Ratio::Finite(dec!(9)), None), "critical");
    }

    #[test]
    fn test_saturated_passes_lower_bounds() {
        let rules = coverage_rules();
        assert_eq!(run(&rules, Ratio::Saturated, Some(Ratio::Saturated)), "safe");
    }

    #[test]
    fn test_saturated_fails_upper_bounds() {
        let rules = RuleSet::new(
            vec![ThresholdRule::new(
                vec![Operand::Base.le(Operand::Const(dec!(30)))],
                "fast",
                "",
            )],
            Outcome::new("slow", ""),
        );
        assert_eq!(run(&rules, Ratio::Saturated, None), "slow");
        assert_eq!(run(&rules, Ratio::Finite(dec!(30)), None), "fast");
    }

    #[test]
    fn test_scaled_param_bound() {
        let rules = RuleSet::new(
            vec![ThresholdRule::new(
                vec![Operand::Base.gt(Operand::param("benchmark")).scaled(dec!(1.2))],
                "excellent",
                "",
            )],
            Outcome::new("other", ""),
        );
        let mut params = ParameterSet::default();
        params.values.insert("benchmark".into(), dec!(15));
        for (value, expected) in [(dec!(18.01), "excellent"), (dec!(18), "other")] {
            let b = base(Ratio::Finite(value));
            let facts = Facts {
                base: &b,
                stress: None,
                parameters: &params,
            };
            assert_eq!(rules.evaluate(&facts).0.tier, expected);
        }
    }

    #[test]
    fn test_classification_is_total_over_a_grid() {
        let rules = coverage_rules();
        let mut v = dec!(-2);
        while v <= dec!(8) {
            let tier = run(&rules, Ratio::Finite(v), Some(Ratio::Finite(v * dec!(0.7))));
            assert!(["safe", "watch", "critical"].contains(&tier.as_str()));
            v += dec!(0.25);
        }
    }

    #[test]
    fn test_rule_set_serialises() {
        let json = serde_json::to_value(coverage_rules()).unwrap();
        assert_eq!(json["otherwise"]["tier"], "critical");
        assert_eq!(json["rules"][0]["when"][0]["left"]["source"], "base");
        let back: RuleSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, coverage_rules());
    }
}
