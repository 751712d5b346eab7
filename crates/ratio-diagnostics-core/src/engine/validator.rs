use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use super::definition::MetricDefinition;
use super::request::{MetricRequest, RawValue};
use crate::{DiagnosticsError, DiagnosticsResult};

/// Largest accepted input magnitude. Products of inputs with bundled
/// constants stay well inside the Decimal range below this.
pub const MAX_INPUT_MAGNITUDE: Decimal = dec!(1_000_000_000_000_000);

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Validated inputs for one evaluation.
///
/// Only [`validate`] builds a profile from a request; stress scenarios derive
/// shocked copies with [`Profile::with_amount`]. Nothing mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    metric: &'static str,
    values: BTreeMap<&'static str, Decimal>,
    categories: BTreeMap<&'static str, &'static str>,
    defaulted: BTreeSet<&'static str>,
}

impl Profile {
    pub fn metric(&self) -> &'static str {
        self.metric
    }

    /// Value of a required input. Required inputs are always present in a
    /// validated profile, so the zero fallback only covers optional ones.
    pub fn amount(&self, name: &str) -> Decimal {
        self.optional(name).unwrap_or(Decimal::ZERO)
    }

    pub fn optional(&self, name: &str) -> Option<Decimal> {
        self.values.get(name).copied()
    }

    pub fn values(&self) -> &BTreeMap<&'static str, Decimal> {
        &self.values
    }

    /// Canonical category key selected for a dimension.
    pub fn category(&self, dimension: &str) -> Option<&'static str> {
        self.categories.get(dimension).copied()
    }

    /// True when the dimension's selection was missing or unrecognised.
    pub fn is_defaulted(&self, dimension: &str) -> bool {
        self.defaulted.contains(dimension)
    }

    /// A copy of this profile with one input replaced.
    pub fn with_amount(&self, name: &'static str, value: Decimal) -> Profile {
        let mut shocked = self.clone();
        shocked.values.insert(name, value);
        shocked
    }

    /// Inputs whose value differs in `other`, with the value from `other`.
    pub fn changed_in(&self, other: &Profile) -> BTreeMap<String, Decimal> {
        other
            .values
            .iter()
            .filter(|(name, value)| self.values.get(*name) != Some(*value))
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Turn a raw request into a validated [`Profile`].
///
/// Inputs are checked in declaration order, then cross-field checks run in
/// declaration order; the first failure is reported. Category selections
/// never fail: unknown codes fall back to the dimension default.
pub fn validate(definition: &MetricDefinition, request: &MetricRequest) -> DiagnosticsResult<Profile> {
    let mut values = BTreeMap::new();

    for spec in &definition.inputs {
        let parsed = match request.inputs.get(spec.name) {
            Some(raw) => parse_raw(spec.name, raw)?,
            None => None,
        };

        match parsed {
            Some(value) => {
                if !spec.constraint.admits(value) {
                    return Err(DiagnosticsError::InvalidInput {
                        field: spec.name.into(),
                        reason: format!("{} {}; got {}", spec.description, spec.constraint.describe(), value),
                    });
                }
                if value.abs() > MAX_INPUT_MAGNITUDE {
                    return Err(DiagnosticsError::InvalidInput {
                        field: spec.name.into(),
                        reason: format!("{} exceeds the supported magnitude of {MAX_INPUT_MAGNITUDE}", spec.description),
                    });
                }
                values.insert(spec.name, value);
            }
            None if spec.required => {
                return Err(DiagnosticsError::InvalidInput {
                    field: spec.name.into(),
                    reason: format!("{} is required and {}", spec.description, spec.constraint.describe()),
                });
            }
            None => {}
        }
    }

    let mut categories = BTreeMap::new();
    let mut defaulted = BTreeSet::new();
    for dimension in &definition.dimensions {
        let selection = request.categories.get(dimension.name).map(String::as_str);
        let (key, recognised) = dimension.normalize(selection);
        categories.insert(dimension.name, key);
        if !recognised {
            defaulted.insert(dimension.name);
        }
    }

    let profile = Profile {
        metric: definition.key,
        values,
        categories,
        defaulted,
    };

    for check in &definition.cross_checks {
        if !(check.holds)(&profile) {
            return Err(DiagnosticsError::CrossFieldCheck {
                fields: check.fields.join(", "),
                reason: check.reason.into(),
            });
        }
    }

    Ok(profile)
}

/// Names in the request that the metric does not declare, as warnings.
pub fn unrecognised_fields(definition: &MetricDefinition, request: &MetricRequest) -> Vec<String> {
    let inputs = request
        .inputs
        .keys()
        .filter(|name| definition.input(name).is_none())
        .map(|name| format!("Input '{name}' is not used by {}; ignored.", definition.key));
    let categories = request
        .categories
        .keys()
        .filter(|name| definition.dimension(name).is_none())
        .map(|name| format!("Category '{name}' is not used by {}; ignored.", definition.key));
    inputs.chain(categories).collect()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn parse_raw(field: &str, raw: &RawValue) -> DiagnosticsResult<Option<Decimal>> {
    let text = match raw {
        RawValue::Number(n) => n.to_string(),
        RawValue::Text(s) => s.trim().to_string(),
    };
    if text.is_empty() {
        return Ok(None);
    }
    parse_decimal(&text).map(Some).ok_or_else(|| DiagnosticsError::InvalidInput {
        field: field.into(),
        reason: format!("'{text}' is not a number"),
    })
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::definition::{
        CategoryDimension, CategoryOption, Constraint, CrossCheck, InputSpec, MetricFamily, Precision,
    };
    use crate::engine::calculator::Computation;
    use crate::engine::classifier::{Outcome, RuleSet};
    use crate::types::Unit;
    use rust_decimal_macros::dec;

    fn profit_not_above_capital(p: &Profile) -> bool {
        p.amount("capital") >= p.amount("profit")
    }

    fn sample_definition() -> MetricDefinition {
        MetricDefinition {
            key: "sample",
            title: "Sample",
            family: MetricFamily::Profitability,
            methodology: "test",
            inputs: vec![
                InputSpec::required("profit", "Profit", Constraint::Positive),
                InputSpec::required("capital", "Capital", Constraint::Positive),
                InputSpec::optional("prior", "Prior", Constraint::Unbounded),
            ],
            dimensions: vec![CategoryDimension {
                name: "sector",
                description: "Sector",
                options: vec![CategoryOption {
                    key: "tech",
                    label: "Technology",
                    menu: "1",
                    aliases: &[],
                }],
                default_key: "general",
            }],
            precision: Precision::new(Unit::Percent, 2),
            formula: |_, _| Computation::of(Decimal::ZERO),
            cross_checks: vec![CrossCheck {
                fields: &["capital", "profit"],
                reason: "capital below profit",
                holds: profit_not_above_capital,
            }],
            stress: None,
            tiers: vec!["only"],
            rules: RuleSet::new(Vec::new(), Outcome::new("only", "")),
            drivers: None,
            advisories: None,
        }
    }

    #[test]
    fn test_valid_request_builds_profile() {
        let req = MetricRequest::new("sample")
            .input("profit", 100)
            .input("capital", " 800.5 ")
            .category("sector", "1");
        let profile = validate(&sample_definition(), &req).unwrap();
        assert_eq!(profile.amount("profit"), dec!(100));
        assert_eq!(profile.amount("capital"), dec!(800.5));
        assert_eq!(profile.optional("prior"), None);
        assert_eq!(profile.category("sector"), Some("tech"));
        assert!(!profile.is_defaulted("sector"));
    }

    #[test]
    fn test_missing_required_rejected() {
        let req = MetricRequest::new("sample").input("profit", 100);
        let err = validate(&sample_definition(), &req).unwrap_err();
        assert_eq!(err.field(), Some("capital"));
    }

    #[test]
    fn test_zero_denominator_rejected() {
        let req = MetricRequest::new("sample").input("profit", 100).input("capital", 0);
        match validate(&sample_definition(), &req).unwrap_err() {
            DiagnosticsError::InvalidInput { field, reason } => {
                assert_eq!(field, "capital");
                assert!(reason.contains("greater than 0"));
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_rejected() {
        for bad in ["NaN", "abc", "inf", "12x"] {
            let req = MetricRequest::new("sample").input("profit", bad).input("capital", 10);
            let err = validate(&sample_definition(), &req).unwrap_err();
            assert_eq!(err.field(), Some("profit"), "value {bad}");
        }
    }

    #[test]
    fn test_blank_optional_is_absent_not_zero() {
        let req = MetricRequest::new("sample")
            .input("profit", 100)
            .input("capital", 800)
            .input("prior", "");
        let profile = validate(&sample_definition(), &req).unwrap();
        assert_eq!(profile.optional("prior"), None);
    }

    #[test]
    fn test_scientific_notation_accepted() {
        let req = MetricRequest::new("sample").input("profit", "1e2").input("capital", 800);
        let profile = validate(&sample_definition(), &req).unwrap();
        assert_eq!(profile.amount("profit"), dec!(100));
    }

    #[test]
    fn test_magnitude_cap() {
        let req = MetricRequest::new("sample").input("profit", "1").input("capital", "1e27");
        match validate(&sample_definition(), &req).unwrap_err() {
            DiagnosticsError::InvalidInput { field, reason } => {
                assert_eq!(field, "capital");
                assert!(reason.contains("magnitude"));
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }

        let req = MetricRequest::new("sample")
            .input("profit", "1")
            .input("capital", "1000000000000000")
            .input("prior", "-1e-20");
        assert!(validate(&sample_definition(), &req).is_ok());
    }

    #[test]
    fn test_cross_check_failure() {
        let req = MetricRequest::new("sample").input("profit", 900).input("capital", 800);
        match validate(&sample_definition(), &req).unwrap_err() {
            DiagnosticsError::CrossFieldCheck { fields, .. } => assert_eq!(fields, "capital, profit"),
            other => panic!("Expected CrossFieldCheck, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_category_defaults() {
        let req = MetricRequest::new("sample")
            .input("profit", 100)
            .input("capital", 800)
            .category("sector", "7");
        let profile = validate(&sample_definition(), &req).unwrap();
        assert_eq!(profile.category("sector"), Some("general"));
        assert!(profile.is_defaulted("sector"));
    }

    #[test]
    fn test_unrecognised_fields_reported() {
        let req = MetricRequest::new("sample")
            .input("profit", 100)
            .input("revenue", 5)
            .category("region", "EU");
        let notes = unrecognised_fields(&sample_definition(), &req);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains("revenue"));
        assert!(notes[1].contains("region"));
    }

    #[test]
    fn test_with_amount_leaves_original_untouched() {
        let req = MetricRequest::new("sample").input("profit", 100).input("capital", 800);
        let profile = validate(&sample_definition(), &req).unwrap();
        let shocked = profile.with_amount("profit", dec!(70));
        assert_eq!(profile.amount("profit"), dec!(100));
        assert_eq!(shocked.amount("profit"), dec!(70));
        let changed = profile.changed_in(&shocked);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed["profit"], dec!(70));
    }
}
