use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::calculator::BaseResult;
use super::classifier::{Facts, RuleSet};
use super::definition::MetricDefinition;
use super::parameters::ParameterSet;

/// Additive terms must reproduce the base ratio within this tolerance.
pub const ROUNDING_TOLERANCE: Decimal = dec!(0.01);

/// Ordered `(label, contribution)` terms; `None` when the inputs needed for
/// the decomposition were not supplied.
pub type AdditiveTerms = fn(&BaseResult, &ParameterSet) -> Option<Vec<DriverTerm>>;

#[derive(Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverFormula {
    Additive {
        #[serde(skip)]
        terms: AdditiveTerms,
    },
    /// A qualitative tag picked by first-match rules.
    Comparative { rules: RuleSet },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverTerm {
    pub label: String,
    pub contribution: Decimal,
}

impl DriverTerm {
    pub fn new(label: &str, contribution: Decimal) -> Self {
        Self {
            label: label.to_string(),
            contribution,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverBreakdown {
    Additive {
        terms: Vec<DriverTerm>,
        total: Decimal,
        /// Base ratio minus the sum of terms; rounding noise only.
        residual: Decimal,
    },
    Comparative {
        tag: String,
        note: String,
    },
}

impl DriverBreakdown {
    /// Readable one-line form, e.g. `12.5 (NOPAT yield) - 5.5 (WACC) = 7.0`.
    pub fn summary(&self) -> String {
        match self {
            Self::Additive { terms, total, .. } => {
                let mut out = String::new();
                for (i, term) in terms.iter().enumerate() {
                    let magnitude = term.contribution.abs();
                    match (i, term.contribution.is_sign_negative()) {
                        (0, true) => out.push_str(&format!("-{magnitude} ({})", term.label)),
                        (0, false) => out.push_str(&format!("{magnitude} ({})", term.label)),
                        (_, true) => out.push_str(&format!(" - {magnitude} ({})", term.label)),
                        (_, false) => out.push_str(&format!(" + {magnitude} ({})", term.label)),
                    }
                }
                format!("{out} = {total}")
            }
            Self::Comparative { tag, note } => format!("{tag}: {note}"),
        }
    }
}

/// Express the base ratio through its drivers.
pub fn decompose(
    definition: &MetricDefinition,
    base: &BaseResult,
    parameters: &ParameterSet,
) -> Option<DriverBreakdown> {
    match definition.drivers.as_ref()? {
        DriverFormula::Additive { terms } => {
            let value = base.value.finite()?;
            let terms = terms(base, parameters)?;
            let total = terms
                .iter()
                .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.contribution))?;
            Some(DriverBreakdown::Additive {
                terms,
                total,
                residual: value.checked_sub(total)?,
            })
        }
        DriverFormula::Comparative { rules } => {
            let facts = Facts {
                base,
                stress: None,
                parameters,
            };
            let (outcome, _) = rules.evaluate(&facts);
            Some(DriverBreakdown::Comparative {
                tag: outcome.tier.clone(),
                note: outcome.note.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_summary() {
        let breakdown = DriverBreakdown::Additive {
            terms: vec![
                DriverTerm::new("NOPAT yield", dec!(12.5)),
                DriverTerm::new("WACC", dec!(-5.5)),
            ],
            total: dec!(7.0),
            residual: Decimal::ZERO,
        };
        assert_eq!(breakdown.summary(), "12.5 (NOPAT yield) - 5.5 (WACC) = 7.0");
    }

    #[test]
    fn test_comparative_summary() {
        let breakdown = DriverBreakdown::Comparative {
            tag: "in_line".into(),
            note: "Valuation matches the sector".into(),
        };
        assert_eq!(breakdown.summary(), "in_line: Valuation matches the sector");
    }
}
