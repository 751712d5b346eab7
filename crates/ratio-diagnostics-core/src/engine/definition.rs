use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculator::{BaseResult, Computation};
use super::classifier::RuleSet;
use super::drivers::DriverFormula;
use super::parameters::ParameterSet;
use super::scenario::StressScenario;
use super::validator::Profile;
use crate::types::Unit;

/// Pure formula: validated inputs + resolved constants → unrounded ratio.
pub type Formula = fn(&Profile, &ParameterSet) -> Computation;

/// Soft findings attached to the output envelope as warnings.
pub type Advisory = fn(&Profile, &BaseResult, &ParameterSet) -> Vec<String>;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    Profitability,
    Liquidity,
    Solvency,
    Efficiency,
    Valuation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "bound", rename_all = "snake_case")]
pub enum Constraint {
    /// Strictly greater than zero.
    Positive,
    /// Zero or greater.
    NonNegative,
    /// Greater than or equal to the bound.
    AtLeast(Decimal),
    Unbounded,
}

impl Constraint {
    pub fn admits(&self, value: Decimal) -> bool {
        match self {
            Self::Positive => value > Decimal::ZERO,
            Self::NonNegative => value >= Decimal::ZERO,
            Self::AtLeast(bound) => value >= *bound,
            Self::Unbounded => true,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Positive => "must be greater than 0".into(),
            Self::NonNegative => "must be 0 or greater".into(),
            Self::AtLeast(bound) => format!("must be at least {bound}"),
            Self::Unbounded => "must be a number".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub constraint: Constraint,
    pub required: bool,
}

impl InputSpec {
    pub fn required(name: &'static str, description: &'static str, constraint: Constraint) -> Self {
        Self {
            name,
            description,
            constraint,
            required: true,
        }
    }

    pub fn optional(name: &'static str, description: &'static str, constraint: Constraint) -> Self {
        Self {
            name,
            description,
            constraint,
            required: false,
        }
    }
}

/// A metric-specific consistency check across several validated inputs.
#[derive(Clone, Serialize)]
pub struct CrossCheck {
    pub fields: &'static [&'static str],
    pub reason: &'static str,
    #[serde(skip)]
    pub holds: fn(&Profile) -> bool,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOption {
    /// Canonical key used by the parameter table.
    pub key: &'static str,
    pub label: &'static str,
    /// Menu index offered by interactive collectors ("1", "2", ...).
    pub menu: &'static str,
    pub aliases: &'static [&'static str],
}

impl CategoryOption {
    pub fn matches(&self, code: &str) -> bool {
        self.menu == code
            || self.key.eq_ignore_ascii_case(code)
            || self.label.eq_ignore_ascii_case(code)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDimension {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<CategoryOption>,
    /// Key used when the selection is missing or unrecognised. May name a
    /// fallback bucket that is not itself a menu option.
    pub default_key: &'static str,
}

impl CategoryDimension {
    /// Map a selection to its canonical key. Returns the key and whether the
    /// selection was recognised; unknown and missing codes fall back to
    /// `default_key`.
    pub fn normalize(&self, selection: Option<&str>) -> (&'static str, bool) {
        let code = match selection.map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => return (self.default_key, false),
        };
        if let Some(option) = self.options.iter().find(|o| o.matches(code)) {
            return (option.key, true);
        }
        if self.default_key.eq_ignore_ascii_case(code) {
            return (self.default_key, true);
        }
        (self.default_key, false)
    }
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

/// Declares the unit and rounding of the base ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Precision {
    pub unit: Unit,
    pub decimals: u32,
}

impl Precision {
    pub const fn new(unit: Unit, decimals: u32) -> Self {
        Self { unit, decimals }
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Immutable description of one supported ratio.
#[derive(Clone, Serialize)]
pub struct MetricDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub family: MetricFamily,
    pub methodology: &'static str,
    pub inputs: Vec<InputSpec>,
    pub dimensions: Vec<CategoryDimension>,
    pub precision: Precision,
    #[serde(skip)]
    pub formula: Formula,
    pub cross_checks: Vec<CrossCheck>,
    pub stress: Option<StressScenario>,
    /// Tier ladder, most favourable first.
    pub tiers: Vec<&'static str>,
    pub rules: RuleSet,
    pub drivers: Option<DriverFormula>,
    #[serde(skip)]
    pub advisories: Option<Advisory>,
}

impl MetricDefinition {
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn dimension(&self, name: &str) -> Option<&CategoryDimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Position of a tier in the ladder (0 = most favourable).
    pub fn rank(&self, tier: &str) -> usize {
        self.tiers
            .iter()
            .position(|t| *t == tier)
            .unwrap_or(self.tiers.len())
    }
}

impl std::fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("key", &self.key)
            .field("family", &self.family)
            .field("inputs", &self.inputs)
            .field("tiers", &self.tiers)
            .finish_non_exhaustive()
    }
}
