use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;

use super::definition::MetricDefinition;
use super::parameters::ParameterSet;
use super::validator::Profile;
use crate::types::Unit;

/// Serialised form of a saturated ratio.
pub const SATURATED_LABEL: &str = "inf";

// ---------------------------------------------------------------------------
// Ratio
// ---------------------------------------------------------------------------

/// A computed ratio. `Saturated` stands in for x / 0 with x != 0 and orders
/// above every finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ratio {
    Finite(Decimal),
    Saturated,
}

impl Ratio {
    pub fn finite(self) -> Option<Decimal> {
        match self {
            Self::Finite(v) => Some(v),
            Self::Saturated => None,
        }
    }

    pub fn is_saturated(self) -> bool {
        matches!(self, Self::Saturated)
    }

    pub fn round_dp(self, decimals: u32) -> Self {
        match self {
            Self::Finite(v) => Self::Finite(v.round_dp(decimals)),
            Self::Saturated => Self::Saturated,
        }
    }

    /// Scale by a positive factor. Saturation is preserved and a product
    /// beyond the Decimal range saturates.
    pub fn scaled(self, factor: Decimal) -> Self {
        match self {
            Self::Finite(v) => v.checked_mul(factor).map_or(Self::Saturated, Self::Finite),
            Self::Saturated => Self::Saturated,
        }
    }

    /// Total order with `Saturated` as +infinity.
    pub fn compare(self, other: Ratio) -> Ordering {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => a.cmp(&b),
            (Self::Saturated, Self::Saturated) => Ordering::Equal,
            (Self::Saturated, Self::Finite(_)) => Ordering::Greater,
            (Self::Finite(_), Self::Saturated) => Ordering::Less,
        }
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{}", v),
            Self::Saturated => write!(f, "{}", SATURATED_LABEL),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(v) => Serialize::serialize(v, serializer),
            Self::Saturated => serializer.serialize_str(SATURATED_LABEL),
        }
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(Decimal),
            Label(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Value(v) => Ok(Self::Finite(v)),
            Repr::Label(s) if s == SATURATED_LABEL => Ok(Self::Saturated),
            Repr::Label(s) => Err(serde::de::Error::custom(format!(
                "expected a decimal or \"{SATURATED_LABEL}\", got \"{s}\""
            ))),
        }
    }
}

/// Divide with the saturation policy: x / 0 saturates, 0 / 0 is zero.
///
/// A quotient beyond the Decimal range is treated like a zero denominator.
pub fn divide(numerator: Decimal, denominator: Decimal) -> Ratio {
    if denominator.is_zero() {
        if numerator.is_zero() {
            Ratio::Finite(Decimal::ZERO)
        } else {
            Ratio::Saturated
        }
    } else {
        numerator
            .checked_div(denominator)
            .map_or(Ratio::Saturated, Ratio::Finite)
    }
}

// ---------------------------------------------------------------------------
// Formula output
// ---------------------------------------------------------------------------

/// A named secondary value reported next to the base ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub name: String,
    pub value: Ratio,
    pub unit: Unit,
    pub decimals: u32,
}

/// Unrounded formula output.
#[derive(Debug, Clone, PartialEq)]
pub struct Computation {
    pub value: Ratio,
    pub figures: Vec<Figure>,
}

impl Computation {
    pub fn new(value: Ratio) -> Self {
        Self {
            value,
            figures: Vec::new(),
        }
    }

    pub fn of(value: Decimal) -> Self {
        Self::new(Ratio::Finite(value))
    }

    pub fn figure(mut self, name: &str, unit: Unit, decimals: u32, value: Ratio) -> Self {
        self.figures.push(Figure {
            name: name.to_string(),
            value,
            unit,
            decimals,
        });
        self
    }

    pub fn amount(self, name: &str, unit: Unit, decimals: u32, value: Decimal) -> Self {
        self.figure(name, unit, decimals, Ratio::Finite(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseResult {
    pub value: Ratio,
    pub is_saturated: bool,
    pub unit: Unit,
    pub figures: Vec<Figure>,
}

impl BaseResult {
    pub fn figure(&self, name: &str) -> Option<Ratio> {
        self.figures.iter().find(|f| f.name == name).map(|f| f.value)
    }

    /// Finite value of a figure, if present and not saturated.
    pub fn amount(&self, name: &str) -> Option<Decimal> {
        self.figure(name).and_then(Ratio::finite)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate the metric's formula and round once, at this boundary.
pub fn compute(
    definition: &MetricDefinition,
    profile: &Profile,
    parameters: &ParameterSet,
) -> BaseResult {
    let raw = (definition.formula)(profile, parameters);
    let value = raw.value.round_dp(definition.precision.decimals);
    let figures = raw
        .figures
        .into_iter()
        .map(|f| Figure {
            value: f.value.round_dp(f.decimals),
            ..f
        })
        .collect();

    BaseResult {
        value,
        is_saturated: value.is_saturated(),
        unit: definition.precision.unit,
        figures,
    }
}
