use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::definition::MetricDefinition;
use super::validator::Profile;
use crate::{DiagnosticsError, DiagnosticsResult};

/// Largest accepted constant magnitude. Constants are percentages, day
/// counts and multiples; override files beyond this are rejected.
pub const MAX_CONSTANT_MAGNITUDE: Decimal = dec!(1_000_000);

/// Named constants, e.g. `{"wacc_pct": 5.5}`.
pub type Constants = BTreeMap<String, Decimal>;

/// Build a constant map from literal pairs.
pub fn constants(pairs: &[(&str, Decimal)]) -> Constants {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Constants for one category dimension of one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionParameters {
    /// Used for unrecognised or omitted category codes.
    pub default: Constants,
    #[serde(default)]
    pub categories: BTreeMap<String, Constants>,
}

impl DimensionParameters {
    pub fn new(default: Constants) -> Self {
        Self {
            default,
            categories: BTreeMap::new(),
        }
    }

    pub fn category(mut self, key: &str, values: Constants) -> Self {
        self.categories.insert(key.to_string(), values);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricParameters {
    /// Constants that do not depend on any category.
    #[serde(default)]
    pub constants: Constants,
    #[serde(default)]
    pub dimensions: BTreeMap<String, DimensionParameters>,
}

impl MetricParameters {
    pub fn new(constants: Constants) -> Self {
        Self {
            constants,
            dimensions: BTreeMap::new(),
        }
    }

    pub fn dimension(mut self, name: &str, parameters: DimensionParameters) -> Self {
        self.dimensions.insert(name.to_string(), parameters);
        self
    }
}

/// Process-wide `(metric, dimension, category) → constants` lookup.
///
/// Built once and shared read-only by every evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    pub metrics: BTreeMap<String, MetricParameters>,
}

impl ParameterTable {
    /// The constants bundled with the crate for every compiled-in metric.
    pub fn bundled() -> Self {
        crate::catalogue::bundled_parameters()
    }

    pub fn insert(&mut self, metric: &str, parameters: MetricParameters) {
        self.metrics.insert(metric.to_string(), parameters);
    }

    pub fn metric(&self, metric: &str) -> Option<&MetricParameters> {
        self.metrics.get(metric)
    }

    /// Overlay `overrides` value by value: any constant present in the
    /// override replaces the bundled one, everything else is kept.
    pub fn with_overrides(mut self, overrides: ParameterTable) -> Self {
        for (metric, incoming) in overrides.metrics {
            let target = self.metrics.entry(metric).or_default();
            target.constants.extend(incoming.constants);
            for (dim, incoming_dim) in incoming.dimensions {
                let target_dim = target.dimensions.entry(dim).or_default();
                target_dim.default.extend(incoming_dim.default);
                for (key, values) in incoming_dim.categories {
                    target_dim.categories.entry(key).or_default().extend(values);
                }
            }
        }
        self
    }

    /// Resolve the constants for one evaluation. Never fails: unknown
    /// categories, and metrics or dimensions absent from the table, resolve
    /// to the documented defaults (or to nothing).
    pub fn resolve(&self, definition: &MetricDefinition, profile: &Profile) -> ParameterSet {
        let mut set = ParameterSet::default();
        let table = self.metric(definition.key);

        if let Some(table) = table {
            set.values.extend(table.constants.clone());
        }

        for dimension in &definition.dimensions {
            let key = profile.category(dimension.name).unwrap_or(dimension.default_key);
            let dim_table = table.and_then(|t| t.dimensions.get(dimension.name));
            let entry = dim_table.and_then(|d| d.categories.get(key));

            let defaulted = profile.is_defaulted(dimension.name) || entry.is_none();
            let values = entry.or_else(|| dim_table.map(|d| &d.default));
            if let Some(values) = values {
                set.values.extend(values.clone());
            }
            set.categories.insert(
                dimension.name.to_string(),
                ResolvedCategory {
                    key: key.to_string(),
                    defaulted,
                },
            );
        }

        set
    }
}

// ---------------------------------------------------------------------------
// Resolved set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCategory {
    pub key: String,
    /// True when the documented default constants were used.
    pub defaulted: bool,
}

/// Category-resolved constants for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub categories: BTreeMap<String, ResolvedCategory>,
    pub values: Constants,
}

impl ParameterSet {
    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.values.get(key).copied()
    }

    /// Constant value, zero when absent from the table.
    pub fn value(&self, key: &str) -> Decimal {
        self.get(key).unwrap_or(Decimal::ZERO)
    }

    pub fn category(&self, dimension: &str) -> Option<&str> {
        self.categories.get(dimension).map(|c| c.key.as_str())
    }

    /// Reject constants outside [`MAX_CONSTANT_MAGNITUDE`].
    pub fn check_magnitudes(&self) -> DiagnosticsResult<()> {
        match self.values.iter().find(|(_, v)| v.abs() > MAX_CONSTANT_MAGNITUDE) {
            Some((key, value)) => Err(DiagnosticsError::InvalidInput {
                field: format!("parameters.{key}"),
                reason: format!("constant {value} exceeds the supported magnitude of {MAX_CONSTANT_MAGNITUDE}"),
            }),
            None => Ok(()),
        }
    }
}
