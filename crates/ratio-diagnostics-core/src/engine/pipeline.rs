use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Instant;

use super::calculator::{self, BaseResult};
use super::classifier::{self, Classification};
use super::definition::MetricDefinition;
use super::drivers::{self, DriverBreakdown};
use super::parameters::{ParameterSet, ParameterTable};
use super::request::MetricRequest;
use super::scenario::{self, StressResult};
use super::validator;
use crate::types::*;
use crate::{catalogue, DiagnosticsError, DiagnosticsResult};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Structured result of one evaluation, handed to a presenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub metric: String,
    pub title: String,
    pub base: BaseResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress: Option<StressResult>,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drivers: Option<DriverBreakdown>,
    pub parameters: ParameterSet,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Metric definitions plus the parameter table they resolve against.
///
/// Stateless between calls; share one instance across threads freely.
pub struct Engine {
    definitions: Vec<MetricDefinition>,
    parameters: ParameterTable,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ParameterTable::bundled())
    }
}

impl Engine {
    pub fn new(parameters: ParameterTable) -> Self {
        Self {
            definitions: catalogue::definitions(),
            parameters,
        }
    }

    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Look up a metric by key. Case and `-`/`_` are not significant.
    pub fn definition(&self, metric: &str) -> DiagnosticsResult<&MetricDefinition> {
        let wanted = catalogue::normalize_key(metric);
        self.definitions
            .iter()
            .find(|d| d.key == wanted)
            .ok_or_else(|| DiagnosticsError::UnknownMetric(metric.to_string()))
    }

    /// Run the full diagnostic pipeline for one request.
    ///
    /// A validation failure short-circuits: no later stage runs and no partial
    /// result is produced.
    pub fn evaluate(&self, request: &MetricRequest) -> DiagnosticsResult<ComputationOutput<DiagnosticResult>> {
        let start = Instant::now();

        let definition = self.definition(&request.metric)?;
        let profile = validator::validate(definition, request)?;
        let mut warnings = validator::unrecognised_fields(definition, request);

        let parameters = self.parameters.resolve(definition, &profile);
        parameters.check_magnitudes()?;
        for (dimension, resolved) in &parameters.categories {
            if resolved.defaulted {
                let selection = request.categories.get(dimension).map(String::as_str).unwrap_or("none");
                warnings.push(format!(
                    "Category '{dimension}' selection '{selection}' not recognised; using default '{}'.",
                    resolved.key
                ));
            }
        }

        let base = calculator::compute(definition, &profile, &parameters);
        if base.is_saturated {
            warnings.push(format!(
                "{} denominator is zero or negligible; ratio reported as saturated.",
                definition.title
            ));
        }

        let stress = scenario::apply(definition, &profile, &parameters);
        let classification = classifier::classify(definition, &base, stress.as_ref(), &parameters);
        let drivers = drivers::decompose(definition, &base, &parameters);

        if let Some(advise) = definition.advisories {
            warnings.extend(advise(&profile, &base, &parameters));
        }

        let result = DiagnosticResult {
            metric: definition.key.to_string(),
            title: definition.title.to_string(),
            base,
            stress,
            classification,
            drivers,
            parameters,
        };

        let assumptions = result.parameters.clone();
        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            definition.methodology,
            &assumptions,
            warnings,
            elapsed,
            result,
        ))
    }
}

fn default_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::default)
}

/// Evaluate a request against the bundled parameter table.
pub fn evaluate(request: &MetricRequest) -> DiagnosticsResult<ComputationOutput<DiagnosticResult>> {
    default_engine().evaluate(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_metric() {
        let err = evaluate(&MetricRequest::new("ebitda_margin")).unwrap_err();
        assert_eq!(err, DiagnosticsError::UnknownMetric("ebitda_margin".into()));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
        assert_send_sync::<ParameterTable>();
    }
}
