use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw input value as handed over by an input collector.
///
/// JSON callers send numbers, CLI and form callers send text. Text is parsed
/// by the validator; an empty string means the field was left blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(serde_json::Number),
    Text(String),
}

impl From<Decimal> for RawValue {
    fn from(value: Decimal) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value.into())
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(value.into())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// One evaluation request: a metric key, its raw inputs and category
/// selections (menu index, canonical key or label).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRequest {
    pub metric: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, RawValue>,
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

impl MetricRequest {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            ..Self::default()
        }
    }

    pub fn input(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn category(mut self, dimension: impl Into<String>, code: impl Into<String>) -> Self {
        self.categories.insert(dimension.into(), code.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_builder() {
        let req = MetricRequest::new("eva")
            .input("nopat", dec!(1000))
            .input("capital_employed", 8000)
            .category("company_type", "1");
        assert_eq!(req.metric, "eva");
        assert_eq!(req.inputs["nopat"], RawValue::Text("1000".into()));
        assert_eq!(req.inputs["capital_employed"], RawValue::Number(8000.into()));
        assert_eq!(req.categories["company_type"], "1");
    }

    #[test]
    fn test_request_deserialises_mixed_values() {
        let json = r#"{
            "metric": "roce",
            "inputs": {"operating_profit": 5000, "capital_employed": "30000"},
            "categories": {"industry": "2"}
        }"#;
        let req: MetricRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(req.inputs["operating_profit"], RawValue::Number(_)));
        assert_eq!(req.inputs["capital_employed"], RawValue::Text("30000".into()));
    }

    #[test]
    fn test_request_defaults_empty_maps() {
        let req: MetricRequest = serde_json::from_str(r#"{"metric": "eva"}"#).unwrap();
        assert!(req.inputs.is_empty());
        assert!(req.categories.is_empty());
    }
}
