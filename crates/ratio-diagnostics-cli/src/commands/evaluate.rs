use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use ratio_diagnostics_core::{Engine, MetricRequest, RawValue};

use crate::input;

/// Arguments for a single metric evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Metric key, e.g. eva, roce, interest_coverage
    pub metric: Option<String>,

    /// Path to JSON request file (flags are applied on top)
    #[arg(long)]
    pub input: Option<String>,

    /// Input value as name=number; repeat for each input
    #[arg(long = "value", value_name = "NAME=NUMBER", value_parser = parse_value)]
    pub values: Vec<(String, Decimal)>,

    /// Category selection as dimension=code (menu index, key or label)
    #[arg(long = "category", value_name = "DIMENSION=CODE", value_parser = parse_category)]
    pub categories: Vec<(String, String)>,
}

pub fn run_evaluate(engine: &Engine, args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: MetricRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.values.is_empty() {
        input::stdin::read_stdin()?.unwrap_or_default()
    } else {
        MetricRequest::default()
    };

    if let Some(metric) = args.metric {
        request.metric = metric;
    }
    for (name, value) in args.values {
        request.inputs.insert(name, RawValue::from(value));
    }
    for (dimension, code) in args.categories {
        request.categories.insert(dimension, code);
    }

    if request.metric.trim().is_empty() {
        return Err("a metric is required (positional argument or \"metric\" in --input)".into());
    }

    let output = engine.evaluate(&request)?;
    Ok(serde_json::to_value(output)?)
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn parse_value(raw: &str) -> Result<(String, Decimal), String> {
    let (name, value) = split_pair(raw)?;
    let number = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| format!("'{value}' is not a number (for {name})"))?;
    Ok((name.to_string(), number))
}

fn parse_category(raw: &str) -> Result<(String, String), String> {
    let (dimension, code) = split_pair(raw)?;
    Ok((dimension.to_string(), code.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(
            parse_value("eva_last_year=-200.5").unwrap(),
            ("eva_last_year".to_string(), Decimal::from_str("-200.5").unwrap())
        );
        assert!(parse_value("nopat").is_err());
        assert!(parse_value("=5").is_err());
        assert!(parse_value("nopat=abc").is_err());
    }

    #[test]
    fn test_parse_category_keeps_non_ascii_codes() {
        assert_eq!(
            parse_category("industry_cycle=强周期").unwrap(),
            ("industry_cycle".to_string(), "强周期".to_string())
        );
    }
}
