use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, BaseResult, Computation, Ratio};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{Constraint, InputSpec, MetricDefinition, MetricFamily, Precision};
use crate::engine::drivers::DriverFormula;
use crate::engine::parameters::{constants, MetricParameters, ParameterSet};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "pe_safety_margin";

pub const UNDERVALUED: &str = "undervalued";
pub const FAIR: &str = "fair";
pub const OVERVALUED: &str = "overvalued";

pub const GROWTH_PREMIUM: &str = "growth_premium";
pub const RISK_PREMIUM: &str = "risk_premium";
pub const DISCOUNT: &str = "discount";
pub const IN_LINE: &str = "in_line";

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Static P/E against a safe ceiling taken from the sector and the
/// company's own valuation history.
///
/// The tier comes from the safety margin; the drivers tag explains why the
/// multiple sits where it does relative to the sector.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "P/E Safety Margin",
        family: MetricFamily::Valuation,
        methodology: "Static PE = price / trailing EPS; safe ceiling = min(industry PE x premium, historical 75th percentile PE); margin = (ceiling - PE) / PE",
        inputs: vec![
            InputSpec::required("share_price", "Share price", Constraint::Positive),
            InputSpec::required("eps_ttm", "Trailing twelve-month EPS", Constraint::Positive),
            InputSpec::required("industry_pe", "Industry average static PE", Constraint::Positive),
            InputSpec::required("historical_pe_p75", "Historical 75th percentile PE", Constraint::Positive),
            InputSpec::required(
                "eps_growth_pct",
                "Forecast annual EPS growth (%)",
                Constraint::AtLeast(dec!(-100)),
            ),
            InputSpec::optional(
                "industry_growth_pct",
                "Industry average EPS growth (%)",
                Constraint::Unbounded,
            ),
        ],
        dimensions: Vec::new(),
        precision: Precision::new(Unit::Multiple, 2),
        formula,
        cross_checks: Vec::new(),
        stress: None,
        tiers: vec![UNDERVALUED, FAIR, OVERVALUED],
        rules: rules(),
        drivers: Some(DriverFormula::Comparative { rules: driver_rules() }),
        advisories: Some(advisories),
    }
}

pub fn parameters() -> MetricParameters {
    MetricParameters::new(constants(&[
        ("safe_pe_premium", dec!(1.2)),
        ("undervalued_margin_pct", dec!(20)),
        ("overvalued_margin_pct", dec!(-10)),
        ("premium_multiple", dec!(1.5)),
        ("discount_multiple", dec!(0.8)),
        ("growth_proxy_factor", dec!(0.5)),
    ]))
}

fn rules() -> RuleSet {
    let margin = || Operand::figure("safety_margin_pct");
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![margin().gt(Operand::param("undervalued_margin_pct"))],
                UNDERVALUED,
                "Safety margin above 20%: the share looks undervalued.",
            ),
            ThresholdRule::new(
                vec![margin().ge(Operand::param("overvalued_margin_pct"))],
                FAIR,
                "Safety margin within range: the valuation is reasonable.",
            ),
        ],
        Outcome::new(
            OVERVALUED,
            "Safety margin below -10%: the share looks overvalued; beware of chasing the price.",
        ),
    )
}

fn driver_rules() -> RuleSet {
    let above_premium = || Operand::Base.gt(Operand::figure("premium_bound"));
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![
                    above_premium(),
                    Operand::figure("eps_growth_pct").gt(Operand::figure("growth_benchmark_pct")),
                ],
                GROWTH_PREMIUM,
                "PE is well above the sector because the market expects fast earnings growth; check the growth can be delivered.",
            ),
            ThresholdRule::new(
                vec![above_premium()],
                RISK_PREMIUM,
                "PE is well above the sector without growth to support it; possible valuation bubble or liquidity premium.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.lt(Operand::figure("discount_bound"))],
                DISCOUNT,
                "PE is below the sector, likely on slowing growth or risk concerns; check whether fundamentals are deteriorating.",
            ),
        ],
        Outcome::new(IN_LINE, "PE is in line with the sector; no clear deviation."),
    )
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

fn formula(profile: &Profile, params: &ParameterSet) -> Computation {
    let industry_pe = profile.amount("industry_pe");
    let growth = profile.amount("eps_growth_pct");

    let pe = divide(profile.amount("share_price"), profile.amount("eps_ttm"));
    let ceiling = (industry_pe * params.value("safe_pe_premium")).min(profile.amount("historical_pe_p75"));

    let mut computation = Computation::new(pe)
        .figure("pe_dynamic", Unit::Multiple, 2, dynamic_pe(pe, growth))
        .amount("safe_pe_ceiling", Unit::Multiple, 2, ceiling)
        .amount("premium_bound", Unit::Multiple, 2, industry_pe * params.value("premium_multiple"))
        .amount("discount_bound", Unit::Multiple, 2, industry_pe * params.value("discount_multiple"))
        .amount("eps_growth_pct", Unit::Percent, 2, growth)
        .amount("growth_benchmark_pct", Unit::Percent, 2, growth_benchmark(profile, params));

    if let Some(pe) = pe.finite() {
        computation = computation.figure(
            "safety_margin_pct",
            Unit::Percent,
            1,
            divide(ceiling - pe, pe).scaled(HUNDRED),
        );
    }
    computation
}

/// PE on next year's earnings: `pe / (1 + growth%)`.
fn dynamic_pe(pe: Ratio, growth_pct: Decimal) -> Ratio {
    match pe.scaled(HUNDRED) {
        Ratio::Finite(scaled) => divide(scaled, HUNDRED + growth_pct),
        saturated => saturated,
    }
}

/// Industry growth when supplied, otherwise the legacy proxy of a fraction
/// of the industry PE.
fn growth_benchmark(profile: &Profile, params: &ParameterSet) -> Decimal {
    profile
        .optional("industry_growth_pct")
        .unwrap_or_else(|| profile.amount("industry_pe") * params.value("growth_proxy_factor"))
}

fn advisories(profile: &Profile, base: &BaseResult, _params: &ParameterSet) -> Vec<String> {
    let mut notes = Vec::new();
    if profile.optional("industry_growth_pct").is_none() {
        notes.push(
            "No industry growth supplied; the growth benchmark is proxied from the industry PE, which compares a multiple with a percentage."
                .to_string(),
        );
    }
    if !base.value.is_saturated() && base.figure("pe_dynamic").is_some_and(|r| r.is_saturated()) {
        notes.push("Dynamic PE is saturated: forward earnings are zero or beyond range at this EPS growth.".to_string());
    }
    notes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
