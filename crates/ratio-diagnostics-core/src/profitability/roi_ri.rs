use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calculator::{divide, BaseResult, Computation};
use crate::engine::classifier::{Operand, Outcome, RuleSet, ThresholdRule};
use crate::engine::definition::{
    CategoryDimension, CategoryOption, Constraint, InputSpec, MetricDefinition, MetricFamily, Precision,
};
use crate::engine::drivers::{DriverFormula, DriverTerm};
use crate::engine::parameters::{constants, DimensionParameters, MetricParameters, ParameterSet};
use crate::engine::validator::Profile;
use crate::types::Unit;

pub const KEY: &str = "roi_ri";

pub const VALUE_CREATING: &str = "value_creating";
pub const SCALE_CONFLICT: &str = "scale_conflict";
pub const SIZE_CONFLICT: &str = "size_conflict";
pub const VALUE_DESTROYING: &str = "value_destroying";

const HUNDRED: Decimal = dec!(100);

/// ROI read together with residual income, so that neither the rate nor
/// the absolute amount alone decides an investment.
pub fn definition() -> MetricDefinition {
    MetricDefinition {
        key: KEY,
        title: "ROI and Residual Income",
        family: MetricFamily::Profitability,
        methodology: "ROI = profit / investment; RI = profit - investment x cost of capital",
        inputs: vec![
            InputSpec::required("profit", "Project annual profit", Constraint::Positive),
            InputSpec::required("investment", "Project investment", Constraint::Positive),
        ],
        dimensions: vec![CategoryDimension {
            name: "industry",
            description: "Industry risk class, sets the cost of capital",
            options: vec![
                CategoryOption {
                    key: "high_tech",
                    label: "High tech",
                    menu: "1",
                    aliases: &["高科技"],
                },
                CategoryOption {
                    key: "manufacturing",
                    label: "Manufacturing",
                    menu: "2",
                    aliases: &["制造业"],
                },
                CategoryOption {
                    key: "services",
                    label: "Services",
                    menu: "3",
                    aliases: &["服务业"],
                },
                CategoryOption {
                    key: "real_estate",
                    label: "Real estate",
                    menu: "4",
                    aliases: &["房地产"],
                },
            ],
            default_key: "manufacturing",
        }],
        precision: Precision::new(Unit::Percent, 2),
        formula,
        cross_checks: Vec::new(),
        stress: None,
        tiers: vec![VALUE_CREATING, SCALE_CONFLICT, SIZE_CONFLICT, VALUE_DESTROYING],
        rules: rules(),
        drivers: Some(DriverFormula::Additive { terms: drivers }),
        advisories: None,
    }
}

pub fn parameters() -> MetricParameters {
    let coc = |v: Decimal| constants(&[("cost_of_capital_pct", v)]);
    MetricParameters::default().dimension(
        "industry",
        DimensionParameters::new(coc(dec!(8)))
            .category("high_tech", coc(dec!(12)))
            .category("manufacturing", coc(dec!(8)))
            .category("services", coc(dec!(6.5)))
            .category("real_estate", coc(dec!(10))),
    )
}

fn rules() -> RuleSet {
    let coc = || Operand::param("cost_of_capital_pct");
    let ri_positive = || Operand::figure("ri").gt(Operand::Const(Decimal::ZERO));
    RuleSet::new(
        vec![
            ThresholdRule::new(
                vec![Operand::Base.gt(coc()), ri_positive()],
                VALUE_CREATING,
                "ROI beats the cost of capital and RI is positive: the project creates excess value; invest.",
            ),
            ThresholdRule::new(
                vec![Operand::Base.gt(coc())],
                SCALE_CONFLICT,
                "ROI beats the cost of capital but RI is not positive: the capital charge on a large outlay eats the profit.",
            ),
            ThresholdRule::new(
                vec![ri_positive()],
                SIZE_CONFLICT,
                "ROI misses the cost of capital but RI is positive: a small outlay lets the profit cover its capital charge.",
            ),
        ],
        Outcome::new(
            VALUE_DESTROYING,
            "Neither ROI nor RI clears the cost of capital: the project creates no excess value; do not invest.",
        ),
    )
}

fn formula(profile: &Profile, params: &ParameterSet) -> Computation {
    let profit = profile.amount("profit");
    let investment = profile.amount("investment");
    let coc = params.value("cost_of_capital_pct");

    let roi = divide(profit, investment).scaled(HUNDRED);
    let mut computation = Computation::new(roi)
        .amount("cost_of_capital_pct", Unit::Percent, 2, coc)
        .amount("ri", Unit::Money, 2, profit - investment * coc / HUNDRED);
    if let Some(excess) = roi.finite().and_then(|r| r.checked_sub(coc)) {
        computation = computation.amount("excess_return_pp", Unit::Percent, 2, excess);
    }
    computation
}

fn drivers(base: &BaseResult, _params: &ParameterSet) -> Option<Vec<DriverTerm>> {
    Some(vec![
        DriverTerm::new("Cost of capital", base.amount("cost_of_capital_pct")?),
        DriverTerm::new("Excess return", base.amount("excess_return_pp")?),
    ])
}
