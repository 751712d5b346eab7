//! Registry of compiled-in metrics and their bundled constants.

use crate::engine::definition::MetricDefinition;
use crate::engine::parameters::{MetricParameters, ParameterTable};

type Entry = (fn() -> MetricDefinition, fn() -> MetricParameters);

fn entries() -> Vec<Entry> {
    #[allow(unused_mut)]
    let mut entries: Vec<Entry> = Vec::new();

    #[cfg(feature = "profitability")]
    {
        use crate::profitability::{eva, roce, roi_ri};
        entries.push((eva::definition, eva::parameters));
        entries.push((roce::definition, roce::parameters));
        entries.push((roi_ri::definition, roi_ri::parameters));
    }

    #[cfg(feature = "liquidity")]
    {
        use crate::liquidity::{cash_ratio, current_ratio, quick_ratio};
        entries.push((current_ratio::definition, current_ratio::parameters));
        entries.push((quick_ratio::definition, quick_ratio::parameters));
        entries.push((cash_ratio::definition, cash_ratio::parameters));
    }

    #[cfg(feature = "solvency")]
    {
        use crate::solvency::interest_coverage;
        entries.push((interest_coverage::definition, interest_coverage::parameters));
    }

    #[cfg(feature = "efficiency")]
    {
        use crate::efficiency::inventory_turnover;
        entries.push((inventory_turnover::definition, inventory_turnover::parameters));
    }

    #[cfg(feature = "valuation")]
    {
        use crate::valuation::pe_safety_margin;
        entries.push((pe_safety_margin::definition, pe_safety_margin::parameters));
    }

    entries
}

/// Every compiled-in metric definition, in catalogue order.
pub fn definitions() -> Vec<MetricDefinition> {
    entries().into_iter().map(|(definition, _)| definition()).collect()
}

/// The constants shipped with the crate.
pub fn bundled_parameters() -> ParameterTable {
    let mut table = ParameterTable::default();
    for (definition, parameters) in entries() {
        table.insert(definition().key, parameters());
    }
    table
}

/// Canonical form of a metric key: lower case, `-` and spaces as `_`.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}
