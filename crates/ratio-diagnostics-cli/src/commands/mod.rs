pub mod catalogue;
pub mod evaluate;

use ratio_diagnostics_core::engine::parameters::ParameterTable;
use ratio_diagnostics_core::Engine;

use crate::input;

/// Engine over the bundled constants, with an optional override file laid
/// on top value by value.
pub fn build_engine(parameters: Option<&str>) -> Result<Engine, Box<dyn std::error::Error>> {
    let table = match parameters {
        Some(path) => ParameterTable::bundled().with_overrides(input::file::read_parameter_table(path)?),
        None => ParameterTable::bundled(),
    };
    Ok(Engine::new(table))
}
