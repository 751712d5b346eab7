//! The tiered ratio diagnostic pipeline.
//!
//! Every metric runs the same stages: validate the raw request into a
//! [`validator::Profile`], resolve category constants from the
//! [`parameters::ParameterTable`], compute the base ratio, optionally apply a
//! stress shock, classify the (base, stress) pair against ordered threshold
//! rules, and decompose the result into drivers.

pub mod calculator;
pub mod classifier;
pub mod definition;
pub mod drivers;
pub mod parameters;
pub mod pipeline;
pub mod request;
pub mod scenario;
pub mod validator;
