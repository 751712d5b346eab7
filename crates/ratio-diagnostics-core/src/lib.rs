pub mod catalogue;
pub mod engine;
pub mod error;
pub mod types;

#[cfg(feature = "profitability")]
pub mod profitability;

#[cfg(feature = "liquidity")]
pub mod liquidity;

#[cfg(feature = "solvency")]
pub mod solvency;

#[cfg(feature = "efficiency")]
pub mod efficiency;

#[cfg(feature = "valuation")]
pub mod valuation;

pub use engine::pipeline::{evaluate, DiagnosticResult, Engine};
pub use engine::request::{MetricRequest, RawValue};
pub use error::DiagnosticsError;
pub use types::*;

/// Standard result type for all ratio-diagnostics operations
pub type DiagnosticsResult<T> = Result<T, DiagnosticsError>;
