pub mod interest_coverage;
