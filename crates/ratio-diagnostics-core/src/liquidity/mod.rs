pub mod cash_ratio;
pub mod current_ratio;
pub mod quick_ratio;
