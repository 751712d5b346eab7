pub mod inventory_turnover;
