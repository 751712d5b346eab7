pub mod eva;
pub mod roce;
pub mod roi_ri;
