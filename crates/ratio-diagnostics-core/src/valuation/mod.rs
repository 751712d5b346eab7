pub mod pe_safety_margin;
