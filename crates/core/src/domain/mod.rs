pub mod distribution;
pub mod inputs;
pub mod line_item;
pub mod region;
