pub mod date_range;
pub mod error;
pub mod geometry;
pub mod parameters;
pub mod variable;
