pub mod error;
pub mod feature_catalog;
pub mod resolver;
