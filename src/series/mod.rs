pub mod catalog;
pub mod error;
pub mod grid;
pub mod loader;
pub mod query;
pub mod rename;

#[cfg(test)]
pub(crate) mod fixtures;
