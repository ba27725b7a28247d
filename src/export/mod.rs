pub mod error;
pub mod local_csv;
pub mod sink;
