use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("Date range [{start}, {end}) is empty")]
    EmptyDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to parse date '{0}', expected YYYY-MM-DD")]
    DateParse(String, #[source] chrono::ParseError),

    #[error("Variable list is empty")]
    EmptyVariables,

    #[error("Variable '{0}' is requested more than once")]
    DuplicateVariable(String),

    #[error("Station and basin prefixes must differ, both are '{0}'")]
    PrefixCollision(String),

    #[error("{name} must be a positive finite number of meters, got {value}")]
    InvalidMeters { name: &'static str, value: f64 },

    #[error("Pixel budget must be greater than zero")]
    ZeroPixelBudget,
}
