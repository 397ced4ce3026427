use thiserror::Error;

/// Failures reported by the rating engine. The engine never logs or prints;
/// callers decide what to do with these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no data: the match sequence is empty")]
    NoData,

    #[error("invalid week count {requested}, maximum is {max}")]
    InvalidCutoff { requested: usize, max: usize },

    #[error("invalid match count {requested}, maximum is {max}")]
    InvalidMatchCutoff { requested: usize, max: usize },

    #[error("match {index} ({home} vs {away}) is missing {field}")]
    MissingField {
        index: usize,
        home: String,
        away: String,
        field: &'static str,
    },

    #[error("match {index} ({home} vs {away}) has invalid {field}: {value}")]
    InvalidField {
        index: usize,
        home: String,
        away: String,
        field: &'static str,
        value: String,
    },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}
