use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown metric: {0} (expected 'cosine' or 'euclidean')")]
    UnknownMetric(String),

    #[error("Unknown role: {0} (expected goalkeeper, defender, midfielder or forward)")]
    UnknownRole(String),

    #[error("Invalid weight for feature '{feature}': {weight} (weights must be finite and > 0)")]
    InvalidWeight { feature: String, weight: f32 },

    #[error("Invalid boost factor: {0} (must be finite and > 0)")]
    InvalidBoost(f32),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Query record not found: {0}")]
    QueryNotFound(String),

    #[error("Feature column not found: {0}")]
    UnknownFeature(String),

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("No feature columns provided or found (expected *_z columns)")]
    NoFeatures,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Table is empty")]
    EmptyTable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse error classes: configuration errors are rejected before any
/// computation, data errors are rejected per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Data,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownMetric(_)
            | Error::UnknownRole(_)
            | Error::InvalidWeight { .. }
            | Error::InvalidBoost(_)
            | Error::InvalidFilter(_)
            | Error::InvalidConfig(_) => ErrorKind::Configuration,
            Error::QueryNotFound(_)
            | Error::UnknownFeature(_)
            | Error::UnknownColumn(_)
            | Error::NoFeatures
            | Error::DimensionMismatch { .. }
            | Error::EmptyTable => ErrorKind::Data,
            Error::Io(_) | Error::Serialization(_) => ErrorKind::Io,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::UnknownMetric("manhattan".into()).kind(), ErrorKind::Configuration);
        assert_eq!(Error::UnknownRole("libero".into()).kind(), ErrorKind::Configuration);
        assert_eq!(Error::QueryNotFound("p1".into()).kind(), ErrorKind::Data);
        assert_eq!(Error::NoFeatures.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_error_messages() {
        let err = Error::DimensionMismatch { expected: 3, actual: 2 };
        assert_eq!(err.to_string(), "Invalid vector dimension: expected 3, got 2");
    }
}
