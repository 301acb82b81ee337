//! Error types for beaconfield

use crate::faction::FactionId;
use crate::geometry::Point;
use thiserror::Error;

/// Caller errors and ambient failures.
///
/// Game-rule conflicts (degree limit, duplicate link, overlapping or crossing
/// fields) are not errors; they come back as data in
/// [`LinkResult`](crate::link::LinkResult) and [`Rejection`](crate::field::Rejection).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Not a beacon: {0}")]
    NotABeacon(Point),
    #[error("Ownership mismatch: {point} is owned by {actual:?}, expected {expected}")]
    OwnershipMismatch {
        point: Point,
        expected: FactionId,
        actual: Option<FactionId>,
    },
    #[error("Cannot link beacon {0} to itself")]
    SelfLink(Point),
    #[error("Unknown faction: {0}")]
    UnknownFaction(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::DatabaseError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, EngineError>;
