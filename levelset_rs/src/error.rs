//! Error types for levelset_rs.

use thiserror::Error;

/// Errors that can occur while building or querying level sets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LevelSetError {
    /// Requested resolution ratio is not covered by any level of a hierarchy.
    #[error("resolution ratio {h_ratio} outside hierarchy range [{min}, {max}]")]
    LevelOutOfRange {
        /// The requested ratio.
        h_ratio: f32,
        /// Ratio of the coarsest level.
        min: f32,
        /// Ratio of the finest level.
        max: f32,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Bounding box is empty, inverted or not finite.
    #[error("invalid bounds: box must be finite with positive extent on every axis")]
    InvalidBounds,

    /// A hierarchy was requested with zero levels.
    #[error("multilevel level set needs at least one level")]
    EmptyHierarchy,
}

impl LevelSetError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for levelset_rs operations.
pub type Result<T> = std::result::Result<T, LevelSetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LevelSetError::LevelOutOfRange {
            h_ratio: 9.0,
            min: 1.0,
            max: 4.0,
        };
        assert_eq!(
            err.to_string(),
            "resolution ratio 9 outside hierarchy range [1, 4]"
        );
        assert_eq!(
            LevelSetError::config("spacing must be positive").to_string(),
            "invalid configuration: spacing must be positive"
        );
    }
}
