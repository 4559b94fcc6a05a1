//! Error types for hybrid-hashmap.

use thiserror::Error;

/// Result type alias for fallible map operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by construction and fail-fast traversal.
///
/// Absent keys are never errors; lookups report them as `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Load factor was zero, negative or NaN.
    #[error("illegal load factor: {0}")]
    IllegalLoadFactor(f32),

    /// The map was structurally modified after a cursor took its snapshot.
    #[error("map was structurally modified during traversal")]
    ConcurrentModification,

    /// Cursor removal was requested with no current entry.
    #[error("cursor has no current entry to remove")]
    IllegalState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_condition() {
        assert_eq!(
            Error::IllegalLoadFactor(-1.0).to_string(),
            "illegal load factor: -1"
        );
        assert_eq!(
            Error::ConcurrentModification.to_string(),
            "map was structurally modified during traversal"
        );
        assert!(Error::IllegalState.to_string().contains("no current entry"));
    }
}
