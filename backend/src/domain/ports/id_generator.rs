//! Port for allocating 64-bit identifiers.

/// Source of unique, positive identifiers.
pub trait IdGenerator: Send + Sync {
    /// Allocate the next identifier.
    fn next_id(&self) -> i64;
}
