//! Error types shared by the hash-index-backed containers.

use core::fmt;

/// Returned by unique inserts when an equal key is already present.
///
/// The container is left untouched: length, stored keys and stored values are
/// exactly as they were before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    DuplicateKey,
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::DuplicateKey => f.write_str("an equal key is already present"),
        }
    }
}

impl std::error::Error for InsertError {}

/// Returned by `get` when the key is absent. `try_get` reports absence as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    NotFound,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::NotFound => f.write_str("the given key was not present"),
        }
    }
}

impl std::error::Error for LookupError {}
