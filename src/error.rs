//! Error type for fallible lookups.

use thiserror::Error;

/// Returned by [`LinkedRobinMap::at`](crate::LinkedRobinMap::at) and
/// [`LinkedRobinMap::at_mut`](crate::LinkedRobinMap::at_mut).
///
/// Every other operation treats a missing key as an ordinary outcome.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    #[error("key not found")]
    NotFound,
}
