//! Shared error types for the services crate.

use thiserror::Error;

/// Errors raised when the presentation layer reaches for the quiz store.
///
/// These indicate a wiring bug at the composition root, never a user condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    #[error("quiz store must be used within a QuizProvider")]
    MissingProvider,
    #[error("quiz store is already borrowed by another caller")]
    AlreadyBorrowed,
}
