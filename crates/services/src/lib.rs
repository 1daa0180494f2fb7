#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod quiz;

pub use quiz_core::{Clock, QuizConfig};

pub use context::QuizContext;
pub use error::ContextError;
pub use quiz::{QuizStateView, SessionObserver, SessionPersister, SessionStore};
