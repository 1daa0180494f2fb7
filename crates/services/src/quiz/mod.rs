mod observer;
mod restore;
mod store;

// Public API of the quiz subsystem.
pub use observer::{QuizStateView, SessionObserver, SessionPersister};
pub use store::SessionStore;
