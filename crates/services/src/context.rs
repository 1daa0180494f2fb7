use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use crate::error::ContextError;
use crate::quiz::SessionStore;

/// Handle the presentation layer uses to reach the single live quiz store.
///
/// The composition root builds the store and wraps it with [`QuizContext::provide`];
/// clones share that store. A default context holds nothing, and every access
/// through it fails with [`ContextError::MissingProvider`].
#[derive(Clone, Default)]
pub struct QuizContext {
    store: Option<Rc<RefCell<SessionStore>>>,
}

impl QuizContext {
    #[must_use]
    pub fn provide(store: SessionStore) -> Self {
        Self {
            store: Some(Rc::new(RefCell::new(store))),
        }
    }

    #[must_use]
    pub fn is_provided(&self) -> bool {
        self.store.is_some()
    }

    /// Borrow the store for one call site.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::MissingProvider` if no store was provided, and
    /// `ContextError::AlreadyBorrowed` if another borrow is still alive.
    pub fn use_quiz(&self) -> Result<RefMut<'_, SessionStore>, ContextError> {
        let store = self.store.as_ref().ok_or(ContextError::MissingProvider)?;
        store
            .try_borrow_mut()
            .map_err(|_| ContextError::AlreadyBorrowed)
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionCatalog, QuestionId};
    use quiz_core::time::fixed_clock;
    use quiz_core::QuizConfig;
    use storage::QuizStateRepository;

    fn provided() -> QuizContext {
        let catalog = QuestionCatalog::new(vec![Question::new(
            QuestionId::new(1),
            "Q",
            vec!["yes".into(), "no".into()],
            0,
        )])
        .unwrap();
        QuizContext::provide(SessionStore::new(
            catalog,
            QuizStateRepository::in_memory(),
            fixed_clock(),
            QuizConfig::default(),
        ))
    }

    #[test]
    fn missing_provider_fails_fast() {
        let ctx = QuizContext::default();
        assert!(!ctx.is_provided());
        let err = ctx.use_quiz().err().unwrap();
        assert_eq!(err, ContextError::MissingProvider);
        assert_eq!(
            err.to_string(),
            "quiz store must be used within a QuizProvider"
        );
    }

    #[test]
    fn clones_share_one_store() {
        let ctx = provided();
        let other = ctx.clone();

        ctx.use_quiz().unwrap().update_answer(QuestionId::new(1), Some(0));
        assert_eq!(other.use_quiz().unwrap().calculate_score(), 1);
    }

    #[test]
    fn overlapping_borrows_are_reported() {
        let ctx = provided();
        let _held = ctx.use_quiz().unwrap();
        assert_eq!(
            ctx.use_quiz().err(),
            Some(ContextError::AlreadyBorrowed)
        );
    }
}
