use quiz_core::model::QuizSession;
use storage::QuizStateRepository;

/// Read-only view of the state handed to observers after a transition.
#[derive(Debug, Clone, Copy)]
pub struct QuizStateView<'a> {
    pub session: &'a QuizSession,
    pub started: bool,
}

impl QuizStateView<'_> {
    /// Whether the session should be written to storage in this state.
    ///
    /// A restored attempt that the user has not resumed stays untouched on disk
    /// until it is started or completed.
    #[must_use]
    pub fn should_persist(&self) -> bool {
        self.started || self.session.is_completed()
    }
}

/// Receives every change of the session or the started flag.
pub trait SessionObserver {
    fn on_change(&mut self, state: &QuizStateView<'_>);
}

impl<F> SessionObserver for F
where
    F: FnMut(&QuizStateView<'_>),
{
    fn on_change(&mut self, state: &QuizStateView<'_>) {
        self(state);
    }
}

/// Writes the full session to the session slot whenever the state calls for it.
pub struct SessionPersister {
    repository: QuizStateRepository,
}

impl SessionPersister {
    #[must_use]
    pub fn new(repository: QuizStateRepository) -> Self {
        Self { repository }
    }
}

impl SessionObserver for SessionPersister {
    fn on_change(&mut self, state: &QuizStateView<'_>) {
        if !state.should_persist() {
            tracing::trace!("session not started; skipping persist");
            return;
        }
        if let Err(err) = self.repository.save_session(state.session) {
            tracing::error!(error = %err, "failed to persist quiz session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionCatalog, QuestionId};

    fn session() -> QuizSession {
        let catalog = QuestionCatalog::new(vec![Question::new(
            QuestionId::new(1),
            "Q",
            vec!["a".into(), "b".into()],
            0,
        )])
        .unwrap();
        QuizSession::fresh(&catalog, 1_000, 1)
    }

    #[test]
    fn persists_only_when_started_or_completed() {
        let repo = QuizStateRepository::in_memory();
        let mut persister = SessionPersister::new(repo.clone());
        let mut session = session();

        persister.on_change(&QuizStateView {
            session: &session,
            started: false,
        });
        assert_eq!(repo.load_session().unwrap(), None);

        persister.on_change(&QuizStateView {
            session: &session,
            started: true,
        });
        assert_eq!(repo.load_session().unwrap().as_ref(), Some(&session));

        repo.clear_session().unwrap();
        session.complete();
        persister.on_change(&QuizStateView {
            session: &session,
            started: false,
        });
        assert_eq!(repo.load_session().unwrap(), Some(session));
    }
}
