use quiz_core::model::{Question, QuestionCatalog, QuestionId, QuizSession, UserIdentity};
use quiz_core::{Clock, QuizConfig};
use storage::QuizStateRepository;

use super::observer::{QuizStateView, SessionObserver, SessionPersister};
use super::restore::restore;

/// Owns the quiz attempt, the user identity and the started flag, and keeps
/// them in step with a key-value store.
///
/// Every change to the session or the started flag goes through one transition
/// that re-derives `started` and notifies the observers; the session persister
/// is always the first of them.
pub struct SessionStore {
    questions: QuestionCatalog,
    repository: QuizStateRepository,
    clock: Clock,
    config: QuizConfig,
    user: Option<UserIdentity>,
    started: bool,
    session: QuizSession,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl SessionStore {
    /// Build a store, restoring whatever usable state the repository holds.
    ///
    /// Never fails: unreadable or stale slots are logged and replaced by defaults.
    #[must_use]
    pub fn new(
        questions: QuestionCatalog,
        repository: QuizStateRepository,
        clock: Clock,
        config: QuizConfig,
    ) -> Self {
        let restored = restore(&repository, &questions, &clock, &config);
        let persister = SessionPersister::new(repository.clone());

        let mut store = Self {
            questions,
            repository,
            clock,
            config,
            user: restored.user,
            started: restored.started,
            session: restored.session,
            observers: vec![Box::new(persister)],
        };
        // Evaluate the persistence rule once for the restored state.
        store.notify();
        store
    }

    /// Register an additional observer of session transitions.
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionCatalog {
        &self.questions
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Alias of [`SessionStore::session`].
    #[must_use]
    pub fn quiz_state(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.session.current_question_index())
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.session.answered_count()
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.session.is_last_question()
    }

    pub fn set_user(&mut self, user: UserIdentity) {
        if let Err(err) = self.repository.save_user(&user) {
            tracing::error!(error = %err, "failed to persist user identity");
        }
        self.user = Some(user);
    }

    /// Begin or resume the attempt. A completed attempt is replaced by a fresh one.
    pub fn start_quiz(&mut self) {
        if let Err(err) = self.repository.mark_started() {
            tracing::error!(error = %err, "failed to persist started flag");
        }

        let now = self.clock.now_epoch_ms();
        let duration_ms = self.config.duration_ms();
        let fresh = QuizSession::fresh(&self.questions, duration_ms, now);
        self.transition(move |session, started| {
            if session.is_completed() {
                *session = fresh;
            } else {
                session.backfill_start_time(now);
                session.backfill_timer(duration_ms);
            }
            *started = true;
        });
        tracing::info!(
            answered = self.session.answered_count(),
            time_remaining_ms = self.session.time_remaining_ms(),
            "quiz started"
        );
    }

    /// Record `choice` for `question_id`, or clear it with `None`. Unknown ids are ignored.
    pub fn update_answer(&mut self, question_id: QuestionId, choice: Option<usize>) {
        self.transition(|session, _| session.answer(question_id, choice));
    }

    /// Jump to `index`; out-of-range indices leave the pointer where it is.
    pub fn go_to_question(&mut self, index: usize) {
        self.transition(|session, _| session.go_to(index));
    }

    pub fn next_question(&mut self) {
        self.transition(|session, _| session.next());
    }

    pub fn previous_question(&mut self) {
        self.transition(|session, _| session.previous());
    }

    /// Move past the current question unless it is the last one.
    pub fn skip_question(&mut self) {
        self.transition(|session, _| {
            if !session.is_last_question() {
                session.next();
            }
        });
    }

    /// Finish the attempt. The session slot keeps the completed results.
    pub fn submit_quiz(&mut self) {
        self.transition(|session, started| {
            session.complete();
            *started = false;
        });
        if let Err(err) = self.repository.clear_started() {
            tracing::error!(error = %err, "failed to clear started flag");
        }
        tracing::info!(
            score = self.calculate_score(),
            total = self.questions.len(),
            "quiz submitted"
        );
    }

    /// Discard the attempt and every persisted slot, including the user.
    pub fn reset_quiz(&mut self) {
        let fresh = QuizSession::fresh(
            &self.questions,
            self.config.duration_ms(),
            self.clock.now_epoch_ms(),
        );
        self.transition(move |session, started| {
            *session = fresh;
            *started = false;
        });

        let cleared = self
            .repository
            .clear_session()
            .and_then(|()| self.repository.clear_started())
            .and_then(|()| self.repository.clear_user());
        if let Err(err) = cleared {
            tracing::error!(error = %err, "failed to clear persisted quiz state");
        }
        self.user = None;
        tracing::info!("quiz reset");
    }

    /// Set the countdown. Ignored once the attempt is completed.
    pub fn update_timer(&mut self, ms: u64) {
        self.transition(|session, _| session.set_time_remaining(ms));
    }

    /// Indices of unanswered questions, in catalog order.
    #[must_use]
    pub fn unanswered_questions(&self) -> Vec<usize> {
        self.session.unanswered_indices()
    }

    /// Number of correct answers so far. Available mid-attempt as a preview.
    #[must_use]
    pub fn calculate_score(&self) -> usize {
        self.session.score(&self.questions)
    }

    fn transition(&mut self, mutate: impl FnOnce(&mut QuizSession, &mut bool)) {
        let before_session = self.session.clone();
        let before_started = self.started;

        mutate(&mut self.session, &mut self.started);
        // A completed attempt is never in progress.
        self.started = self.started && !self.session.is_completed();

        if self.session != before_session || self.started != before_started {
            self.notify();
        }
    }

    fn notify(&mut self) {
        let view = QuizStateView {
            session: &self.session,
            started: self.started,
        };
        for observer in &mut self.observers {
            observer.on_change(&view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn catalog() -> QuestionCatalog {
        QuestionCatalog::new(
            [1, 2, 0]
                .into_iter()
                .zip(1_u64..)
                .map(|(correct, id)| {
                    Question::new(
                        QuestionId::new(id),
                        format!("Q{id}"),
                        vec!["a".into(), "b".into(), "c".into()],
                        correct,
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn store() -> SessionStore {
        SessionStore::new(
            catalog(),
            QuizStateRepository::in_memory(),
            fixed_clock(),
            QuizConfig::default(),
        )
    }

    #[test]
    fn observers_only_hear_real_changes() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(Box::new(move |state: &QuizStateView<'_>| {
            sink.borrow_mut()
                .push((state.session.current_question_index(), state.started));
        }));

        store.previous_question();
        store.go_to_question(9);
        assert!(seen.borrow().is_empty());

        store.next_question();
        store.start_quiz();
        assert_eq!(*seen.borrow(), vec![(1, false), (1, true)]);
    }

    #[test]
    fn skip_moves_forward_until_last() {
        let mut store = store();
        store.skip_question();
        store.skip_question();
        assert_eq!(store.session().current_question_index(), 2);
        store.skip_question();
        assert_eq!(store.session().current_question_index(), 2);
        assert!(store.is_last_question());
    }

    #[test]
    fn current_question_follows_pointer() {
        let mut store = store();
        store.go_to_question(1);
        assert_eq!(
            store.current_question().map(Question::id),
            Some(QuestionId::new(2))
        );
    }

    #[test]
    fn start_after_submit_begins_a_fresh_attempt() {
        let mut store = store();
        store.start_quiz();
        store.update_answer(QuestionId::new(1), Some(1));
        store.submit_quiz();
        assert!(!store.started());

        store.start_quiz();
        assert!(store.started());
        assert!(!store.session().is_completed());
        assert_eq!(store.answered_count(), 0);
        assert_eq!(
            store.session().time_remaining_ms(),
            store.config().duration_ms()
        );
    }

    #[test]
    fn start_keeps_a_running_timer() {
        let mut store = store();
        store.update_timer(42_000);
        store.start_quiz();
        assert_eq!(store.session().time_remaining_ms(), 42_000);

        store.update_timer(0);
        store.start_quiz();
        assert_eq!(
            store.session().time_remaining_ms(),
            store.config().duration_ms()
        );
    }

    #[test]
    fn score_is_available_mid_attempt() {
        let mut store = store();
        store.update_answer(QuestionId::new(1), Some(1));
        assert_eq!(store.calculate_score(), 1);
        assert!(!store.session().is_completed());
    }
}
