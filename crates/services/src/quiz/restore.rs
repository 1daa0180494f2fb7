use quiz_core::model::{QuestionCatalog, QuizSession, UserIdentity};
use quiz_core::{Clock, QuizConfig};
use storage::QuizStateRepository;

/// State recovered from storage at store construction.
#[derive(Debug)]
pub(crate) struct RestoredState {
    pub session: QuizSession,
    pub user: Option<UserIdentity>,
    pub started: bool,
}

/// Read the three slots, substituting defaults for anything missing or unusable.
pub(crate) fn restore(
    repository: &QuizStateRepository,
    catalog: &QuestionCatalog,
    clock: &Clock,
    config: &QuizConfig,
) -> RestoredState {
    let now = clock.now_epoch_ms();
    let session = restore_session(repository, catalog, now, config.duration_ms());

    let user = repository.load_user().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "discarding unreadable user identity");
        None
    });

    let started = if session.is_completed() {
        // Drop a flag left behind by an attempt that finished elsewhere.
        if let Err(err) = repository.clear_started() {
            tracing::warn!(error = %err, "could not clear stale started flag");
        }
        false
    } else {
        repository.load_started().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not read started flag; assuming not started");
            false
        })
    };

    RestoredState {
        session,
        user,
        started,
    }
}

fn restore_session(
    repository: &QuizStateRepository,
    catalog: &QuestionCatalog,
    now: i64,
    duration_ms: u64,
) -> QuizSession {
    match repository.load_session() {
        Ok(Some(mut session)) if session.is_shape_compatible(catalog) => {
            session.normalize();
            session.backfill_start_time(now);
            tracing::debug!(
                answered = session.answered_count(),
                completed = session.is_completed(),
                "restored quiz session"
            );
            session
        }
        Ok(Some(stale)) => {
            tracing::warn!(
                persisted = stale.answers().len(),
                catalog = catalog.len(),
                "persisted session does not match the question catalog; starting fresh"
            );
            QuizSession::fresh(catalog, duration_ms, now)
        }
        Ok(None) => QuizSession::fresh(catalog, duration_ms, now),
        Err(err) => {
            tracing::warn!(error = %err, "discarding unreadable quiz session");
            QuizSession::fresh(catalog, duration_ms, now)
        }
    }
}
