use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{Answer, QuestionCatalog, QuestionId};

/// Mutable state of one quiz attempt.
///
/// `answers` holds exactly one entry per catalog question, in catalog order. The index
/// helpers below rely on that shape and clamp against `answers.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    current_question_index: usize,
    answers: Vec<Answer>,
    #[serde(rename = "timeRemaining")]
    time_remaining_ms: u64,
    is_completed: bool,
    #[serde(
        rename = "startTime",
        default,
        deserialize_with = "deserialize_start_time"
    )]
    start_time_epoch_ms: Option<i64>,
}

fn deserialize_start_time<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.filter(|ms| *ms != 0))
}

impl QuizSession {
    /// A new attempt: every answer empty, timer full, started now.
    #[must_use]
    pub fn fresh(catalog: &QuestionCatalog, duration_ms: u64, now_epoch_ms: i64) -> Self {
        Self {
            current_question_index: 0,
            answers: catalog.ids().map(Answer::unanswered).collect(),
            time_remaining_ms: duration_ms,
            is_completed: false,
            start_time_epoch_ms: Some(now_epoch_ms),
        }
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn time_remaining_ms(&self) -> u64 {
        self.time_remaining_ms
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn start_time_epoch_ms(&self) -> Option<i64> {
        self.start_time_epoch_ms
    }

    /// True when a persisted session can be adopted for this catalog.
    #[must_use]
    pub fn is_shape_compatible(&self, catalog: &QuestionCatalog) -> bool {
        self.answers.len() == catalog.len()
    }

    /// Repair fields that cannot be trusted after a restore.
    ///
    /// Re-derives every `is_answered` flag and clamps the question pointer into range.
    pub fn normalize(&mut self) {
        for answer in &mut self.answers {
            answer.normalize();
        }
        let last = self.answers.len().saturating_sub(1);
        self.current_question_index = self.current_question_index.min(last);
    }

    /// Fill in the start time if it was never recorded. Returns true if it changed.
    pub fn backfill_start_time(&mut self, now_epoch_ms: i64) -> bool {
        if self.start_time_epoch_ms.is_some() {
            return false;
        }
        self.start_time_epoch_ms = Some(now_epoch_ms);
        true
    }

    /// Fill in a spent timer without touching one that is still running.
    pub fn backfill_timer(&mut self, duration_ms: u64) -> bool {
        if self.time_remaining_ms != 0 {
            return false;
        }
        self.time_remaining_ms = duration_ms;
        true
    }

    /// Jump to `index`; out-of-range indices are ignored.
    pub fn go_to(&mut self, index: usize) {
        if index < self.answers.len() {
            self.current_question_index = index;
        }
    }

    /// Advance one question, staying put on the last one.
    pub fn next(&mut self) {
        let last = self.answers.len().saturating_sub(1);
        self.current_question_index = (self.current_question_index + 1).min(last);
    }

    /// Step back one question, staying put on the first one.
    pub fn previous(&mut self) {
        self.current_question_index = self.current_question_index.saturating_sub(1);
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.answers.len()
    }

    /// Record or clear the answer for `question_id`. Unknown ids are ignored.
    pub fn answer(&mut self, question_id: QuestionId, choice: Option<usize>) {
        if let Some(answer) = self
            .answers
            .iter_mut()
            .find(|a| a.question_id() == question_id)
        {
            answer.select(choice);
        }
    }

    /// Set the countdown. A completed session keeps its timer frozen.
    pub fn set_time_remaining(&mut self, ms: u64) {
        if !self.is_completed {
            self.time_remaining_ms = ms;
        }
    }

    pub fn complete(&mut self) {
        self.is_completed = true;
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// Indices of questions without a selected answer, in order.
    #[must_use]
    pub fn unanswered_indices(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_answered())
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of answers matching the catalog's correct choice.
    ///
    /// Answers whose question is missing from the catalog never count.
    #[must_use]
    pub fn score(&self, catalog: &QuestionCatalog) -> usize {
        self.answers
            .iter()
            .filter(|answer| {
                answer.selected_answer().is_some_and(|choice| {
                    catalog
                        .find(answer.question_id())
                        .is_some_and(|q| q.is_correct(choice))
                })
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    const NOW: i64 = 1_700_000_000_000;

    fn catalog(correct: &[usize]) -> QuestionCatalog {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Question::new(
                    QuestionId::new(i as u64 + 1),
                    format!("Q{i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    *c,
                )
            })
            .collect();
        QuestionCatalog::new(questions).unwrap()
    }

    #[test]
    fn fresh_session_is_empty_and_full_timer() {
        let session = QuizSession::fresh(&catalog(&[0, 1]), 60_000, NOW);
        assert_eq!(session.answers().len(), 2);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.time_remaining_ms(), 60_000);
        assert_eq!(session.start_time_epoch_ms(), Some(NOW));
        assert!(!session.is_completed());
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut session = QuizSession::fresh(&catalog(&[0, 1, 2]), 1, NOW);
        session.previous();
        assert_eq!(session.current_question_index(), 0);

        session.go_to(2);
        session.next();
        assert_eq!(session.current_question_index(), 2);
        assert!(session.is_last_question());

        session.go_to(3);
        assert_eq!(session.current_question_index(), 2);
    }

    #[test]
    fn scores_only_matching_answers() {
        let catalog = catalog(&[1, 2, 0]);
        let mut session = QuizSession::fresh(&catalog, 1, NOW);
        session.answer(QuestionId::new(1), Some(1));
        session.answer(QuestionId::new(2), Some(2));
        session.answer(QuestionId::new(3), Some(1));
        assert_eq!(session.score(&catalog), 2);
    }

    #[test]
    fn restores_from_camel_case_json_treating_zero_start_as_absent() {
        let json = r#"{
            "currentQuestionIndex": 9,
            "answers": [
                { "questionId": 1, "selectedAnswer": 2, "isAnswered": false },
                { "questionId": 2, "selectedAnswer": null, "isAnswered": true }
            ],
            "timeRemaining": 1200,
            "isCompleted": false,
            "startTime": 0
        }"#;
        let mut session: QuizSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.start_time_epoch_ms(), None);

        session.normalize();
        assert_eq!(session.current_question_index(), 1);
        assert_eq!(session.unanswered_indices(), vec![1]);
        assert!(session.answers()[0].is_answered());
    }

    #[test]
    fn backfills_only_missing_values() {
        let mut session = QuizSession::fresh(&catalog(&[0]), 500, NOW);
        assert!(!session.backfill_start_time(NOW + 1));
        assert!(!session.backfill_timer(1_000));

        session.set_time_remaining(0);
        assert!(session.backfill_timer(1_000));
        assert_eq!(session.time_remaining_ms(), 1_000);
    }

    #[test]
    fn completed_session_freezes_timer() {
        let mut session = QuizSession::fresh(&catalog(&[0]), 500, NOW);
        session.complete();
        session.set_time_remaining(10);
        assert_eq!(session.time_remaining_ms(), 500);
    }
}
