use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// The user's response to one question.
///
/// `is_answered` is always `selected_answer.is_some()`; the only mutator keeps them in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    question_id: QuestionId,
    selected_answer: Option<usize>,
    is_answered: bool,
}

impl Answer {
    #[must_use]
    pub fn unanswered(question_id: QuestionId) -> Self {
        Self {
            question_id,
            selected_answer: None,
            is_answered: false,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<usize> {
        self.selected_answer
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.is_answered
    }

    /// Record a choice, or clear it with `None`.
    pub fn select(&mut self, choice: Option<usize>) {
        self.selected_answer = choice;
        self.is_answered = choice.is_some();
    }

    /// Re-derive `is_answered` after loading from an untrusted source.
    pub(crate) fn normalize(&mut self) {
        self.is_answered = self.selected_answer.is_some();
    }
}
