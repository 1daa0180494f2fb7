use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("question catalog is empty")]
    Empty,

    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),

    #[error("question {id} marks choice {correct} correct but has {choices} choices")]
    CorrectAnswerOutOfRange {
        id: QuestionId,
        correct: usize,
        choices: usize,
    },
}

/// A multiple-choice question. `correct_answer` is the index of the correct choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Vec<String>,
    correct_answer: usize,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct_answer: usize,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            choices,
            correct_answer,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        self.correct_answer == choice
    }
}

/// Immutable, ordered question bank shared by every consumer of a store.
///
/// Cloning is cheap: the questions live behind a shared slice.
/// A catalog is never empty, so it has no `is_empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Arc<[Question]>,
}

#[allow(clippy::len_without_is_empty)]
impl QuestionCatalog {
    /// Build a catalog, validating it can back a session.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` if there are no questions,
    /// `CatalogError::DuplicateId` if two questions share an id, and
    /// `CatalogError::CorrectAnswerOutOfRange` if a correct answer does not name a choice.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id) {
                return Err(CatalogError::DuplicateId(question.id));
            }
            if question.correct_answer >= question.choices.len() {
                return Err(CatalogError::CorrectAnswerOutOfRange {
                    id: question.id,
                    correct: question.correct_answer,
                    choices: question.choices.len(),
                });
            }
        }

        Ok(Self {
            questions: questions.into(),
        })
    }

    /// Number of questions; never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn find(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(Question::id)
    }
}
