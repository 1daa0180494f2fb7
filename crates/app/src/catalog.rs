use quiz_core::model::{CatalogError, Question, QuestionCatalog, QuestionId};

const QUESTIONS: &[(&str, &[&str], usize)] = &[
    (
        "Which keyword moves a value into a closure?",
        &["ref", "move", "static", "dyn"],
        1,
    ),
    (
        "What does the `?` operator do on an `Err` value?",
        &[
            "Panics",
            "Ignores the error",
            "Returns the error from the enclosing function",
            "Converts it to `None`",
        ],
        2,
    ),
    (
        "Which type gives shared ownership within a single thread?",
        &["Box<T>", "Rc<T>", "Cell<T>", "Arc<T>"],
        1,
    ),
    (
        "Which trait is required to use a type as a `HashMap` key, alongside `Eq`?",
        &["Ord", "Clone", "Hash", "Default"],
        2,
    ),
    (
        "What is the borrow checker's rule for references?",
        &[
            "Any number of `&mut` at once",
            "One `&mut` or any number of `&`",
            "Only one `&` at a time",
            "References may outlive their owner",
        ],
        1,
    ),
];

/// The built-in question bank.
///
/// # Errors
///
/// Returns `CatalogError` if the bank above is malformed.
pub fn builtin_catalog() -> Result<QuestionCatalog, CatalogError> {
    let questions = QUESTIONS
        .iter()
        .zip(1_u64..)
        .map(|(&(prompt, choices, correct), id)| {
            Question::new(
                QuestionId::new(id),
                prompt,
                choices.iter().map(|c| (*c).to_owned()).collect(),
                correct,
            )
        })
        .collect();
    QuestionCatalog::new(questions)
}
