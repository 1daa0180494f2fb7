mod answer;
mod ids;
mod question;
mod session;
mod user;

pub use answer::Answer;
pub use ids::QuestionId;
pub use question::{CatalogError, Question, QuestionCatalog};
pub use session::QuizSession;
pub use user::UserIdentity;
