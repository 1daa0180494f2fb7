use quiz_core::Clock;
use quiz_core::model::{QuestionId, UserIdentity};
use services::{ContextError, QuizContext, SessionStore};

/// One store operation per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Start,
    Answer { question_id: QuestionId, choice: usize },
    Clear { question_id: QuestionId },
    Goto { index: usize },
    Next,
    Prev,
    Skip,
    Tick,
    Submit,
    Reset,
    User { name: String, email: Option<String> },
    Score,
    Unanswered,
}

/// Apply `command` to the provided store and print the resulting state.
///
/// # Errors
///
/// Returns `ContextError` if the context holds no store.
pub fn execute(ctx: &QuizContext, command: Command, clock: &Clock) -> Result<(), ContextError> {
    let mut store = ctx.use_quiz()?;
    match command {
        Command::Status => {}
        Command::Start => store.start_quiz(),
        Command::Answer {
            question_id,
            choice,
        } => store.update_answer(question_id, Some(choice)),
        Command::Clear { question_id } => store.update_answer(question_id, None),
        Command::Goto { index } => store.go_to_question(index),
        Command::Next => store.next_question(),
        Command::Prev => store.previous_question(),
        Command::Skip => store.skip_question(),
        Command::Tick => tick(&mut store, clock),
        Command::Submit => store.submit_quiz(),
        Command::Reset => store.reset_quiz(),
        Command::User { name, email } => {
            let mut user = UserIdentity::new(name);
            user.email = email;
            store.set_user(user);
        }
        Command::Score => {
            println!(
                "score: {}/{}",
                store.calculate_score(),
                store.questions().len()
            );
            return Ok(());
        }
        Command::Unanswered => {
            let pending = store.unanswered_questions();
            if pending.is_empty() {
                println!("all questions answered");
            } else {
                let list: Vec<String> = pending.iter().map(ToString::to_string).collect();
                println!("unanswered: {}", list.join(", "));
            }
            return Ok(());
        }
    }
    print_status(&store);
    Ok(())
}

/// Recompute the countdown from the recorded start time, submitting at zero.
fn tick(store: &mut SessionStore, clock: &Clock) {
    if !store.started() {
        tracing::debug!("tick ignored: quiz not started");
        return;
    }
    let Some(start) = store.session().start_time_epoch_ms() else {
        return;
    };
    let elapsed = u64::try_from(clock.now_epoch_ms().saturating_sub(start)).unwrap_or(0);
    let remaining = store.config().duration_ms().saturating_sub(elapsed);
    store.update_timer(remaining);
    if remaining == 0 {
        tracing::info!("time is up");
        store.submit_quiz();
    }
}

fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn print_status(store: &SessionStore) {
    let session = store.session();
    let total = store.questions().len();

    match store.user() {
        Some(user) => match &user.email {
            Some(email) => println!("user: {} <{email}>", user.name),
            None => println!("user: {}", user.name),
        },
        None => println!("user: (none)"),
    }

    if session.is_completed() {
        println!(
            "completed: score {}/{total}, {} left on the clock",
            store.calculate_score(),
            format_ms(session.time_remaining_ms())
        );
        return;
    }

    println!(
        "{} | answered {}/{total} | time left {}",
        if store.started() { "in progress" } else { "not started" },
        store.answered_count(),
        format_ms(session.time_remaining_ms())
    );

    let index = session.current_question_index();
    let Some(question) = store.current_question() else {
        return;
    };
    let selected = session
        .answers()
        .get(index)
        .and_then(|a| a.selected_answer());

    println!();
    println!(
        "[{index}] question {} of {total} (id {})",
        index + 1,
        question.id()
    );
    println!("{}", question.prompt());
    for (i, choice) in question.choices().iter().enumerate() {
        let marker = if selected == Some(i) { '*' } else { ' ' };
        println!("  {marker} {i}) {choice}");
    }
}
