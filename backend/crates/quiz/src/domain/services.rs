//! Domain Services
//!
//! Pure quiz rules, shared by every store implementation.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AnswerId, QuestionId, UserId};

use crate::domain::entities::{Answer, AnswerEntry, Question};
use crate::domain::value_objects::AnswerIndex;
use crate::error::{QuizError, QuizResult};

/// Points credited for one correct answer
pub const POINTS_PER_CORRECT_ANSWER: i64 = 1;

/// Map a 1-based index onto an answer list ordered by creation.
pub fn resolve_answer(answers: &[Answer], index: AnswerIndex) -> Option<&Answer> {
    answers.get(index.offset())
}

/// Whether `answer` is one of the choices offered by `question_id`
pub fn choice_belongs_to(question_id: QuestionId, answer: &Answer) -> bool {
    answer.question_id == question_id
}

/// Check a question and its answers before they enter the catalog.
///
/// Every answer must belong to the question, and the correct answer, if
/// set, must be one of them.
pub fn check_new_question(question: &Question, answers: &[Answer]) -> QuizResult<()> {
    if let Some(stray) = answers.iter().find(|a| !choice_belongs_to(question.id, a)) {
        return Err(QuizError::InvalidChoice(format!(
            "answer {} does not belong to question {}",
            stray.id, question.id
        )));
    }

    let offered = |id: AnswerId| answers.iter().any(|a| a.id == id);
    if let Some(right) = question.right_answer_id.filter(|&r| !offered(r)) {
        return Err(QuizError::InvalidChoice(format!(
            "correct answer {right} is not one of the answers of question {}",
            question.id
        )));
    }

    Ok(())
}

/// The question with the latest activation time, if any ever started.
pub fn latest_started<'a, I>(questions: I) -> Option<&'a Question>
where
    I: IntoIterator<Item = &'a Question>,
{
    questions
        .into_iter()
        .filter(|q| q.is_started())
        .max_by_key(|q| q.started_at)
}

/// Activation time for the incoming question.
///
/// Strictly later than the outgoing question's, so the newest activation
/// stays unique even if the wall clock steps backwards.
pub fn next_activation_time(
    now: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    match previous {
        Some(prev) if prev >= now => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// IDs of questions that were never started, in a stable order.
pub fn unstarted_ids<'a, I>(questions: I) -> Vec<QuestionId>
where
    I: IntoIterator<Item = &'a Question>,
{
    let mut ids: Vec<QuestionId> = questions
        .into_iter()
        .filter(|q| !q.is_started())
        .map(|q| q.id)
        .collect();
    ids.sort();
    ids
}

/// Users whose entry on `question` matches its designated correct answer.
///
/// Empty when the question has no correct answer.
pub fn correct_answerers<'a, I>(question: &Question, entries: I) -> Vec<UserId>
where
    I: IntoIterator<Item = &'a AnswerEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.question_id == question.id && question.is_correct(e.answer_id))
        .map(|e| e.user_id)
        .collect()
}
