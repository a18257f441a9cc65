//! Submit Answer Use Case
//!
//! Answers the current question by the number shown next to each choice.

use crate::application::ledger::AnswerLedger;
use crate::domain::entities::{Answer, Question};
use crate::domain::repository::{AnswerRepository, QuestionRepository};
use crate::domain::value_objects::AnswerIndex;
use crate::error::{QuizError, QuizResult};
use kernel::id::UserId;
use std::sync::Arc;

/// Input DTO for submit answer
#[derive(Debug, Clone)]
pub struct SubmitAnswerInput {
    pub user_id: UserId,
    /// As typed by the user, 1-based
    pub answer_index: i64,
}

/// Output DTO for submit answer
#[derive(Debug, Clone)]
pub struct SubmitAnswerOutput {
    pub question: Question,
    pub answer_index: AnswerIndex,
    pub answer: Answer,
}

/// Submit Answer Use Case
pub struct SubmitAnswerUseCase<Q, A>
where
    Q: QuestionRepository,
    A: AnswerRepository,
{
    question_repo: Arc<Q>,
    ledger: AnswerLedger<A>,
}

impl<Q, A> SubmitAnswerUseCase<Q, A>
where
    Q: QuestionRepository,
    A: AnswerRepository,
{
    pub fn new(question_repo: Arc<Q>, answer_repo: Arc<A>) -> Self {
        Self {
            question_repo,
            ledger: AnswerLedger::new(answer_repo),
        }
    }

    pub async fn execute(&self, input: SubmitAnswerInput) -> QuizResult<SubmitAnswerOutput> {
        let answer_index = AnswerIndex::new(input.answer_index).ok_or_else(|| {
            QuizError::InvalidChoice(format!(
                "answer index {} is out of range, answers are numbered from 1",
                input.answer_index
            ))
        })?;

        let question = self
            .question_repo
            .find_current()
            .await?
            .ok_or(QuizError::NoCurrentQuestion)?;

        let (_, answer) = self
            .ledger
            .submit_index(input.user_id, question.id, answer_index)
            .await?;

        Ok(SubmitAnswerOutput {
            question,
            answer_index,
            answer,
        })
    }
}
