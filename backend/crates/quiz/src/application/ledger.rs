//! Answer Ledger
//!
//! Records each user's choice on a question. Last submission wins.

use std::sync::Arc;

use kernel::id::{AnswerId, QuestionId, UserId};

use crate::domain::entities::{Answer, AnswerEntry};
use crate::domain::repository::AnswerRepository;
use crate::domain::services::resolve_answer;
use crate::domain::value_objects::AnswerIndex;
use crate::error::{QuizError, QuizResult};

/// Answer ledger service
pub struct AnswerLedger<A>
where
    A: AnswerRepository,
{
    answer_repo: Arc<A>,
}

impl<A> AnswerLedger<A>
where
    A: AnswerRepository,
{
    pub fn new(answer_repo: Arc<A>) -> Self {
        Self { answer_repo }
    }

    /// Answers of a question in creation order. May be empty.
    pub async fn get_answers_for_question(
        &self,
        question_id: QuestionId,
    ) -> QuizResult<Vec<Answer>> {
        self.answer_repo.find_by_question(question_id).await
    }

    /// Record `answer_id` as the user's choice on `question_id`.
    ///
    /// Overwrites any earlier choice by the same user on the same question.
    pub async fn submit(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> QuizResult<AnswerEntry> {
        let answer = self
            .answer_repo
            .find_by_id(answer_id)
            .await?
            .ok_or_else(|| {
                QuizError::InvalidChoice(format!("answer {answer_id} does not exist"))
            })?;

        self.record(user_id, question_id, &answer).await
    }

    /// Record the answer at a 1-based `index` of the question's answer list.
    pub async fn submit_index(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        index: AnswerIndex,
    ) -> QuizResult<(AnswerEntry, Answer)> {
        let answers = self.get_answers_for_question(question_id).await?;
        let answer = resolve_answer(&answers, index).ok_or_else(|| {
            QuizError::InvalidChoice(format!(
                "answer index {index} is out of range, there are {} possible answers",
                answers.len()
            ))
        })?;

        let entry = self.record(user_id, question_id, answer).await?;
        Ok((entry, answer.clone()))
    }

    async fn record(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        answer: &Answer,
    ) -> QuizResult<AnswerEntry> {
        let entry = AnswerEntry::new(user_id, question_id, answer)?;
        self.answer_repo.upsert_entry(&entry).await?;

        tracing::info!(
            user_id = %user_id,
            question_id = %question_id,
            answer_id = %answer.id,
            "Answer recorded"
        );

        Ok(entry)
    }
}
