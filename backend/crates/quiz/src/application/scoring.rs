//! Scoring Engine
//!
//! Credits the users who answered the outgoing question correctly.

use crate::domain::entities::Question;
use crate::domain::repository::ScoringUnitOfWork;
use crate::domain::services::POINTS_PER_CORRECT_ANSWER;
use crate::error::QuizResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Add one point to every correct answerer of `question`.
    ///
    /// The store applies this as a single set-based update. A question
    /// without a designated correct answer credits nobody.
    pub async fn credit_correct_answerers<U>(
        &self,
        uow: &mut U,
        question: &Question,
    ) -> QuizResult<u64>
    where
        U: ScoringUnitOfWork,
    {
        if question.right_answer_id.is_none() {
            tracing::debug!(question_id = %question.id, "No correct answer set, nothing to credit");
            return Ok(0);
        }

        let credited = uow
            .credit_correct_answerers(question, POINTS_PER_CORRECT_ANSWER)
            .await?;

        tracing::info!(
            question_id = %question.id,
            credited = credited,
            "Credited correct answerers"
        );

        Ok(credited)
    }
}
