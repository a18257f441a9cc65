//! Player Status Use Case

use crate::domain::entities::Question;
use crate::domain::repository::{AnswerRepository, PlayerRepository, QuestionRepository};
use crate::domain::value_objects::AnswerIndex;
use crate::error::{QuizError, QuizResult};
use kernel::id::{QuestionId, UserId};
use std::sync::Arc;

/// Output DTO for player status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatusOutput {
    pub user_id: UserId,
    pub points: i64,
    pub current_question_id: Option<QuestionId>,
    /// The player's pending choice on the current question
    pub current_answer_index: Option<AnswerIndex>,
}

/// Player Status Use Case
pub struct PlayerStatusUseCase<P, Q, A>
where
    P: PlayerRepository,
    Q: QuestionRepository,
    A: AnswerRepository,
{
    player_repo: Arc<P>,
    question_repo: Arc<Q>,
    answer_repo: Arc<A>,
}

impl<P, Q, A> PlayerStatusUseCase<P, Q, A>
where
    P: PlayerRepository,
    Q: QuestionRepository,
    A: AnswerRepository,
{
    pub fn new(player_repo: Arc<P>, question_repo: Arc<Q>, answer_repo: Arc<A>) -> Self {
        Self {
            player_repo,
            question_repo,
            answer_repo,
        }
    }

    pub async fn execute(&self, user_id: UserId) -> QuizResult<PlayerStatusOutput> {
        let player = self
            .player_repo
            .find_by_id(user_id)
            .await?
            .ok_or(QuizError::PlayerNotFound(user_id))?;

        let current = self.question_repo.find_current().await?;
        let current_answer_index = match &current {
            Some(question) => self.pending_choice(user_id, question).await?,
            None => None,
        };

        Ok(PlayerStatusOutput {
            user_id,
            points: player.points,
            current_question_id: current.map(|q| q.id),
            current_answer_index,
        })
    }

    async fn pending_choice(
        &self,
        user_id: UserId,
        question: &Question,
    ) -> QuizResult<Option<AnswerIndex>> {
        let Some(entry) = self.answer_repo.find_entry(user_id, question.id).await? else {
            return Ok(None);
        };

        let answers = self.answer_repo.find_by_question(question.id).await?;
        Ok(answers
            .iter()
            .position(|a| a.id == entry.answer_id)
            .and_then(AnswerIndex::from_offset))
    }
}
