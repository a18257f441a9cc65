//! Show Question Use Case

use crate::domain::entities::{Answer, Question};
use crate::domain::repository::{AnswerRepository, QuestionRepository};
use crate::domain::value_objects::AnswerIndex;
use crate::error::{QuizError, QuizResult};
use std::sync::Arc;

/// Output DTO for show question
#[derive(Debug, Clone)]
pub struct ShowQuestionOutput {
    pub question: Question,
    /// Answers numbered the way users type them
    pub answers: Vec<(AnswerIndex, Answer)>,
}

/// Show Question Use Case
pub struct ShowQuestionUseCase<Q, A>
where
    Q: QuestionRepository,
    A: AnswerRepository,
{
    question_repo: Arc<Q>,
    answer_repo: Arc<A>,
}

impl<Q, A> ShowQuestionUseCase<Q, A>
where
    Q: QuestionRepository,
    A: AnswerRepository,
{
    pub fn new(question_repo: Arc<Q>, answer_repo: Arc<A>) -> Self {
        Self {
            question_repo,
            answer_repo,
        }
    }

    pub async fn execute(&self) -> QuizResult<ShowQuestionOutput> {
        let question = self
            .question_repo
            .find_current()
            .await?
            .ok_or(QuizError::NoCurrentQuestion)?;

        let answers = self
            .answer_repo
            .find_by_question(question.id)
            .await?
            .into_iter()
            .enumerate()
            .filter_map(|(offset, answer)| AnswerIndex::from_offset(offset).map(|i| (i, answer)))
            .collect();

        Ok(ShowQuestionOutput { question, answers })
    }
}
