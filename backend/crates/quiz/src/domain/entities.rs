//! Domain Entities
//!
//! Core business entities for the quiz domain.

use chrono::{DateTime, Utc};
use kernel::id::{AnswerId, QuestionId, UserId};

use crate::error::{QuizError, QuizResult};

/// Question entity
///
/// A question is *not started* until `started_at` is stamped by a rotation.
/// Once stamped it is never cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    /// User who wrote the question
    pub owner_id: UserId,
    pub sentence: String,
    /// Designated correct answer; `None` means nobody can score on it
    pub right_answer_id: Option<AnswerId>,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Create a new, not yet started question
    pub fn new(owner_id: UserId, sentence: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(),
            owner_id,
            sentence: sentence.into(),
            right_answer_id: None,
            started_at: None,
            created_at: Utc::now(),
        }
    }

    /// Designate the correct answer
    pub fn with_right_answer(mut self, answer_id: AnswerId) -> Self {
        self.right_answer_id = Some(answer_id);
        self
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether `answer_id` is the designated correct answer
    pub fn is_correct(&self, answer_id: AnswerId) -> bool {
        self.right_answer_id == Some(answer_id)
    }

    /// Stamp the activation time. Fails if the question already ran.
    pub fn start(&mut self, at: DateTime<Utc>) -> QuizResult<()> {
        if self.is_started() {
            return Err(QuizError::AlreadyStarted(self.id));
        }
        self.started_at = Some(at);
        Ok(())
    }
}

/// Answer entity - one choice offered for a question
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub sentence: String,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(question_id: QuestionId, sentence: impl Into<String>) -> Self {
        Self {
            id: AnswerId::new(),
            question_id,
            sentence: sentence.into(),
            created_at: Utc::now(),
        }
    }
}

/// A user's recorded choice on a question.
///
/// Keyed by `(user_id, question_id)`. The chosen answer always belongs to
/// `question_id`; [`AnswerEntry::new`] checks this before an entry is written.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEntry {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub answer_id: AnswerId,
    pub updated_at: DateTime<Utc>,
}

impl AnswerEntry {
    pub fn new(user_id: UserId, question_id: QuestionId, answer: &Answer) -> QuizResult<Self> {
        if answer.question_id != question_id {
            return Err(QuizError::InvalidChoice(format!(
                "answer {} does not belong to question {}",
                answer.id, question_id
            )));
        }
        Ok(Self {
            user_id,
            question_id,
            answer_id: answer.id,
            updated_at: Utc::now(),
        })
    }
}

/// Player - a quiz user and their accumulated points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub user_id: UserId,
    pub points: i64,
}

impl Player {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id, points: 0 }
    }
}
