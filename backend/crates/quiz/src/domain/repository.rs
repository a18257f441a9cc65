//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in `infra/`.
//!
//! Reads and answer submission go straight to the store. Rotation goes
//! through a unit of work: everything done on a [`RotationUnitOfWork`] is
//! invisible to other callers until `commit`, and discarded on `rollback`
//! or drop.

use chrono::{DateTime, Utc};
use kernel::id::{AnswerId, QuestionId, UserId};

use crate::domain::entities::{Answer, AnswerEntry, Player, Question};
use crate::error::QuizResult;

/// Question read path
#[trait_variant::make(QuestionRepository: Send)]
pub trait LocalQuestionRepository {
    /// Committed current question, if any
    async fn find_current(&self) -> QuizResult<Option<Question>>;

    async fn find_by_id(&self, question_id: QuestionId) -> QuizResult<Option<Question>>;
}

/// Answers and answer entries
#[trait_variant::make(AnswerRepository: Send)]
pub trait LocalAnswerRepository {
    /// All answers of a question, oldest first
    async fn find_by_question(&self, question_id: QuestionId) -> QuizResult<Vec<Answer>>;

    async fn find_by_id(&self, answer_id: AnswerId) -> QuizResult<Option<Answer>>;

    /// Insert or overwrite the entry keyed by `(user_id, question_id)` in a single write
    async fn upsert_entry(&self, entry: &AnswerEntry) -> QuizResult<()>;

    async fn find_entry(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> QuizResult<Option<AnswerEntry>>;
}

/// Players and their points
#[trait_variant::make(PlayerRepository: Send)]
pub trait LocalPlayerRepository {
    async fn find_by_id(&self, user_id: UserId) -> QuizResult<Option<Player>>;
}

/// Question lifecycle operations inside a rotation
#[trait_variant::make(CatalogUnitOfWork: Send)]
pub trait LocalCatalogUnitOfWork {
    /// Current question, locked against concurrent rotations
    async fn lock_current(&mut self) -> QuizResult<Option<Question>>;

    /// Never-started question IDs, locked against concurrent selection
    async fn lock_unstarted(&mut self) -> QuizResult<Vec<QuestionId>>;

    /// Stamp `started_at` and move the current pointer to this question
    async fn activate(
        &mut self,
        question_id: QuestionId,
        started_at: DateTime<Utc>,
    ) -> QuizResult<Question>;
}

/// Point crediting inside a rotation
#[trait_variant::make(ScoringUnitOfWork: Send)]
pub trait LocalScoringUnitOfWork {
    /// Add `points` to every user whose entry on `question` matches its
    /// correct answer, as one set-based write. Returns the number credited.
    async fn credit_correct_answerers(
        &mut self,
        question: &Question,
        points: i64,
    ) -> QuizResult<u64>;
}

/// One all-or-nothing rotation transaction
#[trait_variant::make(RotationUnitOfWork: Send)]
pub trait LocalRotationUnitOfWork: CatalogUnitOfWork + ScoringUnitOfWork {
    async fn commit(self) -> QuizResult<()>;

    async fn rollback(self) -> QuizResult<()>;
}

/// Opens rotation transactions
#[trait_variant::make(RotationStore: Send)]
pub trait LocalRotationStore {
    type UnitOfWork: RotationUnitOfWork + Send;

    async fn begin(&self) -> QuizResult<Self::UnitOfWork>;
}
