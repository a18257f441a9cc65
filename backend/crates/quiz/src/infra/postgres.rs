//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{AnswerId, QuestionId, UserId};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::{Answer, AnswerEntry, Player, Question};
use crate::domain::repository::{
    AnswerRepository, CatalogUnitOfWork, PlayerRepository, QuestionRepository,
    RotationStore, RotationUnitOfWork, ScoringUnitOfWork,
};
use crate::domain::services::check_new_question;
use crate::error::{QuizError, QuizResult};

/// PostgreSQL-backed quiz repository
#[derive(Clone)]
pub struct PgQuizRepository {
    pool: PgPool,
}

impl PgQuizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a question together with its answers, in the given order.
    ///
    /// Catalog maintenance entry point; rotation never creates questions.
    pub async fn add_question(&self, question: &Question, answers: &[Answer]) -> QuizResult<()> {
        check_new_question(question, answers)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO questions (
                question_id,
                owner_user_id,
                sentence,
                right_answer_id,
                started_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(question.id.as_uuid())
        .bind(question.owner_id.as_uuid())
        .bind(&question.sentence)
        .bind(question.right_answer_id.map(Uuid::from))
        .bind(question.started_at)
        .bind(question.created_at)
        .execute(&mut *tx)
        .await?;

        for answer in answers {
            sqlx::query(
                r#"
                INSERT INTO answers (answer_id, question_id, sentence, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(answer.id.as_uuid())
            .bind(answer.question_id.as_uuid())
            .bind(&answer.sentence)
            .bind(answer.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            question_id = %question.id,
            answers = answers.len(),
            "Question added to catalog"
        );

        Ok(())
    }
}

// ============================================================================
// Question Repository Implementation
// ============================================================================

impl QuestionRepository for PgQuizRepository {
    async fn find_current(&self) -> QuizResult<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT
                q.question_id,
                q.owner_user_id,
                q.sentence,
                q.right_answer_id,
                q.started_at,
                q.created_at
            FROM quiz_rotation r
            JOIN questions q ON q.question_id = r.current_question_id
            WHERE r.singleton
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuestionRow::into_question))
    }

    async fn find_by_id(&self, question_id: QuestionId) -> QuizResult<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT
                question_id,
                owner_user_id,
                sentence,
                right_answer_id,
                started_at,
                created_at
            FROM questions
            WHERE question_id = $1
            "#,
        )
        .bind(question_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuestionRow::into_question))
    }
}

// ============================================================================
// Answer Repository Implementation
// ============================================================================

impl AnswerRepository for PgQuizRepository {
    async fn find_by_question(&self, question_id: QuestionId) -> QuizResult<Vec<Answer>> {
        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT answer_id, question_id, sentence, created_at
            FROM answers
            WHERE question_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(question_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AnswerRow::into_answer).collect())
    }

    async fn find_by_id(&self, answer_id: AnswerId) -> QuizResult<Option<Answer>> {
        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT answer_id, question_id, sentence, created_at
            FROM answers
            WHERE answer_id = $1
            "#,
        )
        .bind(answer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AnswerRow::into_answer))
    }

    async fn upsert_entry(&self, entry: &AnswerEntry) -> QuizResult<()> {
        let mut tx = self.pool.begin().await?;

        // First answer registers the player
        sqlx::query("INSERT INTO quiz_users (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(entry.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        // The SELECT only yields a row when the answer belongs to the question
        let written = sqlx::query(
            r#"
            INSERT INTO answer_entries (user_id, question_id, answer_id, updated_at)
            SELECT $1, a.question_id, a.answer_id, $4
            FROM answers a
            WHERE a.answer_id = $3 AND a.question_id = $2
            ON CONFLICT (user_id, question_id) DO UPDATE SET
                answer_id = EXCLUDED.answer_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(entry.user_id.as_uuid())
        .bind(entry.question_id.as_uuid())
        .bind(entry.answer_id.as_uuid())
        .bind(entry.updated_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if written == 0 {
            tx.rollback().await?;
            return Err(QuizError::InvalidChoice(format!(
                "answer {} does not belong to question {}",
                entry.answer_id, entry.question_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_entry(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> QuizResult<Option<AnswerEntry>> {
        let row = sqlx::query_as::<_, AnswerEntryRow>(
            r#"
            SELECT user_id, question_id, answer_id, updated_at
            FROM answer_entries
            WHERE user_id = $1 AND question_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(question_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AnswerEntryRow::into_entry))
    }
}

// ============================================================================
// Player Repository Implementation
// ============================================================================

impl PlayerRepository for PgQuizRepository {
    async fn find_by_id(&self, user_id: UserId) -> QuizResult<Option<Player>> {
        let row = sqlx::query_as::<_, PlayerRow>(
            "SELECT user_id, points FROM quiz_users WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Player {
            user_id: r.user_id.into(),
            points: r.points,
        }))
    }
}

// ============================================================================
// Rotation Unit of Work
// ============================================================================

impl RotationStore for PgQuizRepository {
    type UnitOfWork = PgRotationUnitOfWork;

    async fn begin(&self) -> QuizResult<PgRotationUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PgRotationUnitOfWork { tx })
    }
}

/// One rotation, backed by a database transaction.
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PgRotationUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl CatalogUnitOfWork for PgRotationUnitOfWork {
    async fn lock_current(&mut self) -> QuizResult<Option<Question>> {
        // Locking the pointer row serializes concurrent rotations
        let current: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT current_question_id
            FROM quiz_rotation
            WHERE singleton
            FOR UPDATE
            "#,
        )
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| QuizError::Internal("quiz_rotation row is missing".to_string()))?;

        let Some(question_id) = current else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT
                question_id,
                owner_user_id,
                sentence,
                right_answer_id,
                started_at,
                created_at
            FROM questions
            WHERE question_id = $1
            FOR UPDATE
            "#,
        )
        .bind(question_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(QuestionRow::into_question))
    }

    async fn lock_unstarted(&mut self) -> QuizResult<Vec<QuestionId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT question_id
            FROM questions
            WHERE started_at IS NULL
            ORDER BY question_id
            FOR UPDATE
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(ids.into_iter().map(QuestionId::from).collect())
    }

    async fn activate(
        &mut self,
        question_id: QuestionId,
        started_at: DateTime<Utc>,
    ) -> QuizResult<Question> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            UPDATE questions SET started_at = $2
            WHERE question_id = $1 AND started_at IS NULL
            RETURNING
                question_id,
                owner_user_id,
                sentence,
                right_answer_id,
                started_at,
                created_at
            "#,
        )
        .bind(question_id.as_uuid())
        .bind(started_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM questions WHERE question_id = $1)",
            )
            .bind(question_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await?;

            return Err(if exists {
                QuizError::AlreadyStarted(question_id)
            } else {
                QuizError::QuestionNotFound(question_id)
            });
        };

        sqlx::query(
            r#"
            UPDATE quiz_rotation SET
                current_question_id = $1,
                rotated_at = $2
            WHERE singleton
            "#,
        )
        .bind(question_id.as_uuid())
        .bind(started_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(row.into_question())
    }
}

impl ScoringUnitOfWork for PgRotationUnitOfWork {
    async fn credit_correct_answerers(
        &mut self,
        question: &Question,
        points: i64,
    ) -> QuizResult<u64> {
        let credited = sqlx::query(
            r#"
            UPDATE quiz_users u SET points = u.points + $2
            FROM answer_entries e
            JOIN questions q ON q.question_id = e.question_id
            WHERE e.user_id = u.user_id
              AND e.question_id = $1
              AND e.answer_id = q.right_answer_id
            "#,
        )
        .bind(question.id.as_uuid())
        .bind(points)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        Ok(credited)
    }
}

impl RotationUnitOfWork for PgRotationUnitOfWork {
    async fn commit(self) -> QuizResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> QuizResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// ============================================================================
// Row types for SQLx
// ============================================================================

#[derive(sqlx::FromRow)]
struct QuestionRow {
    question_id: Uuid,
    owner_user_id: Uuid,
    sentence: String,
    right_answer_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl QuestionRow {
    fn into_question(self) -> Question {
        Question {
            id: self.question_id.into(),
            owner_id: self.owner_user_id.into(),
            sentence: self.sentence,
            right_answer_id: self.right_answer_id.map(AnswerId::from),
            started_at: self.started_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    answer_id: Uuid,
    question_id: Uuid,
    sentence: String,
    created_at: DateTime<Utc>,
}

impl AnswerRow {
    fn into_answer(self) -> Answer {
        Answer {
            id: self.answer_id.into(),
            question_id: self.question_id.into(),
            sentence: self.sentence,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnswerEntryRow {
    user_id: Uuid,
    question_id: Uuid,
    answer_id: Uuid,
    updated_at: DateTime<Utc>,
}

impl AnswerEntryRow {
    fn into_entry(self) -> AnswerEntry {
        AnswerEntry {
            user_id: self.user_id.into(),
            question_id: self.question_id.into(),
            answer_id: self.answer_id.into(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlayerRow {
    user_id: Uuid,
    points: i64,
}
