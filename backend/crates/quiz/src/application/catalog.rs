//! Question Catalog
//!
//! Question lifecycle: which question is current, and which one runs next.

use std::sync::Arc;

use chrono::Utc;

use crate::application::picker::{QuestionPicker, UniformPicker};
use crate::domain::entities::Question;
use crate::domain::repository::CatalogUnitOfWork;
use crate::domain::services::next_activation_time;
use crate::error::{QuizError, QuizResult};

/// Question catalog service
#[derive(Clone)]
pub struct QuestionCatalog {
    picker: Arc<dyn QuestionPicker>,
}

impl QuestionCatalog {
    pub fn new(picker: Arc<dyn QuestionPicker>) -> Self {
        Self { picker }
    }

    /// Catalog drawing with [`UniformPicker`]
    pub fn uniform() -> Self {
        Self::new(Arc::new(UniformPicker))
    }

    /// Current question, or [`QuizError::NoCurrentQuestion`] before the first rotation
    pub async fn get_current<U>(&self, uow: &mut U) -> QuizResult<Question>
    where
        U: CatalogUnitOfWork,
    {
        uow.lock_current().await?.ok_or(QuizError::NoCurrentQuestion)
    }

    /// Pick a never-started question and activate it.
    ///
    /// `outgoing` is the question being retired, if any; the new activation
    /// time is always later than its own.
    pub async fn select_next<U>(
        &self,
        uow: &mut U,
        outgoing: Option<&Question>,
    ) -> QuizResult<Question>
    where
        U: CatalogUnitOfWork,
    {
        let candidates = uow.lock_unstarted().await?;
        let chosen = self.picker.pick(&candidates).ok_or(QuizError::Exhausted)?;

        if !candidates.contains(&chosen) {
            return Err(QuizError::Internal(format!(
                "picker returned {chosen}, which is not an unstarted question"
            )));
        }

        let started_at = next_activation_time(Utc::now(), outgoing.and_then(|q| q.started_at));
        let question = uow.activate(chosen, started_at).await?;

        tracing::info!(
            question_id = %question.id,
            candidates = candidates.len(),
            "Activated question"
        );

        Ok(question)
    }
}
