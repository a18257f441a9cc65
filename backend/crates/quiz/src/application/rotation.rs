//! Rotation Controller
//!
//! Retires the current question and activates the next one as a single
//! transaction: score the outgoing question, pick and stamp the incoming
//! one, commit. Any failure rolls everything back.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::catalog::QuestionCatalog;
use crate::application::scoring::ScoringEngine;
use crate::domain::entities::Question;
use crate::domain::repository::{RotationStore, RotationUnitOfWork};
use crate::domain::value_objects::RotationState;
use crate::error::{QuizError, QuizResult};

/// Result of a committed rotation
#[derive(Debug, Clone)]
pub struct RotationOutcome {
    /// Question that was current before the rotation, if any
    pub retired: Option<Question>,
    /// Number of users credited for the retired question
    pub credited: u64,
    /// Newly current question
    pub activated: Question,
}

/// Rotation Controller
pub struct RotationController<S>
where
    S: RotationStore,
{
    store: Arc<S>,
    catalog: QuestionCatalog,
    scoring: ScoringEngine,
    in_flight: AtomicUsize,
}

impl<S> RotationController<S>
where
    S: RotationStore,
{
    pub fn new(store: Arc<S>, catalog: QuestionCatalog) -> Self {
        Self {
            store,
            catalog,
            scoring: ScoringEngine,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Advancing while any rotation started by this controller is in flight
    pub fn state(&self) -> RotationState {
        if self.in_flight.load(Ordering::Acquire) > 0 {
            RotationState::Advancing
        } else {
            RotationState::Idle
        }
    }

    /// Rotate to the next question.
    ///
    /// Errors are wrapped in [`QuizError::Rotation`]; by then the
    /// transaction has been rolled back and nothing changed.
    pub async fn advance(&self) -> QuizResult<RotationOutcome> {
        let _advancing = InFlight::enter(&self.in_flight);

        let mut uow = self.store.begin().await.map_err(QuizError::rotation)?;

        let outcome = match self.rotate(&mut uow).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!(error = %rollback_err, "Rotation rollback failed");
                }
                tracing::warn!(error = %e, "Rotation aborted");
                return Err(QuizError::rotation(e));
            }
        };

        uow.commit().await.map_err(QuizError::rotation)?;

        tracing::info!(
            retired = ?outcome.retired.as_ref().map(|q| q.id),
            activated = %outcome.activated.id,
            credited = outcome.credited,
            "Rotation committed"
        );

        Ok(outcome)
    }

    async fn rotate(&self, uow: &mut S::UnitOfWork) -> QuizResult<RotationOutcome> {
        let retired = match self.catalog.get_current(uow).await {
            Ok(question) => Some(question),
            Err(QuizError::NoCurrentQuestion) => {
                tracing::info!("No current question, first rotation skips scoring");
                None
            }
            Err(e) => return Err(e),
        };

        let credited = match &retired {
            Some(question) => self.scoring.credit_correct_answerers(uow, question).await?,
            None => 0,
        };

        let activated = self.catalog.select_next(uow, retired.as_ref()).await?;

        Ok(RotationOutcome {
            retired,
            credited,
            activated,
        })
    }
}

/// Counts a rotation as in flight until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
