//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use kernel::id::UserId;
use std::sync::Arc;

use crate::application::config::QuizConfig;
use crate::application::{
    PlayerStatusUseCase, QuestionCatalog, RotationController, ShowQuestionUseCase,
    SubmitAnswerInput, SubmitAnswerUseCase,
};
use crate::domain::repository::{
    AnswerRepository, PlayerRepository, QuestionRepository, RotationStore,
};
use crate::error::QuizResult;
use crate::presentation::dto::{
    CommandHelp, HelpResponse, PlayerStatusResponse, QuestionResponse, RotateResponse,
    RotationStateResponse, SubmitAnswerRequest, SubmitAnswerResponse,
};

/// Shared state for quiz handlers
#[derive(Clone)]
pub struct QuizAppState<R>
where
    R: QuestionRepository
        + AnswerRepository
        + PlayerRepository
        + RotationStore
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<QuizConfig>,
    /// Shared with the rotation timer so both report the same state
    pub rotation: Arc<RotationController<R>>,
}

impl<R> QuizAppState<R>
where
    R: QuestionRepository
        + AnswerRepository
        + PlayerRepository
        + RotationStore
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub fn new(repo: R, config: QuizConfig, catalog: QuestionCatalog) -> Self {
        let repo = Arc::new(repo);
        Self {
            rotation: Arc::new(RotationController::new(repo.clone(), catalog)),
            repo,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Current Question
// ============================================================================

/// GET /api/quiz/question
pub async fn show_question<R>(
    State(state): State<QuizAppState<R>>,
) -> QuizResult<Json<QuestionResponse>>
where
    R: QuestionRepository
        + AnswerRepository
        + PlayerRepository
        + RotationStore
        + Clone
        + Send
        + Sync
        + 'static,
{
    let use_case = ShowQuestionUseCase::new(state.repo.clone(), state.repo.clone());
    let output = use_case.execute().await?;

    Ok(Json(output.into()))
}

// ============================================================================
// Submit Answer
// ============================================================================

/// POST /api/quiz/answers
pub async fn submit_answer<R>(
    State(state): State<QuizAppState<R>>,
    Json(req): Json<SubmitAnswerRequest>,
) -> QuizResult<Json<SubmitAnswerResponse>>
where
    R: QuestionRepository
        + AnswerRepository
        + PlayerRepository
        + RotationStore
        + Clone
        + Send
        + Sync
        + 'static,
{
    let use_case = SubmitAnswerUseCase::new(state.repo.clone(), state.repo.clone());

    let input = SubmitAnswerInput {
        user_id: req.user_id,
        answer_index: req.answer_index,
    };

    let output = use_case.execute(input).await?;

    Ok(Json(output.into()))
}

// ============================================================================
// Player Status
// ============================================================================

/// GET /api/quiz/players/{user_id}
pub async fn player_status<R>(
    State(state): State<QuizAppState<R>>,
    Path(user_id): Path<UserId>,
) -> QuizResult<Json<PlayerStatusResponse>>
where
    R: QuestionRepository
        + AnswerRepository
        + PlayerRepository
        + RotationStore
        + Clone
        + Send
        + Sync
        + 'static,
{
    let use_case = PlayerStatusUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
    );
    let output = use_case.execute(user_id).await?;

    Ok(Json(output.into()))
}

// ============================================================================
// Rotation
// ============================================================================

/// POST /api/quiz/rotate
pub async fn rotate<R>(
    State(state): State<QuizAppState<R>>,
) -> QuizResult<Json<RotateResponse>>
where
    R: QuestionRepository
        + AnswerRepository
        + PlayerRepository
        + RotationStore
        + Clone
        + Send
        + Sync
        + 'static,
{
    let outcome = state.rotation.advance().await?;

    Ok(Json(outcome.into()))
}

/// GET /api/quiz/rotation
pub async fn rotation_state<R>(
    State(state): State<QuizAppState<R>>,
) -> Json<RotationStateResponse>
where
    R: QuestionRepository
        + AnswerRepository
        + PlayerRepository
        + RotationStore
        + Clone
        + Send
        + Sync
        + 'static,
{
    Json(RotationStateResponse {
        state: state.rotation.state().as_str(),
        interval_secs: state.config.rotation_interval.map(|d| d.as_secs()),
    })
}

// ============================================================================
// Help
// ============================================================================

/// GET /api/quiz/help
pub async fn help() -> Json<HelpResponse> {
    Json(HelpResponse {
        commands: vec![
            CommandHelp {
                method: "GET",
                path: "/api/quiz/help",
                description: "Show this help",
            },
            CommandHelp {
                method: "GET",
                path: "/api/quiz/question",
                description: "Show the current question and its numbered answers",
            },
            CommandHelp {
                method: "POST",
                path: "/api/quiz/answers",
                description: "Answer the current question by number; a resubmission replaces it",
            },
            CommandHelp {
                method: "GET",
                path: "/api/quiz/players/{userId}",
                description: "Show points and the pending answer on the current question",
            },
            CommandHelp {
                method: "POST",
                path: "/api/quiz/rotate",
                description: "Score the current question and move to a new one",
            },
            CommandHelp {
                method: "GET",
                path: "/api/quiz/rotation",
                description: "Show whether a rotation is in progress",
            },
        ],
    })
}
