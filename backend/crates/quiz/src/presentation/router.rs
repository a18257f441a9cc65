//! Quiz Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::application::QuestionCatalog;
use crate::application::config::QuizConfig;
use crate::domain::repository::{
    AnswerRepository, PlayerRepository, QuestionRepository, RotationStore,
};
use crate::infra::postgres::PgQuizRepository;
use crate::presentation::handlers::{self, QuizAppState};

/// Create the Quiz router with PostgreSQL repository
pub fn quiz_router(repo: PgQuizRepository, config: QuizConfig) -> Router {
    quiz_router_with_state(QuizAppState::new(repo, config, QuestionCatalog::uniform()))
}

/// Create a generic Quiz router for any repository implementation
pub fn quiz_router_generic<R>(repo: R, config: QuizConfig) -> Router
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
    quiz_router_with_state(QuizAppState::new(repo, config, QuestionCatalog::uniform()))
}

/// Create the Quiz router around an existing state, e.g. one whose
/// rotation controller is also driven by a timer
pub fn quiz_router_with_state<R>(state: QuizAppState<R>) -> Router
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
    Router::new()
        .route("/help", get(handlers::help))
        .route("/question", get(handlers::show_question::<R>))
        .route("/answers", post(handlers::submit_answer::<R>))
        .route("/players/{user_id}", get(handlers::player_status::<R>))
        .route("/rotate", post(handlers::rotate::<R>))
        .route("/rotation", get(handlers::rotation_state::<R>))
        .with_state(state)
}
