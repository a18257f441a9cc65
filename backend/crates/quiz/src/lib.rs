//! Quiz (Trivia Rotation) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, pure rules, repository traits
//! - `application/` - Catalog, ledger, scoring and rotation services, use cases
//! - `infra/` - PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - One current question at a time, answered by 1-based choice number
//! - Last submission wins: one recorded answer per (user, question)
//! - Rotation scores the outgoing question and activates a random
//!   never-started one in a single transaction
//!
//! ## Consistency Model
//! - Rotations serialize on a locked current-question pointer
//! - Correct answerers are credited with one set-based update
//! - A failed rotation rolls back completely; the previous question stays current

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::QuizConfig;
pub use application::{QuestionCatalog, RotationController};
pub use error::{QuizError, QuizResult};
pub use infra::memory::MemoryQuizRepository;
pub use infra::postgres::PgQuizRepository;
pub use presentation::router::quiz_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}
