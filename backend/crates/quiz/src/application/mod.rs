//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains the rotation/scoring services and the use cases
//! behind the HTTP handlers.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod picker;
pub mod player_status;
pub mod rotation;
pub mod scoring;
pub mod show_question;
pub mod submit_answer;

// Re-exports
pub use catalog::QuestionCatalog;
pub use config::QuizConfig;
pub use ledger::AnswerLedger;
pub use picker::{QuestionPicker, SeededPicker, UniformPicker};
pub use player_status::{PlayerStatusOutput, PlayerStatusUseCase};
pub use rotation::{RotationController, RotationOutcome};
pub use scoring::ScoringEngine;
pub use show_question::{ShowQuestionOutput, ShowQuestionUseCase};
pub use submit_answer::{SubmitAnswerInput, SubmitAnswerOutput, SubmitAnswerUseCase};
