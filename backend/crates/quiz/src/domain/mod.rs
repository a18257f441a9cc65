//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Question, Answer, AnswerEntry, Player)
//! - Domain value objects (AnswerIndex, RotationState)
//! - Domain services (pure scoring and selection rules)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
