//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{AnswerId, QuestionId, UserId};
use serde::{Deserialize, Serialize};

use crate::application::{
    PlayerStatusOutput, RotationOutcome, ShowQuestionOutput, SubmitAnswerOutput,
};

// ============================================================================
// Current Question
// ============================================================================

/// One numbered choice
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerChoiceDto {
    /// Number to submit, starting at 1
    pub index: u32,
    pub answer_id: AnswerId,
    pub sentence: String,
}

/// Current question response. Never reveals the correct answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub question_id: QuestionId,
    pub sentence: String,
    pub started_at: Option<DateTime<Utc>>,
    pub answers: Vec<AnswerChoiceDto>,
}

impl From<ShowQuestionOutput> for QuestionResponse {
    fn from(output: ShowQuestionOutput) -> Self {
        Self {
            question_id: output.question.id,
            sentence: output.question.sentence,
            started_at: output.question.started_at,
            answers: output
                .answers
                .into_iter()
                .map(|(index, answer)| AnswerChoiceDto {
                    index: index.get(),
                    answer_id: answer.id,
                    sentence: answer.sentence,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Submit Answer
// ============================================================================

/// Submit answer request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub user_id: UserId,
    /// 1-based, as shown next to each choice
    pub answer_index: i64,
}

/// Submit answer response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub question_id: QuestionId,
    pub answer_index: u32,
    pub answer_id: AnswerId,
    pub sentence: String,
}

impl From<SubmitAnswerOutput> for SubmitAnswerResponse {
    fn from(output: SubmitAnswerOutput) -> Self {
        Self {
            question_id: output.question.id,
            answer_index: output.answer_index.get(),
            answer_id: output.answer.id,
            sentence: output.answer.sentence,
        }
    }
}

// ============================================================================
// Player Status
// ============================================================================

/// Player status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatusResponse {
    pub user_id: UserId,
    pub points: i64,
    pub current_question_id: Option<QuestionId>,
    pub current_answer_index: Option<u32>,
}

impl From<PlayerStatusOutput> for PlayerStatusResponse {
    fn from(output: PlayerStatusOutput) -> Self {
        Self {
            user_id: output.user_id,
            points: output.points,
            current_question_id: output.current_question_id,
            current_answer_index: output.current_answer_index.map(|i| i.get()),
        }
    }
}

// ============================================================================
// Rotation
// ============================================================================

/// Result of a manual rotation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateResponse {
    pub retired_question_id: Option<QuestionId>,
    /// Users credited for the retired question
    pub credited: u64,
    pub current_question_id: QuestionId,
    pub started_at: Option<DateTime<Utc>>,
}

impl From<RotationOutcome> for RotateResponse {
    fn from(outcome: RotationOutcome) -> Self {
        Self {
            retired_question_id: outcome.retired.map(|q| q.id),
            credited: outcome.credited,
            current_question_id: outcome.activated.id,
            started_at: outcome.activated.started_at,
        }
    }
}

/// Rotation controller state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationStateResponse {
    /// `idle` or `advancing`
    pub state: &'static str,
    /// Automatic rotation period, absent when only manual rotation is enabled
    pub interval_secs: Option<u64>,
}

// ============================================================================
// Help
// ============================================================================

/// One available operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandHelp {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// Help response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpResponse {
    pub commands: Vec<CommandHelp>,
}
