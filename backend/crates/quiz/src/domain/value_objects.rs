//! Domain Value Objects
//!
//! Immutable value types for the quiz domain.

use std::fmt;

/// Human-typed answer number.
///
/// Index 1 refers to the first answer in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnswerIndex(u32);

impl AnswerIndex {
    pub const FIRST: AnswerIndex = AnswerIndex(1);

    /// `None` outside `1..=u32::MAX`
    pub fn new(index: i64) -> Option<Self> {
        u32::try_from(index).ok().filter(|&i| i >= 1).map(Self)
    }

    /// Build from a 0-based position in an answer list
    pub fn from_offset(offset: usize) -> Option<Self> {
        u32::try_from(offset).ok()?.checked_add(1).map(Self)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// 0-based position in the ordered answer list
    pub fn offset(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for AnswerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AnswerIndex> for u32 {
    fn from(i: AnswerIndex) -> Self {
        i.0
    }
}

/// Rotation controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// Waiting for a trigger
    Idle,
    /// A rotation transaction is in flight
    Advancing,
}

impl RotationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationState::Idle => "idle",
            RotationState::Advancing => "advancing",
        }
    }
}
