//! Question Picker
//!
//! Random source for choosing the next question. Injected so tests can
//! make the choice deterministic.

use std::sync::Mutex;

use kernel::id::QuestionId;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

/// Chooses one question among the never-started candidates
pub trait QuestionPicker: Send + Sync {
    /// `None` only when `candidates` is empty
    fn pick(&self, candidates: &[QuestionId]) -> Option<QuestionId>;
}

/// Uniform draw from the thread-local OS-seeded generator
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPicker;

impl QuestionPicker for UniformPicker {
    fn pick(&self, candidates: &[QuestionId]) -> Option<QuestionId> {
        candidates.choose(&mut rand::rng()).copied()
    }
}

/// Uniform draw from a seeded generator; the same seed replays the same picks
#[derive(Debug)]
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl QuestionPicker for SeededPicker {
    fn pick(&self, candidates: &[QuestionId]) -> Option<QuestionId> {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        candidates.choose(&mut *rng).copied()
    }
}
