//! In-Memory Repository
//!
//! Process-local store with the same transactional contract as the
//! PostgreSQL repository. A rotation holds the store lock for its whole
//! lifetime and works on a private copy that only replaces the committed
//! state on `commit`.
//!
//! Failures can be injected per step with [`MemoryQuizRepository::fail_next`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use kernel::id::{AnswerId, QuestionId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{Answer, AnswerEntry, Player, Question};
use crate::domain::repository::{
    AnswerRepository, CatalogUnitOfWork, PlayerRepository, QuestionRepository,
    RotationStore, RotationUnitOfWork, ScoringUnitOfWork,
};
use crate::domain::services::{
    check_new_question, choice_belongs_to, correct_answerers, unstarted_ids,
};
use crate::error::{QuizError, QuizResult};

/// Step at which an injected failure fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    LockCurrent,
    Scoring,
    Selection,
    Activation,
    Commit,
    Submit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    questions: HashMap<QuestionId, Question>,
    /// Creation order
    answers: Vec<Answer>,
    entries: HashMap<(UserId, QuestionId), AnswerEntry>,
    players: HashMap<UserId, Player>,
    current: Option<QuestionId>,
}

/// In-memory quiz repository
#[derive(Clone, Default)]
pub struct MemoryQuizRepository {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<StdMutex<Vec<FailPoint>>>,
}

impl MemoryQuizRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation reaching `point` fail with a storage error
    pub fn fail_next(&self, point: FailPoint) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(point);
    }

    /// Insert a question together with its answers, in the given order
    pub async fn add_question(&self, question: &Question, answers: &[Answer]) -> QuizResult<()> {
        check_new_question(question, answers)?;

        let mut state = self.state.lock().await;
        state.questions.insert(question.id, question.clone());
        state.answers.extend(answers.iter().cloned());
        Ok(())
    }

    /// Register a player with a starting balance
    pub async fn add_player(&self, user_id: UserId, points: i64) {
        let mut state = self.state.lock().await;
        state.players.insert(user_id, Player { user_id, points });
    }

    /// Committed point total of a player
    pub async fn points(&self, user_id: UserId) -> Option<i64> {
        let state = self.state.lock().await;
        state.players.get(&user_id).map(|p| p.points)
    }

    /// Committed state of every question
    pub async fn questions(&self) -> Vec<Question> {
        let state = self.state.lock().await;
        state.questions.values().cloned().collect()
    }

    /// Committed entries recorded on a question
    pub async fn entries_for(&self, question_id: QuestionId) -> Vec<AnswerEntry> {
        let state = self.state.lock().await;
        state
            .entries
            .values()
            .filter(|e| e.question_id == question_id)
            .cloned()
            .collect()
    }

    fn check_fault(&self, point: FailPoint) -> QuizResult<()> {
        take_fault(&self.faults, point)
    }
}

fn take_fault(faults: &StdMutex<Vec<FailPoint>>, point: FailPoint) -> QuizResult<()> {
    let mut faults = faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match faults.iter().position(|&p| p == point) {
        Some(i) => {
            faults.remove(i);
            Err(QuizError::Storage(format!("injected failure at {point:?}")))
        }
        None => Ok(()),
    }
}

impl QuestionRepository for MemoryQuizRepository {
    async fn find_current(&self) -> QuizResult<Option<Question>> {
        let state = self.state.lock().await;
        Ok(state.current.and_then(|id| state.questions.get(&id).cloned()))
    }

    async fn find_by_id(&self, question_id: QuestionId) -> QuizResult<Option<Question>> {
        let state = self.state.lock().await;
        Ok(state.questions.get(&question_id).cloned())
    }
}

impl AnswerRepository for MemoryQuizRepository {
    async fn find_by_question(&self, question_id: QuestionId) -> QuizResult<Vec<Answer>> {
        let state = self.state.lock().await;
        Ok(state
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, answer_id: AnswerId) -> QuizResult<Option<Answer>> {
        let state = self.state.lock().await;
        Ok(state.answers.iter().find(|a| a.id == answer_id).cloned())
    }

    async fn upsert_entry(&self, entry: &AnswerEntry) -> QuizResult<()> {
        self.check_fault(FailPoint::Submit)?;

        let mut state = self.state.lock().await;
        let belongs = state
            .answers
            .iter()
            .any(|a| a.id == entry.answer_id && choice_belongs_to(entry.question_id, a));
        if !belongs {
            return Err(QuizError::InvalidChoice(format!(
                "answer {} does not belong to question {}",
                entry.answer_id, entry.question_id
            )));
        }

        state
            .players
            .entry(entry.user_id)
            .or_insert_with(|| Player::new(entry.user_id));
        state
            .entries
            .insert((entry.user_id, entry.question_id), entry.clone());
        Ok(())
    }

    async fn find_entry(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> QuizResult<Option<AnswerEntry>> {
        let state = self.state.lock().await;
        Ok(state.entries.get(&(user_id, question_id)).cloned())
    }
}

impl PlayerRepository for MemoryQuizRepository {
    async fn find_by_id(&self, user_id: UserId) -> QuizResult<Option<Player>> {
        let state = self.state.lock().await;
        Ok(state.players.get(&user_id).cloned())
    }
}

impl RotationStore for MemoryQuizRepository {
    type UnitOfWork = MemoryRotationUnitOfWork;

    async fn begin(&self) -> QuizResult<MemoryRotationUnitOfWork> {
        self.check_fault(FailPoint::Begin)?;

        let committed = self.state.clone().lock_owned().await;
        let working = committed.clone();
        Ok(MemoryRotationUnitOfWork {
            committed,
            working,
            faults: self.faults.clone(),
        })
    }
}

/// One rotation over the in-memory store
pub struct MemoryRotationUnitOfWork {
    committed: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<StdMutex<Vec<FailPoint>>>,
}

impl MemoryRotationUnitOfWork {
    fn check_fault(&self, point: FailPoint) -> QuizResult<()> {
        take_fault(&self.faults, point)
    }
}

impl CatalogUnitOfWork for MemoryRotationUnitOfWork {
    async fn lock_current(&mut self) -> QuizResult<Option<Question>> {
        self.check_fault(FailPoint::LockCurrent)?;
        Ok(self
            .working
            .current
            .and_then(|id| self.working.questions.get(&id).cloned()))
    }

    async fn lock_unstarted(&mut self) -> QuizResult<Vec<QuestionId>> {
        self.check_fault(FailPoint::Selection)?;
        Ok(unstarted_ids(self.working.questions.values()))
    }

    async fn activate(
        &mut self,
        question_id: QuestionId,
        started_at: DateTime<Utc>,
    ) -> QuizResult<Question> {
        self.check_fault(FailPoint::Activation)?;

        let question = self
            .working
            .questions
            .get_mut(&question_id)
            .ok_or(QuizError::QuestionNotFound(question_id))?;
        question.start(started_at)?;
        let activated = question.clone();

        self.working.current = Some(question_id);
        Ok(activated)
    }
}

impl ScoringUnitOfWork for MemoryRotationUnitOfWork {
    async fn credit_correct_answerers(
        &mut self,
        question: &Question,
        points: i64,
    ) -> QuizResult<u64> {
        self.check_fault(FailPoint::Scoring)?;

        let winners = correct_answerers(question, self.working.entries.values());
        for user_id in &winners {
            self.working
                .players
                .entry(*user_id)
                .or_insert_with(|| Player::new(*user_id))
                .points += points;
        }
        Ok(winners.len() as u64)
    }
}

impl RotationUnitOfWork for MemoryRotationUnitOfWork {
    async fn commit(mut self) -> QuizResult<()> {
        self.check_fault(FailPoint::Commit)?;
        *self.committed = self.working;
        Ok(())
    }

    async fn rollback(self) -> QuizResult<()> {
        Ok(())
    }
}
