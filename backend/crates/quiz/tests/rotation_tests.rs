//! Rotation, scoring and ledger behaviour against the in-memory store

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use kernel::id::{QuestionId, UserId};
use quiz::QuizError;
use quiz::application::{
    AnswerLedger, PlayerStatusUseCase, QuestionCatalog, QuestionPicker, RotationController,
    SeededPicker, ShowQuestionUseCase, SubmitAnswerInput, SubmitAnswerUseCase,
};
use quiz::domain::entities::{Answer, Question};
use quiz::domain::repository::{AnswerRepository, QuestionRepository, RotationStore};
use quiz::domain::services::latest_started;
use quiz::domain::value_objects::{AnswerIndex, RotationState};
use quiz::infra::{FailPoint, MemoryQuizRepository};

/// Always takes the first candidate
struct FirstPicker;

impl QuestionPicker for FirstPicker {
    fn pick(&self, candidates: &[QuestionId]) -> Option<QuestionId> {
        candidates.first().copied()
    }
}

/// Takes the given question while it is a candidate
struct PreferPicker(QuestionId);

impl QuestionPicker for PreferPicker {
    fn pick(&self, candidates: &[QuestionId]) -> Option<QuestionId> {
        candidates
            .iter()
            .find(|&&id| id == self.0)
            .or(candidates.first())
            .copied()
    }
}

/// Returns a question that is not a candidate
struct RoguePicker;

impl QuestionPicker for RoguePicker {
    fn pick(&self, _candidates: &[QuestionId]) -> Option<QuestionId> {
        Some(QuestionId::new())
    }
}

struct Seeded {
    question: Question,
    answers: Vec<Answer>,
}

/// Question with choices A, B, C where B is correct
async fn add_abc_question(repo: &MemoryQuizRepository, sentence: &str) -> Seeded {
    let question = Question::new(UserId::new(), sentence);
    let answers: Vec<Answer> = ["A", "B", "C"]
        .into_iter()
        .map(|s| Answer::new(question.id, s))
        .collect();
    let question = question.with_right_answer(answers[1].id);
    repo.add_question(&question, &answers).await.unwrap();
    Seeded { question, answers }
}

fn controller(
    repo: &Arc<MemoryQuizRepository>,
    picker: impl QuestionPicker + 'static,
) -> RotationController<MemoryQuizRepository> {
    RotationController::new(repo.clone(), QuestionCatalog::new(Arc::new(picker)))
}

async fn current_id(repo: &MemoryQuizRepository) -> Option<QuestionId> {
    repo.find_current().await.unwrap().map(|q| q.id)
}

/// The pointer and the newest activation agree, and that newest one is unique
async fn assert_single_current(repo: &MemoryQuizRepository) {
    let questions = repo.questions().await;
    let latest = latest_started(&questions);
    assert_eq!(latest.map(|q| q.id), current_id(repo).await);

    if let Some(latest) = latest {
        let ties = questions
            .iter()
            .filter(|q| q.started_at == latest.started_at)
            .count();
        assert_eq!(ties, 1);
    }
}

// ============================================================================
// Rotation
// ============================================================================

#[tokio::test]
async fn first_advance_activates_without_scoring() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let seeded = add_abc_question(&repo, "Q1").await;
    let rotation = controller(&repo, FirstPicker);

    assert!(current_id(&repo).await.is_none());

    let outcome = rotation.advance().await.unwrap();
    assert!(outcome.retired.is_none());
    assert_eq!(outcome.credited, 0);
    assert_eq!(outcome.activated.id, seeded.question.id);
    assert!(outcome.activated.is_started());

    assert_eq!(current_id(&repo).await, Some(seeded.question.id));
    assert_eq!(rotation.state(), RotationState::Idle);
}

#[tokio::test]
async fn resubmitted_correct_answer_is_credited_once() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let q1 = add_abc_question(&repo, "Q1").await;
    let q2 = add_abc_question(&repo, "Q2").await;
    let rotation = controller(&repo, SeededPicker::new(7));

    let first = rotation.advance().await.unwrap().activated;
    let (current, next) = if first.id == q1.question.id {
        (&q1, &q2)
    } else {
        (&q2, &q1)
    };
    let frozen_at = first.started_at;

    let user = UserId::new();
    let submit = SubmitAnswerUseCase::new(repo.clone(), repo.clone());
    for index in [1, 2] {
        submit
            .execute(SubmitAnswerInput {
                user_id: user,
                answer_index: index,
            })
            .await
            .unwrap();
    }

    let entries = repo.entries_for(current.question.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].answer_id, current.answers[1].id);

    let outcome = rotation.advance().await.unwrap();
    assert_eq!(outcome.retired.map(|q| q.id), Some(current.question.id));
    assert_eq!(outcome.credited, 1);
    assert_eq!(outcome.activated.id, next.question.id);
    assert_eq!(repo.points(user).await, Some(1));

    let questions = repo.questions().await;
    let retired = questions
        .iter()
        .find(|q| q.id == current.question.id)
        .unwrap();
    assert_eq!(retired.started_at, frozen_at);
    assert!(outcome.activated.started_at > frozen_at);
    assert_single_current(&repo).await;
}

#[tokio::test]
async fn credits_exactly_the_correct_answerers() {
    let repo = Arc::new(MemoryQuizRepository::new());
    add_abc_question(&repo, "Q1").await;
    add_abc_question(&repo, "Q2").await;
    let rotation = controller(&repo, FirstPicker);
    let ledger = AnswerLedger::new(repo.clone());

    let current = rotation.advance().await.unwrap().activated;
    let answers = ledger.get_answers_for_question(current.id).await.unwrap();
    assert_eq!(answers.len(), 3);
    let right = current.right_answer_id.unwrap();
    let wrong = answers.iter().find(|a| a.id != right).unwrap().id;

    let alice = UserId::new();
    let bob = UserId::new();
    let carol = UserId::new();
    repo.add_player(carol, 10).await;
    ledger.submit(bob, current.id, wrong).await.unwrap();
    ledger.submit(carol, current.id, right).await.unwrap();
    ledger.submit(alice, current.id, right).await.unwrap();

    let outcome = rotation.advance().await.unwrap();
    assert_eq!(outcome.credited, 2);
    assert_eq!(repo.points(alice).await, Some(1));
    assert_eq!(repo.points(bob).await, Some(0));
    assert_eq!(repo.points(carol).await, Some(11));
}

#[tokio::test]
async fn question_without_right_answer_scores_nobody() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let poll = Question::new(UserId::new(), "Opinion poll");
    let answers = vec![Answer::new(poll.id, "yes"), Answer::new(poll.id, "no")];
    repo.add_question(&poll, &answers).await.unwrap();
    add_abc_question(&repo, "Q2").await;

    let rotation = controller(&repo, PreferPicker(poll.id));
    assert_eq!(rotation.advance().await.unwrap().activated.id, poll.id);

    let user = UserId::new();
    AnswerLedger::new(repo.clone())
        .submit(user, poll.id, answers[0].id)
        .await
        .unwrap();

    let outcome = rotation.advance().await.unwrap();
    assert_eq!(outcome.credited, 0);
    assert_eq!(repo.points(user).await, Some(0));
}

#[tokio::test]
async fn never_repeats_and_exhausts() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let mut expected = HashSet::new();
    for i in 0..5 {
        expected.insert(add_abc_question(&repo, &format!("Q{i}")).await.question.id);
    }
    let rotation = controller(&repo, SeededPicker::new(42));

    let mut seen = HashSet::new();
    for _ in 0..5 {
        let outcome = rotation.advance().await.unwrap();
        assert!(seen.insert(outcome.activated.id), "question activated twice");
        assert_single_current(&repo).await;
    }
    assert_eq!(seen, expected);

    let before = current_id(&repo).await;
    let err = rotation.advance().await.unwrap_err();
    assert!(matches!(err, QuizError::Rotation(_)));
    assert!(matches!(err.cause(), QuizError::Exhausted));
    assert_eq!(current_id(&repo).await, before);
}

#[tokio::test]
async fn exhausted_catalog_applies_no_scoring() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let only = add_abc_question(&repo, "Q1").await;
    let rotation = controller(&repo, FirstPicker);
    rotation.advance().await.unwrap();

    let user = UserId::new();
    AnswerLedger::new(repo.clone())
        .submit(user, only.question.id, only.answers[1].id)
        .await
        .unwrap();

    let err = rotation.advance().await.unwrap_err();
    assert!(matches!(err.cause(), QuizError::Exhausted));
    assert_eq!(repo.points(user).await, Some(0));
    assert_eq!(current_id(&repo).await, Some(only.question.id));
}

#[tokio::test]
async fn empty_catalog_is_exhausted() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let rotation = controller(&repo, FirstPicker);

    let err = rotation.advance().await.unwrap_err();
    assert!(matches!(err.cause(), QuizError::Exhausted));
    assert!(current_id(&repo).await.is_none());
}

// ============================================================================
// Rollback
// ============================================================================

/// One current question answered correctly by `user`, one unstarted question left
async fn answered_setup() -> (
    Arc<MemoryQuizRepository>,
    RotationController<MemoryQuizRepository>,
    UserId,
    QuestionId,
) {
    let repo = Arc::new(MemoryQuizRepository::new());
    add_abc_question(&repo, "Q1").await;
    add_abc_question(&repo, "Q2").await;
    let rotation = controller(&repo, FirstPicker);

    let current = rotation.advance().await.unwrap().activated;
    let user = UserId::new();
    AnswerLedger::new(repo.clone())
        .submit(user, current.id, current.right_answer_id.unwrap())
        .await
        .unwrap();

    (repo, rotation, user, current.id)
}

#[tokio::test]
async fn failure_at_each_step_leaves_state_unchanged() {
    for point in [
        FailPoint::Begin,
        FailPoint::LockCurrent,
        FailPoint::Scoring,
        FailPoint::Selection,
        FailPoint::Activation,
        FailPoint::Commit,
    ] {
        let (repo, rotation, user, current) = answered_setup().await;
        let questions_before = repo.questions().await;

        repo.fail_next(point);
        let err = rotation.advance().await.unwrap_err();
        assert!(matches!(err, QuizError::Rotation(_)), "{point:?}");
        assert!(matches!(err.cause(), QuizError::Storage(_)), "{point:?}");
        assert!(err.is_retryable(), "{point:?}");

        assert_eq!(repo.points(user).await, Some(0), "{point:?}");
        assert_eq!(current_id(&repo).await, Some(current), "{point:?}");
        let mut after = repo.questions().await;
        let mut before = questions_before.clone();
        after.sort_by_key(|q| q.id);
        before.sort_by_key(|q| q.id);
        assert_eq!(after, before, "{point:?}");
        assert_eq!(rotation.state(), RotationState::Idle);

        // Retry succeeds and scores exactly once
        let outcome = rotation.advance().await.unwrap();
        assert_eq!(outcome.credited, 1, "{point:?}");
        assert_eq!(repo.points(user).await, Some(1), "{point:?}");
    }
}

#[tokio::test]
async fn picker_returning_non_candidate_rolls_back() {
    let (repo, _, user, current) = answered_setup().await;
    let rogue = controller(&repo, RoguePicker);

    let err = rogue.advance().await.unwrap_err();
    assert!(matches!(err.cause(), QuizError::Internal(_)));
    assert_eq!(repo.points(user).await, Some(0));
    assert_eq!(current_id(&repo).await, Some(current));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_advances_activate_distinct_questions() {
    let repo = Arc::new(MemoryQuizRepository::new());
    for i in 0..8 {
        add_abc_question(&repo, &format!("Q{i}")).await;
    }
    let rotation = Arc::new(controller(&repo, SeededPicker::new(3)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let rotation = rotation.clone();
            tokio::spawn(async move { rotation.advance().await })
        })
        .collect();

    let mut activated = HashSet::new();
    let mut retired = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(activated.insert(outcome.activated.id));
        if outcome.retired.is_some() {
            retired += 1;
        }
    }

    // Exactly one rotation found no current question
    assert_eq!(retired, 7);
    assert_eq!(activated.len(), 8);
    assert_single_current(&repo).await;
    assert_eq!(rotation.state(), RotationState::Idle);
}

#[tokio::test]
async fn state_is_advancing_while_rotation_waits() {
    let repo = Arc::new(MemoryQuizRepository::new());
    add_abc_question(&repo, "Q1").await;
    let rotation = Arc::new(controller(&repo, FirstPicker));

    // An open unit of work blocks other rotations until dropped
    let held = repo.begin().await.unwrap();

    let task = {
        let rotation = rotation.clone();
        tokio::spawn(async move { rotation.advance().await })
    };

    let mut advancing = false;
    for _ in 0..100 {
        if rotation.state() == RotationState::Advancing {
            advancing = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(advancing);

    drop(held);
    task.await.unwrap().unwrap();
    assert_eq!(rotation.state(), RotationState::Idle);
}

// ============================================================================
// Ledger
// ============================================================================

#[tokio::test]
async fn submit_is_idempotent_and_last_write_wins() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let seeded = add_abc_question(&repo, "Q1").await;
    let ledger = AnswerLedger::new(repo.clone());
    let user = UserId::new();
    let qid = seeded.question.id;

    ledger.submit(user, qid, seeded.answers[0].id).await.unwrap();
    ledger.submit(user, qid, seeded.answers[0].id).await.unwrap();
    let entries = repo.entries_for(qid).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].answer_id, seeded.answers[0].id);

    ledger.submit(user, qid, seeded.answers[2].id).await.unwrap();
    let entries = repo.entries_for(qid).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].answer_id, seeded.answers[2].id);
}

#[tokio::test]
async fn submit_rejects_answer_of_another_question() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let q1 = add_abc_question(&repo, "Q1").await;
    let q2 = add_abc_question(&repo, "Q2").await;
    let ledger = AnswerLedger::new(repo.clone());

    let err = ledger
        .submit(UserId::new(), q1.question.id, q2.answers[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::InvalidChoice(_)));
    assert!(repo.entries_for(q1.question.id).await.is_empty());
    assert!(repo.entries_for(q2.question.id).await.is_empty());
}

#[tokio::test]
async fn submit_index_checks_bounds() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let seeded = add_abc_question(&repo, "Q1").await;
    let ledger = AnswerLedger::new(repo.clone());
    let user = UserId::new();

    let (entry, answer) = ledger
        .submit_index(user, seeded.question.id, AnswerIndex::new(3).unwrap())
        .await
        .unwrap();
    assert_eq!(answer.id, seeded.answers[2].id);
    assert_eq!(entry.answer_id, answer.id);

    let err = ledger
        .submit_index(user, seeded.question.id, AnswerIndex::new(4).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::InvalidChoice(_)));
    assert_eq!(
        repo.entries_for(seeded.question.id).await[0].answer_id,
        seeded.answers[2].id
    );
}

#[tokio::test]
async fn question_without_answers_cannot_be_answered() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let question = Question::new(UserId::new(), "Blank");
    repo.add_question(&question, &[]).await.unwrap();
    let ledger = AnswerLedger::new(repo.clone());

    assert!(ledger.get_answers_for_question(question.id).await.unwrap().is_empty());
    let err = ledger
        .submit_index(UserId::new(), question.id, AnswerIndex::FIRST)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::InvalidChoice(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resubmits_leave_one_entry() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let seeded = add_abc_question(&repo, "Q1").await;
    let ledger = Arc::new(AnswerLedger::new(repo.clone()));
    let user = UserId::new();
    let qid = seeded.question.id;
    let submitted: HashSet<_> = seeded.answers[..2].iter().map(|a| a.id).collect();

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let ledger = ledger.clone();
            let answer_id = seeded.answers[i % 2].id;
            tokio::spawn(async move { ledger.submit(user, qid, answer_id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = repo.entries_for(qid).await;
    assert_eq!(entries.len(), 1);
    assert!(submitted.contains(&entries[0].answer_id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn submits_racing_a_rotation_are_credited_at_most_once() {
    let repo = Arc::new(MemoryQuizRepository::new());
    for i in 0..3 {
        add_abc_question(&repo, &format!("Q{i}")).await;
    }
    let rotation = Arc::new(controller(&repo, FirstPicker));
    let current = rotation.advance().await.unwrap().activated;
    let right = current.right_answer_id.unwrap();

    let ledger = Arc::new(AnswerLedger::new(repo.clone()));
    let user = UserId::new();

    let submits: Vec<_> = (0..20)
        .map(|_| {
            let ledger = ledger.clone();
            let question_id = current.id;
            tokio::spawn(async move { ledger.submit(user, question_id, right).await })
        })
        .collect();
    let advance = {
        let rotation = rotation.clone();
        tokio::spawn(async move { rotation.advance().await })
    };

    let outcome = advance.await.unwrap().unwrap();
    assert_eq!(outcome.retired.map(|q| q.id), Some(current.id));
    for handle in submits {
        handle.await.unwrap().unwrap();
    }

    let credited = repo.points(user).await.unwrap_or(0);
    assert!(credited <= 1, "credited {credited} times");
    assert_eq!(repo.entries_for(current.id).await.len(), 1);

    // The retired question is never scored again
    rotation.advance().await.unwrap();
    assert_eq!(repo.points(user).await.unwrap_or(0), credited);
}

#[tokio::test]
async fn catalog_rejects_foreign_right_answer() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let other = add_abc_question(&repo, "Q1").await;

    let question = Question::new(UserId::new(), "Q2");
    let answers = vec![Answer::new(question.id, "A"), Answer::new(question.id, "B")];
    let question = question.with_right_answer(other.answers[0].id);

    let err = repo.add_question(&question, &answers).await.unwrap_err();
    assert!(matches!(err, QuizError::InvalidChoice(_)));
    assert!(repo.questions().await.iter().all(|q| q.id != question.id));
    assert!(repo.find_by_question(question.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn submit_storage_failure_is_reported() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let seeded = add_abc_question(&repo, "Q1").await;
    let ledger = AnswerLedger::new(repo.clone());

    repo.fail_next(FailPoint::Submit);
    let err = ledger
        .submit(UserId::new(), seeded.question.id, seeded.answers[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::Storage(_)));
    assert!(repo.entries_for(seeded.question.id).await.is_empty());
}

// ============================================================================
// Use cases
// ============================================================================

#[tokio::test]
async fn use_cases_follow_the_current_question() {
    let repo = Arc::new(MemoryQuizRepository::new());
    let seeded = add_abc_question(&repo, "Q1").await;
    let show = ShowQuestionUseCase::new(repo.clone(), repo.clone());
    let submit = SubmitAnswerUseCase::new(repo.clone(), repo.clone());
    let status = PlayerStatusUseCase::new(repo.clone(), repo.clone(), repo.clone());
    let user = UserId::new();

    assert!(matches!(
        show.execute().await.unwrap_err(),
        QuizError::NoCurrentQuestion
    ));
    let err = submit
        .execute(SubmitAnswerInput {
            user_id: user,
            answer_index: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NoCurrentQuestion));
    assert!(matches!(
        status.execute(user).await.unwrap_err(),
        QuizError::PlayerNotFound(_)
    ));

    controller(&repo, FirstPicker).advance().await.unwrap();

    let shown = show.execute().await.unwrap();
    assert_eq!(shown.question.id, seeded.question.id);
    let numbers: Vec<u32> = shown.answers.iter().map(|(i, _)| i.get()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(shown.answers[0].1.id, seeded.answers[0].id);

    let err = submit
        .execute(SubmitAnswerInput {
            user_id: user,
            answer_index: i64::from(u32::MAX) + 1,
        })
        .await
        .unwrap_err();
    match err {
        QuizError::InvalidChoice(message) => assert!(message.contains("out of range")),
        other => panic!("expected invalid choice, got {other:?}"),
    }

    for bad in [0, -3, 4] {
        let err = submit
            .execute(SubmitAnswerInput {
                user_id: user,
                answer_index: bad,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::InvalidChoice(_)), "index {bad}");
    }

    let output = submit
        .execute(SubmitAnswerInput {
            user_id: user,
            answer_index: 2,
        })
        .await
        .unwrap();
    assert_eq!(output.answer.id, seeded.answers[1].id);

    let player = status.execute(user).await.unwrap();
    assert_eq!(player.points, 0);
    assert_eq!(player.current_question_id, Some(seeded.question.id));
    assert_eq!(player.current_answer_index, AnswerIndex::new(2));
}
