//! Projections fed live through the event bus, and rebuilt from the
//! global event log.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use learnly_core::repository::AggregateRepository;
use learnly_event_store::InMemoryEventStore;
use learnly_lessons::domain::aggregates::LessonProgress;
use learnly_lessons::domain::events::LESSON_COMPLETED_EVENT_TYPE;
use learnly_messaging::{EventBus, EventHandler};
use learnly_progress::{LessonCompletionProjection, StreakProjection};
use learnly_quiz::domain::aggregates::QuizAttempt;
use learnly_quiz::domain::events::ATTEMPT_COMPLETED_EVENT_TYPE;
use learnly_test_support::{FixedClock, MockRng, init_tracing};

use learnly_core::aggregate::AggregateRoot;
use learnly_core::clock::Clock;
use learnly_core::event_store::EventStore;
use learnly_core::publisher::EventPublisher;

struct Harness {
    store: Arc<InMemoryEventStore>,
    lessons: Arc<AggregateRepository<LessonProgress>>,
    quizzes: Arc<AggregateRepository<QuizAttempt>>,
    streak: Arc<StreakProjection>,
    completions: Arc<LessonCompletionProjection>,
}

fn harness() -> Harness {
    init_tracing();
    let store = Arc::new(InMemoryEventStore::new());
    let event_bus = Arc::new(EventBus::new());

    let streak = Arc::new(StreakProjection::new());
    let completions = Arc::new(LessonCompletionProjection::new());
    event_bus.subscribe(
        LESSON_COMPLETED_EVENT_TYPE,
        Arc::clone(&streak) as Arc<dyn EventHandler>,
    );
    event_bus.subscribe(
        ATTEMPT_COMPLETED_EVENT_TYPE,
        Arc::clone(&streak) as Arc<dyn EventHandler>,
    );
    event_bus.subscribe(
        LESSON_COMPLETED_EVENT_TYPE,
        Arc::clone(&completions) as Arc<dyn EventHandler>,
    );

    Harness {
        lessons: Arc::new(AggregateRepository::new(
            Arc::clone(&store) as Arc<dyn EventStore>,
            Arc::clone(&event_bus) as Arc<dyn EventPublisher>,
        )),
        quizzes: Arc::new(AggregateRepository::new(
            Arc::clone(&store) as Arc<dyn EventStore>,
            Arc::clone(&event_bus) as Arc<dyn EventPublisher>,
        )),
        store,
        streak,
        completions,
    }
}

fn clock_on(year: i32, month: u32, day: u32) -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

async fn complete_lesson(harness: &Harness, user_id: Uuid, lesson_id: Uuid, clock: &dyn Clock) {
    let mut progress = LessonProgress::with_id(Uuid::new_v4());
    progress
        .unlock(lesson_id, user_id, Uuid::new_v4(), clock)
        .unwrap();
    progress.start(Uuid::new_v4(), clock).unwrap();
    progress.complete(Uuid::new_v4(), clock).unwrap();
    harness.lessons.save(&mut progress).await.unwrap();
}

async fn complete_quiz(harness: &Harness, user_id: Uuid, clock: &dyn Clock) {
    let question = Uuid::new_v4();
    let mut attempt = QuizAttempt::with_id(Uuid::new_v4());
    attempt
        .start(
            Uuid::new_v4(),
            user_id,
            vec![question],
            Uuid::new_v4(),
            clock,
            &mut MockRng,
        )
        .unwrap();
    attempt
        .submit_answer(question, 0, true, Uuid::new_v4(), clock)
        .unwrap();
    attempt.complete(Uuid::new_v4(), clock).unwrap();
    harness.quizzes.save(&mut attempt).await.unwrap();
}

#[tokio::test]
async fn test_streak_spans_lesson_and_quiz_completions() {
    // Arrange
    let harness = harness();
    let user_id = Uuid::new_v4();

    // Act: lesson on day one, quiz on day two.
    complete_lesson(&harness, user_id, Uuid::new_v4(), &clock_on(2026, 3, 10)).await;
    complete_quiz(&harness, user_id, &clock_on(2026, 3, 11)).await;

    // Assert
    assert_eq!(harness.streak.current_streak(user_id, date(2026, 3, 11)), 2);
    assert_eq!(harness.streak.active_day_count(user_id), 2);
}

#[tokio::test]
async fn test_completion_projection_tracks_lessons_only() {
    // Arrange
    let harness = harness();
    let user_id = Uuid::new_v4();
    let lesson_id = Uuid::new_v4();

    // Act
    complete_lesson(&harness, user_id, lesson_id, &clock_on(2026, 3, 10)).await;
    complete_quiz(&harness, user_id, &clock_on(2026, 3, 10)).await;

    // Assert
    assert!(harness.completions.is_completed(user_id, lesson_id));
    assert_eq!(harness.completions.completed_count(user_id), 1);
}

#[tokio::test]
async fn test_rebuild_from_log_matches_live_state() {
    // Arrange
    let harness = harness();
    let user_id = Uuid::new_v4();
    let lesson_id = Uuid::new_v4();
    complete_lesson(&harness, user_id, lesson_id, &clock_on(2026, 3, 10)).await;
    complete_quiz(&harness, user_id, &clock_on(2026, 3, 11)).await;

    // Act: fresh projections fed only by the persisted log.
    let rebuilt_streak = StreakProjection::new();
    let rebuilt_completions = LessonCompletionProjection::new();
    rebuilt_streak.rebuild(harness.store.as_ref()).await.unwrap();
    rebuilt_completions
        .rebuild(harness.store.as_ref())
        .await
        .unwrap();

    // Assert
    assert_eq!(
        rebuilt_streak.current_streak(user_id, date(2026, 3, 11)),
        harness.streak.current_streak(user_id, date(2026, 3, 11)),
    );
    assert_eq!(
        rebuilt_completions.is_completed(user_id, lesson_id),
        harness.completions.is_completed(user_id, lesson_id),
    );
}

#[tokio::test]
async fn test_rebuild_is_repeatable() {
    // Arrange
    let harness = harness();
    let user_id = Uuid::new_v4();
    complete_lesson(&harness, user_id, Uuid::new_v4(), &clock_on(2026, 3, 10)).await;
    let projection = StreakProjection::new();

    // Act
    projection.rebuild(harness.store.as_ref()).await.unwrap();
    projection.rebuild(harness.store.as_ref()).await.unwrap();

    // Assert
    assert_eq!(projection.active_day_count(user_id), 1);
}
