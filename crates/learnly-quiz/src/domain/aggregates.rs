//! Aggregate roots for the Quiz context.

use std::collections::HashMap;

use learnly_core::aggregate::{AggregateRoot, EventSourcedEntity};
use learnly_core::clock::Clock;
use learnly_core::error::DomainError;
use learnly_core::event::EventMetadata;
use learnly_core::event_store::StoredEvent;
use learnly_core::rng::DeterministicRng;
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    AnswerSubmitted, AttemptCompleted, AttemptStarted, QuizEvent, QuizEventKind,
};

/// Lifecycle state of a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttemptStatus {
    /// The stream exists but no start event has been applied yet.
    NotStarted,
    /// Started and accepting answers.
    InProgress,
    /// Completed; no further mutation accepted.
    Completed,
}

/// The aggregate root for one quiz attempt.
#[derive(Debug)]
pub struct QuizAttempt {
    entity: EventSourcedEntity<QuizEvent>,
    status: AttemptStatus,
    quiz_id: Option<Uuid>,
    user_id: Option<Uuid>,
    question_order: Vec<Uuid>,
    answers: HashMap<Uuid, u32>,
    correct_count: u32,
}

impl QuizAttempt {
    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    /// Returns the quiz under attempt, once started.
    #[must_use]
    pub fn quiz_id(&self) -> Option<Uuid> {
        self.quiz_id
    }

    /// Returns the user taking the quiz, once started.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    /// Returns the fixed question presentation order.
    #[must_use]
    pub fn question_order(&self) -> &[Uuid] {
        &self.question_order
    }

    /// Returns the number of answered questions.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Returns the number of correct answers so far.
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    /// Starts the attempt, fixing a shuffled question order, producing an
    /// `AttemptStarted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the attempt was already
    /// started or the question list is empty.
    pub fn start(
        &mut self,
        quiz_id: Uuid,
        user_id: Uuid,
        question_ids: Vec<Uuid>,
        correlation_id: Uuid,
        clock: &dyn Clock,
        rng: &mut dyn DeterministicRng,
    ) -> Result<(), DomainError> {
        if self.status != AttemptStatus::NotStarted {
            return Err(DomainError::Validation(format!(
                "attempt {} already started",
                self.entity.id()
            )));
        }
        if question_ids.is_empty() {
            return Err(DomainError::Validation(
                "an attempt needs at least one question".to_owned(),
            ));
        }

        let kind = QuizEventKind::AttemptStarted(AttemptStarted {
            attempt_id: self.entity.id(),
            quiz_id,
            user_id,
            question_order: shuffled(question_ids, rng),
        });
        self.when(&kind);
        let event = self.envelope(kind, correlation_id, clock);
        self.entity.record(event);
        Ok(())
    }

    /// Submits an answer for one question, producing an `AnswerSubmitted`
    /// event. Grading happens upstream; the aggregate records the verdict.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the attempt is not in
    /// progress, the question is not part of the attempt, or the question
    /// was already answered.
    pub fn submit_answer(
        &mut self,
        question_id: Uuid,
        selected_option: u32,
        correct: bool,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_in_progress()?;
        if !self.question_order.contains(&question_id) {
            return Err(DomainError::Validation(format!(
                "question {question_id} is not part of attempt {}",
                self.entity.id()
            )));
        }
        if self.answers.contains_key(&question_id) {
            return Err(DomainError::Validation(format!(
                "question {question_id} already answered"
            )));
        }

        let kind = QuizEventKind::AnswerSubmitted(AnswerSubmitted {
            attempt_id: self.entity.id(),
            question_id,
            selected_option,
            correct,
        });
        self.when(&kind);
        let event = self.envelope(kind, correlation_id, clock);
        self.entity.record(event);
        Ok(())
    }

    /// Completes the attempt with the accumulated score, producing an
    /// `AttemptCompleted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the attempt is not in
    /// progress or not all questions have been answered.
    pub fn complete(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_in_progress()?;
        if self.answers.len() != self.question_order.len() {
            return Err(DomainError::Validation(format!(
                "attempt {} has {} of {} questions answered",
                self.entity.id(),
                self.answers.len(),
                self.question_order.len()
            )));
        }

        let total = u32::try_from(self.question_order.len()).map_err(|_| {
            DomainError::Validation("attempt has more questions than representable".to_owned())
        })?;
        let user_id = self.user_id.ok_or_else(|| {
            DomainError::Validation("attempt has no user recorded".to_owned())
        })?;
        let kind = QuizEventKind::AttemptCompleted(AttemptCompleted {
            attempt_id: self.entity.id(),
            user_id,
            score: self.correct_count,
            total,
        });
        self.when(&kind);
        let event = self.envelope(kind, correlation_id, clock);
        self.entity.record(event);
        Ok(())
    }

    fn require_in_progress(&self) -> Result<(), DomainError> {
        match self.status {
            AttemptStatus::InProgress => Ok(()),
            AttemptStatus::NotStarted => Err(DomainError::Validation(format!(
                "attempt {} not started",
                self.entity.id()
            ))),
            AttemptStatus::Completed => Err(DomainError::Validation(format!(
                "attempt {} already completed",
                self.entity.id()
            ))),
        }
    }

    // The single state-transition function used by live mutators and by
    // replay; all state mutation funnels through here.
    fn when(&mut self, kind: &QuizEventKind) {
        match kind {
            QuizEventKind::AttemptStarted(payload) => {
                self.status = AttemptStatus::InProgress;
                self.quiz_id = Some(payload.quiz_id);
                self.user_id = Some(payload.user_id);
                self.question_order = payload.question_order.clone();
            }
            QuizEventKind::AnswerSubmitted(payload) => {
                self.answers
                    .insert(payload.question_id, payload.selected_option);
                if payload.correct {
                    self.correct_count += 1;
                }
            }
            QuizEventKind::AttemptCompleted(_) => {
                self.status = AttemptStatus::Completed;
            }
        }
    }

    fn envelope(
        &self,
        kind: QuizEventKind,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> QuizEvent {
        let event_type = match &kind {
            QuizEventKind::AttemptStarted(_) => super::events::ATTEMPT_STARTED_EVENT_TYPE,
            QuizEventKind::AnswerSubmitted(_) => super::events::ANSWER_SUBMITTED_EVENT_TYPE,
            QuizEventKind::AttemptCompleted(_) => super::events::ATTEMPT_COMPLETED_EVENT_TYPE,
        };
        QuizEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: event_type.to_owned(),
                aggregate_id: self.entity.id(),
                event_version: self.entity.next_event_version(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        }
    }
}

// Forward Fisher-Yates: drawing min at every step keeps the input order.
fn shuffled(mut ids: Vec<Uuid>, rng: &mut dyn DeterministicRng) -> Vec<Uuid> {
    let len = ids.len();
    for i in 0..len.saturating_sub(1) {
        let max = u32::try_from(len - 1).unwrap_or(u32::MAX);
        let min = u32::try_from(i).unwrap_or(u32::MAX);
        let j = rng.next_u32_range(min, max) as usize;
        if j > i && j < len {
            ids.swap(i, j);
        }
    }
    ids
}

impl AggregateRoot for QuizAttempt {
    type Event = QuizEvent;

    fn with_id(id: Uuid) -> Self {
        Self {
            entity: EventSourcedEntity::new(id),
            status: AttemptStatus::NotStarted,
            quiz_id: None,
            user_id: None,
            question_order: Vec::new(),
            answers: HashMap::new(),
            correct_count: 0,
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.entity.id()
    }

    fn version(&self) -> i64 {
        self.entity.version()
    }

    fn apply(&mut self, event: &Self::Event) {
        self.when(&event.kind);
        self.entity.replayed();
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        self.entity.uncommitted()
    }

    fn mark_committed(&mut self) {
        self.entity.mark_committed();
    }

    fn event_from_stored(stored: &StoredEvent) -> Result<Self::Event, DomainError> {
        QuizEvent::from_stored(stored)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use learnly_core::event::DomainEvent;

    use super::*;
    use crate::domain::events::{
        ANSWER_SUBMITTED_EVENT_TYPE, ATTEMPT_COMPLETED_EVENT_TYPE, ATTEMPT_STARTED_EVENT_TYPE,
    };

    #[derive(Debug)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Debug)]
    struct IdentityRng;

    impl DeterministicRng for IdentityRng {
        fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
            min
        }

        fn next_f64(&mut self) -> f64 {
            0.0
        }
    }

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    fn started_attempt(question_ids: Vec<Uuid>) -> QuizAttempt {
        let mut attempt = QuizAttempt::with_id(Uuid::new_v4());
        attempt
            .start(
                Uuid::new_v4(),
                Uuid::new_v4(),
                question_ids,
                Uuid::new_v4(),
                &fixed_clock(),
                &mut IdentityRng,
            )
            .unwrap();
        attempt.mark_committed();
        attempt
    }

    #[test]
    fn test_start_produces_attempt_started_event_at_version_one() {
        // Arrange
        let attempt_id = Uuid::new_v4();
        let quiz_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let questions = vec![Uuid::new_v4(), Uuid::new_v4()];
        let clock = fixed_clock();
        let mut attempt = QuizAttempt::with_id(attempt_id);

        // Act
        attempt
            .start(
                quiz_id,
                user_id,
                questions.clone(),
                correlation_id,
                &clock,
                &mut IdentityRng,
            )
            .unwrap();

        // Assert
        assert_eq!(attempt.version(), 1);
        assert_eq!(attempt.status(), AttemptStatus::InProgress);
        let events = attempt.uncommitted_events();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.event_type(), ATTEMPT_STARTED_EVENT_TYPE);

        let meta = event.metadata();
        assert_eq!(meta.aggregate_id, attempt_id);
        assert_eq!(meta.event_version, 1);
        assert_eq!(meta.correlation_id, correlation_id);
        assert_eq!(meta.causation_id, correlation_id);
        assert_eq!(meta.occurred_at, clock.0);

        match &event.kind {
            QuizEventKind::AttemptStarted(payload) => {
                assert_eq!(payload.attempt_id, attempt_id);
                assert_eq!(payload.quiz_id, quiz_id);
                assert_eq!(payload.user_id, user_id);
                // IdentityRng leaves the order unchanged.
                assert_eq!(payload.question_order, questions);
            }
            other => panic!("expected AttemptStarted, got {other:?}"),
        }
    }

    #[test]
    fn test_start_twice_is_rejected_and_records_nothing() {
        // Arrange
        let mut attempt = started_attempt(vec![Uuid::new_v4()]);

        // Act
        let result = attempt.start(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![Uuid::new_v4()],
            Uuid::new_v4(),
            &fixed_clock(),
            &mut IdentityRng,
        );

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(attempt.uncommitted_events().is_empty());
        assert_eq!(attempt.version(), 1);
    }

    #[test]
    fn test_start_with_no_questions_is_rejected() {
        // Arrange
        let mut attempt = QuizAttempt::with_id(Uuid::new_v4());

        // Act
        let result = attempt.start(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![],
            Uuid::new_v4(),
            &fixed_clock(),
            &mut IdentityRng,
        );

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(attempt.status(), AttemptStatus::NotStarted);
        assert_eq!(attempt.version(), 0);
    }

    #[test]
    fn test_submit_answer_produces_answer_submitted_event() {
        // Arrange
        let question_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let mut attempt = started_attempt(vec![question_id]);

        // Act
        attempt
            .submit_answer(question_id, 2, true, correlation_id, &fixed_clock())
            .unwrap();

        // Assert
        assert_eq!(attempt.version(), 2);
        assert_eq!(attempt.answered_count(), 1);
        assert_eq!(attempt.correct_count(), 1);

        let events = attempt.uncommitted_events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type(), ANSWER_SUBMITTED_EVENT_TYPE);
        assert_eq!(event.metadata().event_version, 2);

        match &event.kind {
            QuizEventKind::AnswerSubmitted(payload) => {
                assert_eq!(payload.question_id, question_id);
                assert_eq!(payload.selected_option, 2);
                assert!(payload.correct);
            }
            other => panic!("expected AnswerSubmitted, got {other:?}"),
        }
    }

    #[test]
    fn test_submit_answer_twice_for_same_question_is_rejected() {
        // Arrange
        let question_id = Uuid::new_v4();
        let mut attempt = started_attempt(vec![question_id]);
        attempt
            .submit_answer(question_id, 0, false, Uuid::new_v4(), &fixed_clock())
            .unwrap();

        // Act
        let result =
            attempt.submit_answer(question_id, 1, true, Uuid::new_v4(), &fixed_clock());

        // Assert
        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("already answered")),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(attempt.answered_count(), 1);
        assert_eq!(attempt.version(), 2);
    }

    #[test]
    fn test_submit_answer_for_unknown_question_is_rejected() {
        // Arrange
        let mut attempt = started_attempt(vec![Uuid::new_v4()]);
        let stranger = Uuid::new_v4();

        // Act
        let result = attempt.submit_answer(stranger, 0, true, Uuid::new_v4(), &fixed_clock());

        // Assert
        match result.unwrap_err() {
            DomainError::Validation(msg) => {
                assert!(msg.contains(&stranger.to_string()));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_submit_answer_before_start_is_rejected() {
        // Arrange
        let mut attempt = QuizAttempt::with_id(Uuid::new_v4());

        // Act
        let result =
            attempt.submit_answer(Uuid::new_v4(), 0, true, Uuid::new_v4(), &fixed_clock());

        // Assert
        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("not started")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_scores_correct_answers() {
        // Arrange
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let mut attempt = started_attempt(vec![q1, q2]);
        attempt
            .submit_answer(q1, 1, true, Uuid::new_v4(), &fixed_clock())
            .unwrap();
        attempt
            .submit_answer(q2, 3, false, Uuid::new_v4(), &fixed_clock())
            .unwrap();

        // Act
        attempt.complete(correlation_id, &fixed_clock()).unwrap();

        // Assert
        assert_eq!(attempt.status(), AttemptStatus::Completed);
        assert_eq!(attempt.version(), 4);

        let events = attempt.uncommitted_events();
        let last = events.last().unwrap();
        assert_eq!(last.event_type(), ATTEMPT_COMPLETED_EVENT_TYPE);
        match &last.kind {
            QuizEventKind::AttemptCompleted(payload) => {
                assert_eq!(payload.score, 1);
                assert_eq!(payload.total, 2);
            }
            other => panic!("expected AttemptCompleted, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_with_unanswered_questions_is_rejected() {
        // Arrange
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let mut attempt = started_attempt(vec![q1, q2]);
        attempt
            .submit_answer(q1, 0, true, Uuid::new_v4(), &fixed_clock())
            .unwrap();

        // Act
        let result = attempt.complete(Uuid::new_v4(), &fixed_clock());

        // Assert
        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("1 of 2")),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(attempt.status(), AttemptStatus::InProgress);
    }

    #[test]
    fn test_mutation_after_complete_is_rejected() {
        // Arrange
        let q1 = Uuid::new_v4();
        let mut attempt = started_attempt(vec![q1]);
        attempt
            .submit_answer(q1, 0, true, Uuid::new_v4(), &fixed_clock())
            .unwrap();
        attempt.complete(Uuid::new_v4(), &fixed_clock()).unwrap();

        // Act
        let submit = attempt.submit_answer(q1, 1, true, Uuid::new_v4(), &fixed_clock());
        let complete = attempt.complete(Uuid::new_v4(), &fixed_clock());

        // Assert
        assert!(matches!(submit, Err(DomainError::Validation(_))));
        assert!(matches!(complete, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_replay_reproduces_mutator_state() {
        // Arrange
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let mut live = started_attempt(vec![q1, q2]);
        live.submit_answer(q1, 1, true, Uuid::new_v4(), &fixed_clock())
            .unwrap();
        live.submit_answer(q2, 0, false, Uuid::new_v4(), &fixed_clock())
            .unwrap();
        live.complete(Uuid::new_v4(), &fixed_clock()).unwrap();

        // The full history: the start event was committed in the helper,
        // so rebuild it alongside the still-buffered tail.
        let mut replayed = QuizAttempt::with_id(live.aggregate_id());
        let start_kind = QuizEventKind::AttemptStarted(AttemptStarted {
            attempt_id: live.aggregate_id(),
            quiz_id: live.quiz_id().unwrap(),
            user_id: live.user_id().unwrap(),
            question_order: live.question_order().to_vec(),
        });
        let start_event = QuizEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: ATTEMPT_STARTED_EVENT_TYPE.to_owned(),
                aggregate_id: live.aggregate_id(),
                event_version: 1,
                correlation_id: Uuid::new_v4(),
                causation_id: Uuid::new_v4(),
                occurred_at: fixed_clock().0,
            },
            kind: start_kind,
        };

        // Act
        replayed.apply(&start_event);
        for event in live.uncommitted_events().to_vec() {
            replayed.apply(&event);
        }

        // Assert
        assert_eq!(replayed.version(), live.version());
        assert_eq!(replayed.status(), live.status());
        assert_eq!(replayed.answered_count(), live.answered_count());
        assert_eq!(replayed.correct_count(), live.correct_count());
        assert!(replayed.uncommitted_events().is_empty());
    }
}
