//! Commands for the Lessons context.

use learnly_core::command::Command;
use uuid::Uuid;

/// Unlock a lesson for a user.
#[derive(Debug, Clone)]
pub struct UnlockLesson {
    /// Unique identifier of this command instance.
    pub command_id: Uuid,
    /// Correlation id carried onto the emitted events.
    pub correlation_id: Uuid,
    /// The progress stream to create.
    pub progress_id: Uuid,
    /// The lesson to unlock.
    pub lesson_id: Uuid,
    /// The user to unlock it for.
    pub user_id: Uuid,
}

impl Command for UnlockLesson {
    fn command_type(&self) -> &'static str {
        "lesson.unlock"
    }

    fn command_id(&self) -> Uuid {
        self.command_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Mark an unlocked lesson as opened.
#[derive(Debug, Clone)]
pub struct StartLesson {
    /// Unique identifier of this command instance.
    pub command_id: Uuid,
    /// Correlation id carried onto the emitted events.
    pub correlation_id: Uuid,
    /// The progress stream to mutate.
    pub progress_id: Uuid,
}

impl Command for StartLesson {
    fn command_type(&self) -> &'static str {
        "lesson.start"
    }

    fn command_id(&self) -> Uuid {
        self.command_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Mark an in-progress lesson as finished.
#[derive(Debug, Clone)]
pub struct CompleteLesson {
    /// Unique identifier of this command instance.
    pub command_id: Uuid,
    /// Correlation id carried onto the emitted events.
    pub correlation_id: Uuid,
    /// The progress stream to mutate.
    pub progress_id: Uuid,
}

impl Command for CompleteLesson {
    fn command_type(&self) -> &'static str {
        "lesson.complete"
    }

    fn command_id(&self) -> Uuid {
        self.command_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Retire a progress stream instead of deleting it.
#[derive(Debug, Clone)]
pub struct ArchiveLessonProgress {
    /// Unique identifier of this command instance.
    pub command_id: Uuid,
    /// Correlation id carried onto the emitted events.
    pub correlation_id: Uuid,
    /// The progress stream to archive.
    pub progress_id: Uuid,
    /// Operator-supplied reason, if any.
    pub reason: Option<String>,
}

impl Command for ArchiveLessonProgress {
    fn command_type(&self) -> &'static str {
        "lesson.archive_progress"
    }

    fn command_id(&self) -> Uuid {
        self.command_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
