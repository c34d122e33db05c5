use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an ingestion task.
///
/// Transitions only move forward: `Pending -> Processing -> {Completed, Failed}`.
/// Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether moving from `self` to `next` keeps the status monotone.
    /// Re-asserting the current status is always allowed (reconciliation
    /// passes are redundant by design); leaving a terminal state is not.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            TaskStatus::Pending => true,
            TaskStatus::Processing => !matches!(next, TaskStatus::Pending),
            TaskStatus::Completed | TaskStatus::Failed => false,
        }
    }

    /// Maps the conversion worker's own status vocabulary onto ours.
    ///
    /// Total over all inputs: an unrecognized worker status maps to `None`,
    /// which callers must treat as "leave the task unchanged".
    pub fn from_worker_status(raw: &str) -> Option<TaskStatus> {
        match raw.to_ascii_lowercase().as_str() {
            "pending" | "queued" | "waiting" | "accepted" => Some(TaskStatus::Processing),
            "running" | "processing" | "started" | "in_progress" => Some(TaskStatus::Processing),
            "success" | "succeeded" | "completed" | "done" => Some(TaskStatus::Completed),
            "failed" | "failure" | "error" | "cancelled" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
