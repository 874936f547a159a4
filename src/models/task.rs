use super::{contains_ignore_case, trimmed_opt, NON_BLANK};
use crate::error::AppError;
use crate::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(
    Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Numeric rank for sorting: low = 1, medium = 2, high = 3.
    pub fn rank(self) -> u8 {
        match self {
            TaskPriority::Low => 1,
            TaskPriority::Medium => 2,
            TaskPriority::High => 3,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        })
    }
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is done.
    Completed,
}

impl TaskStatus {
    /// Any status may move to any other status; staying put is not a transition.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        self != next
    }

    pub fn check_transition(self, next: TaskStatus) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Invalid status transition from {} to {}",
                self, next
            )))
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        })
    }
}

/// Input for creating a task inside a list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Must be between 1 and 200 characters and not only whitespace.
    #[validate(
        length(min = 1, max = 200),
        regex(path = "NON_BLANK", message = "Title must not be blank")
    )]
    pub title: String,

    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to medium.
    pub priority: Option<TaskPriority>,

    /// User to assign the task to on creation.
    pub assigned_to: Option<Uuid>,
}

/// Input for editing a task. Fields left as `None` are unchanged.
///
/// An empty `description` clears it. Status changes go through their own operation so the
/// transition rules apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(
        length(min = 1, max = 200),
        regex(path = "NON_BLANK", message = "Title must not be blank")
    )]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub priority: Option<TaskPriority>,

    pub assigned_to: Option<Uuid>,
}

/// Represents a task entity as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// The list this task belongs to.
    pub task_list_id: Uuid,
    /// Identifier of the user to whom the task is assigned (optional).
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a [`Task`].
///
/// The nested options on `description` and `assigned_to` distinguish "leave alone"
/// (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    /// Status the caller last saw. The update fails with `Conflict` if the stored task has
    /// moved on since.
    pub expected_status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(input: UpdateTaskRequest) -> Self {
        Self {
            title: input.title.map(|t| t.trim().to_string()),
            description: input.description.map(|d| trimmed_opt(Some(d))),
            status: None,
            expected_status: None,
            priority: input.priority,
            assigned_to: input.assigned_to.map(Some),
        }
    }
}

/// Represents query parameters for filtering tasks when listing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub task_list_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Filter tasks by assignee's user ID.
    pub assigned_to: Option<Uuid>,
    /// Search term matched against the title (case-insensitive).
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn in_list(task_list_id: Uuid) -> Self {
        Self {
            task_list_id: Some(task_list_id),
            ..Default::default()
        }
    }
}

impl Task {
    /// Creates a new `Task` in `task_list_id` from validated input.
    /// New tasks start out pending; `id` and timestamps are generated here.
    pub fn new(input: CreateTaskRequest, task_list_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: trimmed_opt(input.description),
            status: TaskStatus::default(),
            priority: input.priority.unwrap_or_default(),
            task_list_id,
            assigned_to: input.assigned_to,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

impl Entity for Task {
    type Id = Uuid;
    type Patch = TaskPatch;
    type Filter = TaskFilter;
    const NAME: &'static str = "Task";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn check_patch(&self, patch: &TaskPatch) -> Result<(), AppError> {
        if let Some(expected) = patch.expected_status {
            if expected != self.status {
                return Err(AppError::Conflict(format!(
                    "Task status changed concurrently: expected {}, found {}",
                    expected, self.status
                )));
            }
        }
        if let Some(status) = patch.status {
            self.status.check_transition(status)?;
        }
        Ok(())
    }

    fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = assigned_to;
        }
        self.updated_at = Utc::now();
    }

    fn matches(&self, filter: &TaskFilter) -> bool {
        filter.task_list_id.map_or(true, |id| self.task_list_id == id)
            && filter.status.map_or(true, |s| self.status == s)
            && filter.priority.map_or(true, |p| self.priority == p)
            && filter
                .assigned_to
                .map_or(true, |user| self.assigned_to == Some(user))
            && filter
                .search
                .as_deref()
                .map_or(true, |term| contains_ignore_case(&self.title, term))
    }
}

/// Progress of a task list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionStats {
    pub total: u64,
    pub completed: u64,
    /// Share of completed tasks in percent, rounded to two decimals. Zero for an empty list.
    pub percent_complete: f64,
}

impl CompletionStats {
    pub fn new(total: u64, completed: u64) -> Self {
        let percent_complete = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };
        Self {
            total,
            completed,
            percent_complete,
        }
    }

    /// True only for a non-empty list whose tasks are all completed.
    pub fn is_fully_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}
