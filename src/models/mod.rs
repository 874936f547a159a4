pub mod task;
pub mod task_list;
pub mod user;

use lazy_static::lazy_static;
use regex::Regex;

pub use task::{
    CompletionStats, CreateTaskRequest, Task, TaskFilter, TaskPatch, TaskPriority, TaskStatus,
    UpdateTaskRequest,
};
pub use task_list::{
    CreateTaskListRequest, TaskList, TaskListFilter, TaskListPatch, UpdateTaskListRequest,
};
pub use user::{normalize_email, User, UserFilter, UserPatch, UserRole};

lazy_static! {
    // At least one non-whitespace character
    pub(crate) static ref NON_BLANK: Regex = Regex::new(r"\S").unwrap();
}

/// Case-insensitive substring match used by the in-memory filters.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Trims `value` and maps an empty result to `None`.
pub(crate) fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
