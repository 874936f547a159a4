use super::{contains_ignore_case, NON_BLANK};
use crate::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A named collection of tasks. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TaskList {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTaskListRequest {
    #[validate(
        length(min = 1, max = 100),
        regex(path = "NON_BLANK", message = "Name must not be blank")
    )]
    pub name: String,
}

/// Input for renaming a task list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskListRequest {
    #[validate(
        length(min = 1, max = 100),
        regex(path = "NON_BLANK", message = "Name must not be blank")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskListPatch {
    pub name: Option<String>,
}

impl From<UpdateTaskListRequest> for TaskListPatch {
    fn from(input: UpdateTaskListRequest) -> Self {
        Self {
            name: input.name.map(|n| n.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListFilter {
    /// Exact name.
    pub name: Option<String>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
}

impl TaskList {
    pub fn new(input: CreateTaskListRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for TaskList {
    type Id = Uuid;
    type Patch = TaskListPatch;
    type Filter = TaskListFilter;
    const NAME: &'static str = "Task list";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: TaskListPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        self.updated_at = Utc::now();
    }

    fn matches(&self, filter: &TaskListFilter) -> bool {
        filter.name.as_deref().map_or(true, |n| self.name == n.trim())
            && filter
                .search
                .as_deref()
                .map_or(true, |term| contains_ignore_case(&self.name, term))
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}
