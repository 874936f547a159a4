use crate::error::AppError;
use crate::models::{
    CompletionStats, CreateTaskListRequest, Task, TaskFilter, TaskList, TaskListFilter,
    TaskListPatch, TaskStatus, UpdateTaskListRequest,
};
use crate::repository::{Page, Pagination, Repository};
use log::info;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// A task list together with its progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskListSummary {
    #[serde(flatten)]
    pub list: TaskList,
    pub stats: CompletionStats,
}

#[derive(Clone)]
pub struct TaskListService {
    lists: Arc<dyn Repository<TaskList>>,
    tasks: Arc<dyn Repository<Task>>,
}

fn duplicate_name() -> AppError {
    AppError::Conflict("Task list with this name already exists".into())
}

/// Counts the tasks of a list and how many of them are completed.
pub(crate) async fn completion_stats(
    tasks: &dyn Repository<Task>,
    list_id: Uuid,
) -> Result<CompletionStats, AppError> {
    let total = tasks.count(&TaskFilter::in_list(list_id)).await?;
    let completed = tasks
        .count(&TaskFilter {
            status: Some(TaskStatus::Completed),
            ..TaskFilter::in_list(list_id)
        })
        .await?;
    Ok(CompletionStats::new(total, completed))
}

impl TaskListService {
    pub fn new(lists: Arc<dyn Repository<TaskList>>, tasks: Arc<dyn Repository<Task>>) -> Self {
        Self { lists, tasks }
    }

    async fn name_owner(&self, name: &str) -> Result<Option<TaskList>, AppError> {
        let filter = TaskListFilter {
            name: Some(name.to_string()),
            search: None,
        };
        Ok(self
            .lists
            .list(&filter, Pagination { skip: 0, limit: 1 })
            .await?
            .pop())
    }

    pub async fn create(&self, input: CreateTaskListRequest) -> Result<TaskList, AppError> {
        input.validate()?;

        let list = TaskList::new(input);
        if self.name_owner(&list.name).await?.is_some() {
            return Err(duplicate_name());
        }

        let list = self.lists.create(list).await.map_err(|e| match e {
            AppError::Conflict(_) => duplicate_name(),
            other => other,
        })?;
        info!("Created task list {} ({})", list.id, list.name);
        Ok(list)
    }

    pub async fn get(&self, id: Uuid) -> Result<TaskList, AppError> {
        self.lists.get(id).await
    }

    pub async fn list(
        &self,
        filter: &TaskListFilter,
        pagination: Pagination,
    ) -> Result<Page<TaskList>, AppError> {
        pagination.validate()?;
        self.lists.page(filter, pagination).await
    }

    /// Renames a list. Fails with `Conflict` if another list already uses the name.
    pub async fn update(&self, id: Uuid, input: UpdateTaskListRequest) -> Result<TaskList, AppError> {
        input.validate()?;
        let patch = TaskListPatch::from(input);

        if let Some(name) = &patch.name {
            if let Some(owner) = self.name_owner(name).await? {
                if owner.id != id {
                    return Err(duplicate_name());
                }
            }
        }

        self.lists.update(id, patch).await.map_err(|e| match e {
            AppError::Conflict(_) => duplicate_name(),
            other => other,
        })
    }

    /// Deletes a list and every task in it.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.lists.get(id).await?;

        let removed = self.tasks.delete_matching(&TaskFilter::in_list(id)).await?;
        self.lists.delete(id).await?;

        info!("Deleted task list {} with {} tasks", id, removed);
        Ok(())
    }

    pub async fn summary(&self, id: Uuid) -> Result<TaskListSummary, AppError> {
        let list = self.lists.get(id).await?;
        let stats = completion_stats(self.tasks.as_ref(), id).await?;
        Ok(TaskListSummary { list, stats })
    }
}
