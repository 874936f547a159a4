use super::task_lists::completion_stats;
use crate::error::AppError;
use crate::models::{
    CompletionStats, CreateTaskRequest, Task, TaskFilter, TaskList, TaskPatch, TaskStatus,
    UpdateTaskRequest, User,
};
use crate::notifications::Notifier;
use crate::repository::{Page, Pagination, Repository};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// The tasks of one list, filtered and paginated, with the list's overall progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskListing {
    pub list: TaskList,
    pub tasks: Page<Task>,
    pub stats: CompletionStats,
}

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn Repository<Task>>,
    lists: Arc<dyn Repository<TaskList>>,
    users: Arc<dyn Repository<User>>,
    notifier: Arc<dyn Notifier>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn Repository<Task>>,
        lists: Arc<dyn Repository<TaskList>>,
        users: Arc<dyn Repository<User>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            tasks,
            lists,
            users,
            notifier,
        }
    }

    /// Looks up a user to notify. A failed lookup is logged and skips the notification.
    async fn recipient(&self, user_id: Option<Uuid>) -> Option<User> {
        let user_id = user_id?;
        match self.users.get(user_id).await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Cannot notify user {}: {}", user_id, e);
                None
            }
        }
    }

    /// Sends the notifications for an assignee change from `previous` to `task.assigned_to`.
    async fn notify_reassignment(&self, task: &Task, previous: Option<Uuid>) {
        if previous == task.assigned_to {
            return;
        }
        if let Some(user) = self.recipient(task.assigned_to).await {
            self.notifier.task_assigned(task, &user);
        }
        if let Some(user) = self.recipient(previous).await {
            self.notifier.task_unassigned(task, &user);
        }
    }

    /// Creates a task in `list_id`.
    ///
    /// Fails with `NotFound` if the list or the requested assignee does not exist.
    pub async fn create(&self, list_id: Uuid, input: CreateTaskRequest) -> Result<Task, AppError> {
        input.validate()?;

        self.lists.get(list_id).await?;
        if let Some(user_id) = input.assigned_to {
            self.users.get(user_id).await?;
        }

        let task = self.tasks.create(Task::new(input, list_id)).await?;
        info!("Created task {} in list {}", task.id, list_id);

        self.notify_reassignment(&task, None).await;
        Ok(task)
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, AppError> {
        self.tasks.get(id).await
    }

    pub async fn list(&self, filter: &TaskFilter, pagination: Pagination) -> Result<Page<Task>, AppError> {
        pagination.validate()?;
        self.tasks.page(filter, pagination).await
    }

    /// Lists the tasks of one list. `filter.task_list_id` is replaced by `list_id`.
    pub async fn list_in_list(
        &self,
        list_id: Uuid,
        filter: TaskFilter,
        pagination: Pagination,
    ) -> Result<TaskListing, AppError> {
        pagination.validate()?;

        let list = self.lists.get(list_id).await?;
        let filter = TaskFilter {
            task_list_id: Some(list_id),
            ..filter
        };
        let tasks = self.tasks.page(&filter, pagination).await?;
        let stats = completion_stats(self.tasks.as_ref(), list_id).await?;

        Ok(TaskListing { list, tasks, stats })
    }

    /// Edits title, description, priority or assignee.
    pub async fn update(&self, id: Uuid, input: UpdateTaskRequest) -> Result<Task, AppError> {
        input.validate()?;

        let current = self.tasks.get(id).await?;
        if let Some(user_id) = input.assigned_to {
            self.users.get(user_id).await?;
        }

        let task = self.tasks.update(id, TaskPatch::from(input)).await?;
        self.notify_reassignment(&task, current.assigned_to).await;
        Ok(task)
    }

    /// Moves a task to `status` and notifies its assignee.
    ///
    /// Fails with `BadRequest` if the task already has that status, and with `Conflict` if
    /// another caller changed the status between the read and the write. The store checks
    /// both while holding the record, so only one of several racing changes succeeds.
    pub async fn change_status(&self, id: Uuid, status: TaskStatus) -> Result<Task, AppError> {
        let current = self.tasks.get(id).await?;
        current.status.check_transition(status)?;

        let task = self
            .tasks
            .update(
                id,
                TaskPatch {
                    status: Some(status),
                    expected_status: Some(current.status),
                    ..Default::default()
                },
            )
            .await?;
        info!("Task {} moved from {} to {}", id, current.status, task.status);

        let assignee = self.recipient(task.assigned_to).await;
        self.notifier
            .task_status_changed(&task, current.status, assignee.as_ref());
        Ok(task)
    }

    /// Assigns a task to `user_id`. Assigning the current assignee again changes nothing.
    pub async fn assign(&self, task_id: Uuid, user_id: Uuid) -> Result<Task, AppError> {
        let current = self.tasks.get(task_id).await?;
        self.users.get(user_id).await?;

        if current.assigned_to == Some(user_id) {
            return Ok(current);
        }

        let task = self
            .tasks
            .update(
                task_id,
                TaskPatch {
                    assigned_to: Some(Some(user_id)),
                    ..Default::default()
                },
            )
            .await?;
        info!("Task {} assigned to user {}", task_id, user_id);

        self.notify_reassignment(&task, current.assigned_to).await;
        Ok(task)
    }

    /// Clears the assignee of a task and notifies them.
    pub async fn unassign(&self, task_id: Uuid) -> Result<Task, AppError> {
        let current = self.tasks.get(task_id).await?;
        if current.assigned_to.is_none() {
            return Ok(current);
        }

        let task = self
            .tasks
            .update(
                task_id,
                TaskPatch {
                    assigned_to: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        info!("Task {} unassigned", task_id);

        self.notify_reassignment(&task, current.assigned_to).await;
        Ok(task)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.tasks.delete(id).await?;
        info!("Deleted task {}", id);
        Ok(())
    }
}
