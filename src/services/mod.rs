//! Use-case services.
//!
//! These sit between a caller (an HTTP layer, a CLI, tests) and the repositories. They
//! take validated input DTOs and return domain objects or an `AppError`.

pub mod auth;
pub mod task_lists;
pub mod tasks;

use crate::auth::TokenService;
use crate::config::SecurityConfig;
use crate::models::{Task, TaskList, User};
use crate::notifications::{LogNotifier, Notifier};
use crate::repository::{MemoryRepository, PgRepository, Repository};
use sqlx::PgPool;
use std::sync::Arc;

pub use auth::AuthService;
pub use task_lists::{TaskListService, TaskListSummary};
pub use tasks::{TaskListing, TaskService};

/// The three services wired over one store.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub task_lists: TaskListService,
    pub tasks: TaskService,
}

impl Services {
    /// Builds the services over arbitrary repositories and notifier.
    pub fn new(
        users: Arc<dyn Repository<User>>,
        lists: Arc<dyn Repository<TaskList>>,
        tasks: Arc<dyn Repository<Task>>,
        notifier: Arc<dyn Notifier>,
        security: &SecurityConfig,
    ) -> Self {
        Self {
            auth: AuthService::new(
                users.clone(),
                TokenService::from_config(security),
                security.bcrypt_cost,
            ),
            task_lists: TaskListService::new(lists.clone(), tasks.clone()),
            tasks: TaskService::new(tasks, lists, users, notifier),
        }
    }

    /// Services backed by Postgres, notifying through the log.
    pub fn postgres(pool: PgPool, security: &SecurityConfig) -> Self {
        Self::new(
            Arc::new(PgRepository::<User>::new(pool.clone())),
            Arc::new(PgRepository::<TaskList>::new(pool.clone())),
            Arc::new(PgRepository::<Task>::new(pool)),
            Arc::new(LogNotifier),
            security,
        )
    }

    /// Services backed by in-process stores, notifying through the log.
    pub fn in_memory(security: &SecurityConfig) -> Self {
        Self::new(
            Arc::new(MemoryRepository::<User>::new()),
            Arc::new(MemoryRepository::<TaskList>::new()),
            Arc::new(MemoryRepository::<Task>::new()),
            Arc::new(LogNotifier),
            security,
        )
    }
}
