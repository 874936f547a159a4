mod common;

use common::{recorded_services, register, Event};
use pretty_assertions::assert_eq;
use taskdeck::models::{
    CreateTaskListRequest, CreateTaskRequest, TaskFilter, TaskPriority, TaskStatus,
    UpdateTaskListRequest, UpdateTaskRequest,
};
use taskdeck::repository::Pagination;
use taskdeck::AppError;
use uuid::Uuid;

fn new_list(name: &str) -> CreateTaskListRequest {
    CreateTaskListRequest {
        name: name.to_string(),
    }
}

fn new_task(title: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        title: title.to_string(),
        description: None,
        priority: None,
        assigned_to: None,
    }
}

#[test_log::test(tokio::test)]
async fn test_task_list_crud() {
    let (services, _) = recorded_services();

    let list = services.task_lists.create(new_list("Groceries")).await.unwrap();
    assert_eq!(services.task_lists.get(list.id).await.unwrap(), list);

    let duplicate = services.task_lists.create(new_list(" Groceries ")).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let other = services.task_lists.create(new_list("Chores")).await.unwrap();
    let rename_clash = services
        .task_lists
        .update(
            other.id,
            UpdateTaskListRequest {
                name: Some("Groceries".into()),
            },
        )
        .await;
    assert!(matches!(rename_clash, Err(AppError::Conflict(_))));

    let renamed = services
        .task_lists
        .update(
            other.id,
            UpdateTaskListRequest {
                name: Some("House Chores".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "House Chores");

    let page = services
        .task_lists
        .list(&Default::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, list.id);

    services.task_lists.delete(list.id).await.unwrap();
    assert!(matches!(
        services.task_lists.get(list.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        services.task_lists.delete(list.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[test_log::test(tokio::test)]
async fn test_deleting_a_list_deletes_its_tasks() {
    let (services, _) = recorded_services();
    let doomed = services.task_lists.create(new_list("Doomed")).await.unwrap();
    let kept = services.task_lists.create(new_list("Kept")).await.unwrap();

    let gone = services.tasks.create(doomed.id, new_task("Gone")).await.unwrap();
    let stays = services.tasks.create(kept.id, new_task("Stays")).await.unwrap();

    services.task_lists.delete(doomed.id).await.unwrap();

    assert!(matches!(
        services.tasks.get(gone.id).await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(services.tasks.get(stays.id).await.unwrap(), stays);
}

#[tokio::test]
async fn test_create_task_requires_existing_list_and_assignee() {
    let (services, _) = recorded_services();

    let missing_list = services.tasks.create(Uuid::new_v4(), new_task("Orphan")).await;
    assert_eq!(
        missing_list.unwrap_err(),
        AppError::NotFound("Task list not found".into())
    );

    let list = services.task_lists.create(new_list("Inbox")).await.unwrap();
    let missing_user = services
        .tasks
        .create(
            list.id,
            CreateTaskRequest {
                assigned_to: Some(Uuid::new_v4()),
                ..new_task("Nobody's")
            },
        )
        .await;
    assert_eq!(
        missing_user.unwrap_err(),
        AppError::NotFound("User not found".into())
    );

    let blank = services.tasks.create(list.id, new_task("   ")).await;
    assert!(matches!(blank, Err(AppError::ValidationError(_))));
}

#[test_log::test(tokio::test)]
async fn test_status_changes_follow_transition_rules() {
    let (services, notifier) = recorded_services();
    let user = register(&services, "worker@example.com").await;
    let list = services.task_lists.create(new_list("Sprint")).await.unwrap();
    let task = services
        .tasks
        .create(
            list.id,
            CreateTaskRequest {
                assigned_to: Some(user.id),
                ..new_task("Ship it")
            },
        )
        .await
        .unwrap();
    notifier.take();

    let started = services
        .tasks
        .change_status(task.id, TaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);

    let again = services
        .tasks
        .change_status(task.id, TaskStatus::InProgress)
        .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let done = services
        .tasks
        .change_status(task.id, TaskStatus::Completed)
        .await
        .unwrap();
    let reopened = services
        .tasks
        .change_status(done.id, TaskStatus::Pending)
        .await
        .unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);

    assert_eq!(
        notifier.take(),
        vec![
            Event::StatusChanged {
                task: task.id,
                from: TaskStatus::Pending,
                to: TaskStatus::InProgress,
                user: Some(user.id),
            },
            Event::StatusChanged {
                task: task.id,
                from: TaskStatus::InProgress,
                to: TaskStatus::Completed,
                user: Some(user.id),
            },
            Event::StatusChanged {
                task: task.id,
                from: TaskStatus::Completed,
                to: TaskStatus::Pending,
                user: Some(user.id),
            },
        ]
    );
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_status_changes_notify_once() {
    let (services, notifier) = recorded_services();
    let list = services.task_lists.create(new_list("Race")).await.unwrap();
    let task = services.tasks.create(list.id, new_task("Contended")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tasks = services.tasks.clone();
        handles.push(tokio::spawn(async move {
            tasks.change_status(task.id, TaskStatus::InProgress).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(moved) => {
                assert_eq!(moved.status, TaskStatus::InProgress);
                succeeded += 1;
            }
            Err(err) => assert!(
                matches!(err, AppError::Conflict(_) | AppError::BadRequest(_)),
                "unexpected error {:?}",
                err
            ),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(
        notifier.take(),
        vec![Event::StatusChanged {
            task: task.id,
            from: TaskStatus::Pending,
            to: TaskStatus::InProgress,
            user: None,
        }]
    );
}

#[test_log::test(tokio::test)]
async fn test_assignment_notifications() {
    let (services, notifier) = recorded_services();
    let alice = register(&services, "alice@example.com").await;
    let bob = register(&services, "bob@example.com").await;
    let list = services.task_lists.create(new_list("Team")).await.unwrap();
    let task = services.tasks.create(list.id, new_task("Review PR")).await.unwrap();
    assert!(notifier.take().is_empty());

    let assigned = services.tasks.assign(task.id, alice.id).await.unwrap();
    assert_eq!(assigned.assigned_to, Some(alice.id));
    assert_eq!(
        notifier.take(),
        vec![Event::Assigned {
            task: task.id,
            user: alice.id
        }]
    );

    // Assigning the same user again is not a new event
    services.tasks.assign(task.id, alice.id).await.unwrap();
    assert!(notifier.take().is_empty());

    services.tasks.assign(task.id, bob.id).await.unwrap();
    assert_eq!(
        notifier.take(),
        vec![
            Event::Assigned {
                task: task.id,
                user: bob.id
            },
            Event::Unassigned {
                task: task.id,
                user: alice.id
            },
        ]
    );

    let cleared = services.tasks.unassign(task.id).await.unwrap();
    assert_eq!(cleared.assigned_to, None);
    assert_eq!(
        notifier.take(),
        vec![Event::Unassigned {
            task: task.id,
            user: bob.id
        }]
    );

    // Status change on an unassigned task still reaches the notifier, with nobody to tell
    services
        .tasks
        .change_status(task.id, TaskStatus::Completed)
        .await
        .unwrap();
    assert_eq!(
        notifier.take(),
        vec![Event::StatusChanged {
            task: task.id,
            from: TaskStatus::Pending,
            to: TaskStatus::Completed,
            user: None,
        }]
    );

    let unknown = services.tasks.assign(task.id, Uuid::new_v4()).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_update_task_fields() {
    let (services, notifier) = recorded_services();
    let carol = register(&services, "carol@example.com").await;
    let list = services.task_lists.create(new_list("Writing")).await.unwrap();
    let task = services
        .tasks
        .create(
            list.id,
            CreateTaskRequest {
                description: Some("First draft".into()),
                ..new_task("Essay")
            },
        )
        .await
        .unwrap();

    let updated = services
        .tasks
        .update(
            task.id,
            UpdateTaskRequest {
                title: Some("Final essay".into()),
                description: Some(String::new()),
                priority: Some(TaskPriority::High),
                assigned_to: Some(carol.id),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Final essay");
    assert_eq!(updated.description, None);
    assert_eq!(updated.priority, TaskPriority::High);
    assert_eq!(updated.status, TaskStatus::Pending);
    assert_eq!(updated.created_at, task.created_at);
    assert!(updated.updated_at >= task.updated_at);
    assert_eq!(
        notifier.take(),
        vec![Event::Assigned {
            task: task.id,
            user: carol.id
        }]
    );

    let missing = services
        .tasks
        .update(Uuid::new_v4(), UpdateTaskRequest::default())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[test_log::test(tokio::test)]
async fn test_listing_filters_and_stats() {
    let (services, _) = recorded_services();
    let list = services.task_lists.create(new_list("Errands")).await.unwrap();
    let other = services.task_lists.create(new_list("Other")).await.unwrap();

    let mut ids = Vec::new();
    for (title, priority) in [
        ("Buy milk", TaskPriority::Low),
        ("Buy bread", TaskPriority::High),
        ("Post letter", TaskPriority::High),
    ] {
        let task = services
            .tasks
            .create(
                list.id,
                CreateTaskRequest {
                    priority: Some(priority),
                    ..new_task(title)
                },
            )
            .await
            .unwrap();
        ids.push(task.id);
    }
    services.tasks.create(other.id, new_task("Buy stamps")).await.unwrap();
    services
        .tasks
        .change_status(ids[2], TaskStatus::Completed)
        .await
        .unwrap();

    let listing = services
        .tasks
        .list_in_list(
            list.id,
            TaskFilter {
                search: Some("BUY".into()),
                ..Default::default()
            },
            Pagination::new(0, 1).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(listing.list.id, list.id);
    assert_eq!(listing.tasks.total, 2);
    assert_eq!(listing.tasks.items.len(), 1);
    assert_eq!(listing.tasks.items[0].id, ids[0]);
    assert!(listing.tasks.has_next);
    assert_eq!(listing.stats.total, 3);
    assert_eq!(listing.stats.completed, 1);
    assert_eq!(listing.stats.percent_complete, 33.33);

    let high = services
        .tasks
        .list(
            &TaskFilter {
                priority: Some(TaskPriority::High),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(high.total, 2);

    let summary = services.task_lists.summary(other.id).await.unwrap();
    assert_eq!(summary.stats.total, 1);
    assert_eq!(summary.stats.percent_complete, 0.0);
    assert!(!summary.stats.is_fully_completed());

    let missing = services
        .tasks
        .list_in_list(Uuid::new_v4(), TaskFilter::default(), Pagination::default())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let oversized = services
        .tasks
        .list(&TaskFilter::default(), Pagination { skip: 0, limit: 5000 })
        .await;
    assert!(matches!(oversized, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_delete_task_twice() {
    let (services, _) = recorded_services();
    let list = services.task_lists.create(new_list("Scratch")).await.unwrap();
    let task = services.tasks.create(list.id, new_task("Temp")).await.unwrap();

    services.tasks.delete(task.id).await.unwrap();
    assert_eq!(
        services.tasks.delete(task.id).await.unwrap_err(),
        AppError::NotFound("Task not found".into())
    );
}
