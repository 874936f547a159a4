//! Behaviour every `Repository` implementation must share.

use taskdeck::models::{
    CreateTaskListRequest, CreateTaskRequest, Task, TaskFilter, TaskList, TaskListFilter,
    TaskListPatch, TaskPatch, TaskStatus, User, UserFilter, UserPatch, UserRole,
};
use taskdeck::repository::{Entity, Pagination, Repository};
use taskdeck::AppError;
use uuid::Uuid;

pub fn list_named(name: &str) -> TaskList {
    TaskList::new(CreateTaskListRequest {
        name: name.to_string(),
    })
}

pub fn task_in(list: &TaskList, title: &str) -> Task {
    Task::new(
        CreateTaskRequest {
            title: title.to_string(),
            description: None,
            priority: None,
            assigned_to: None,
        },
        list.id,
    )
}

/// create, get, update, delete and the errors around them. Names are prefixed with `tag`
/// so runs against a shared database do not collide.
pub async fn crud(lists: &dyn Repository<TaskList>, tag: &str) {
    let list = list_named(&format!("{tag} crud"));

    let created = lists.create(list.clone()).await.unwrap();
    assert_eq!(created.id, list.id);
    assert_eq!(lists.get(list.id).await.unwrap().name, list.name);

    let updated = lists
        .update(
            list.id,
            TaskListPatch {
                name: Some(format!("{tag} renamed")),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, format!("{tag} renamed"));
    assert!(updated.updated_at >= list.updated_at);
    assert_eq!(lists.get(list.id).await.unwrap().name, updated.name);

    let missing = lists.update(Uuid::new_v4(), TaskListPatch::default()).await;
    assert_eq!(missing.unwrap_err(), AppError::NotFound("Task list not found".into()));

    lists.delete(list.id).await.unwrap();
    assert!(matches!(lists.get(list.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(lists.delete(list.id).await, Err(AppError::NotFound(_))));
}

pub async fn unique_keys(lists: &dyn Repository<TaskList>, tag: &str) {
    let first = lists.create(list_named(&format!("{tag} unique"))).await.unwrap();

    let clash = lists.create(list_named(&format!("{tag} unique"))).await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));

    let same_id = lists.create(first.clone()).await;
    assert!(matches!(same_id, Err(AppError::Conflict(_))));

    let second = lists.create(list_named(&format!("{tag} other"))).await.unwrap();
    let rename_clash = lists
        .update(
            second.id,
            TaskListPatch {
                name: Some(first.name.clone()),
            },
        )
        .await;
    assert!(matches!(rename_clash, Err(AppError::Conflict(_))));
    assert_eq!(lists.get(second.id).await.unwrap().name, second.name);
}

pub async fn filtering_and_paging(
    lists: &dyn Repository<TaskList>,
    tasks: &dyn Repository<Task>,
    tag: &str,
) {
    let list = lists.create(list_named(&format!("{tag} paging"))).await.unwrap();

    let mut created = Vec::new();
    for i in 0..5 {
        created.push(tasks.create(task_in(&list, &format!("Item {i}"))).await.unwrap());
    }
    tasks
        .update(
            created[4].id,
            TaskPatch {
                status: Some(TaskStatus::Completed),
                title: Some("Item 4 100%_done".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // A stale status expectation is refused and leaves the row as it was
    let stale = tasks
        .update(
            created[4].id,
            TaskPatch {
                status: Some(TaskStatus::InProgress),
                expected_status: Some(TaskStatus::Pending),
                title: Some("Lost write".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));
    let stored = tasks.get(created[4].id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.title, "Item 4 100%_done");

    let in_list = TaskFilter::in_list(list.id);
    assert_eq!(tasks.count(&in_list).await.unwrap(), 5);

    let page = tasks
        .page(&in_list, Pagination { skip: 1, limit: 2 })
        .await
        .unwrap();
    let titles: Vec<&str> = page.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Item 1", "Item 2"]);
    assert!(page.has_next);
    assert!(page.has_previous);

    let completed = TaskFilter {
        status: Some(TaskStatus::Completed),
        ..TaskFilter::in_list(list.id)
    };
    assert_eq!(tasks.count(&completed).await.unwrap(), 1);

    // Wildcards in the search term match literally
    let literal = TaskFilter {
        search: Some("100%_".into()),
        ..TaskFilter::in_list(list.id)
    };
    let found = tasks.list(&literal, Pagination::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created[4].id);

    let percent = TaskFilter {
        search: Some("%".into()),
        ..TaskFilter::in_list(list.id)
    };
    assert_eq!(tasks.count(&percent).await.unwrap(), 1);

    let removed = tasks.delete_matching(&in_list).await.unwrap();
    assert_eq!(removed, 5);
    assert_eq!(tasks.count(&in_list).await.unwrap(), 0);

    let by_name = TaskListFilter {
        name: Some(list.name.clone()),
        search: None,
    };
    assert_eq!(lists.count(&by_name).await.unwrap(), 1);
}

pub async fn users(users: &dyn Repository<User>, tag: &str) {
    let email = format!("{tag}.user@example.com");
    let user = users
        .create(User::new(&email, Some("Contract Tester".into()), "hash".into()))
        .await
        .unwrap();

    let found = users
        .list(&UserFilter::by_email(&email.to_uppercase()), Pagination::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), user.id);

    let promoted = users
        .update(
            user.id,
            UserPatch {
                role: Some(UserRole::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, UserRole::Admin);
    assert_eq!(promoted.password_hash, "hash");

    let duplicate = users.create(User::new(&email, None, "other".into())).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}
