//! Task notifications.
//!
//! [`LogNotifier`] stands in for an email gateway: it renders each message and writes it
//! to the log instead of sending it. Notification failures never reach the caller of
//! the operation that triggered them.

use crate::models::{Task, TaskStatus, User};
use log::{debug, info};

/// Receives task events that concern a particular user.
pub trait Notifier: Send + Sync {
    fn task_assigned(&self, task: &Task, user: &User);

    fn task_unassigned(&self, task: &Task, user: &User);

    /// `assignee` is `None` when the task has nobody to notify.
    fn task_status_changed(&self, task: &Task, old_status: TaskStatus, assignee: Option<&User>);
}

/// Mock mail sender that logs subject and recipient at info and the body at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    fn send(&self, to: &User, subject: &str, task: &Task, body: &str) {
        info!(
            "MOCK EMAIL SENT - To: {}, Subject: {}, Task ID: {}",
            to.email, subject, task.id
        );
        debug!("Email body:\n{}", body);
    }
}

fn description(task: &Task) -> &str {
    task.description.as_deref().unwrap_or("No description provided")
}

impl Notifier for LogNotifier {
    fn task_assigned(&self, task: &Task, user: &User) {
        let body = format!(
            "Hello {},\n\nYou have been assigned a new task:\n\n\
             Title: {}\nDescription: {}\nStatus: {}\nPriority: {}\n",
            user.display_name(),
            task.title,
            description(task),
            task.status,
            task.priority
        );
        self.send(user, &format!("New Task Assigned: {}", task.title), task, &body);
    }

    fn task_unassigned(&self, task: &Task, user: &User) {
        let body = format!(
            "Hello {},\n\nThe following task has been unassigned from you:\n\n\
             Title: {}\nDescription: {}\n",
            user.display_name(),
            task.title,
            description(task)
        );
        self.send(user, &format!("Task Unassigned: {}", task.title), task, &body);
    }

    fn task_status_changed(&self, task: &Task, old_status: TaskStatus, assignee: Option<&User>) {
        let Some(user) = assignee else {
            debug!("No user assigned to task {}, skipping notification", task.id);
            return;
        };

        let body = format!(
            "Hello {},\n\nThe status of your assigned task has been updated:\n\n\
             Title: {}\nPrevious Status: {}\nNew Status: {}\n",
            user.display_name(),
            task.title,
            old_status,
            task.status
        );
        self.send(user, &format!("Task Status Updated: {}", task.title), task, &body);
    }
}
