#![allow(dead_code)]

pub mod contract;

use std::sync::{Arc, Mutex};
use taskdeck::auth::RegisterRequest;
use taskdeck::config::SecurityConfig;
use taskdeck::models::{Task, TaskList, TaskStatus, User};
use taskdeck::notifications::Notifier;
use taskdeck::repository::MemoryRepository;
use taskdeck::Services;
use uuid::Uuid;

/// Lowest bcrypt cost the library accepts, to keep tests fast.
pub const TEST_BCRYPT_COST: u32 = 4;

pub fn security() -> SecurityConfig {
    SecurityConfig {
        bcrypt_cost: TEST_BCRYPT_COST,
        ..SecurityConfig::new("integration_test_secret")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Assigned { task: Uuid, user: Uuid },
    Unassigned { task: Uuid, user: Uuid },
    StatusChanged {
        task: Uuid,
        from: TaskStatus,
        to: TaskStatus,
        user: Option<Uuid>,
    },
}

/// Notifier that remembers every event it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Notifier for RecordingNotifier {
    fn task_assigned(&self, task: &Task, user: &User) {
        self.push(Event::Assigned {
            task: task.id,
            user: user.id,
        });
    }

    fn task_unassigned(&self, task: &Task, user: &User) {
        self.push(Event::Unassigned {
            task: task.id,
            user: user.id,
        });
    }

    fn task_status_changed(&self, task: &Task, old_status: TaskStatus, assignee: Option<&User>) {
        self.push(Event::StatusChanged {
            task: task.id,
            from: old_status,
            to: task.status,
            user: assignee.map(|u| u.id),
        });
    }
}

/// In-memory services whose notifications can be inspected.
pub fn recorded_services() -> (Services, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let services = Services::new(
        Arc::new(MemoryRepository::<User>::new()),
        Arc::new(MemoryRepository::<TaskList>::new()),
        Arc::new(MemoryRepository::<Task>::new()),
        notifier.clone(),
        &security(),
    );
    (services, notifier)
}

pub fn register_request(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        name: None,
        password: password.to_string(),
    }
}

pub async fn register(services: &Services, email: &str) -> User {
    services
        .auth
        .register(register_request(email, "Password123!"))
        .await
        .expect("registration should succeed")
}
