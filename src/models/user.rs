use super::contains_ignore_case;
use crate::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role of a user. Corresponds to the `user_role` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Member,
    Admin,
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Lower-cased, trimmed and unique.
    pub email: String,
    pub name: Option<String>,
    /// bcrypt hash. Never serialised.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a [`User`]. Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

/// Criteria for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Exact email match after normalisation.
    pub email: Option<String>,
    /// Case-insensitive substring of the display name.
    pub search: Option<String>,
}

impl UserFilter {
    pub fn by_email(email: &str) -> Self {
        Self {
            email: Some(normalize_email(email)),
            search: None,
        }
    }
}

/// Emails are compared and stored lower-cased without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    pub fn new(email: &str, name: Option<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            name: super::trimmed_opt(name),
            password_hash,
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The name to greet the user with, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl Entity for User {
    type Id = Uuid;
    type Patch = UserPatch;
    type Filter = UserFilter;
    const NAME: &'static str = "User";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = super::trimmed_opt(Some(name));
        }
        if let Some(hash) = patch.password_hash {
            self.password_hash = hash;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = Utc::now();
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        if let Some(email) = &filter.email {
            if self.email != normalize_email(email) {
                return false;
            }
        }
        if let Some(term) = &filter.search {
            match &self.name {
                Some(name) if contains_ignore_case(name, term) => {}
                _ => return false,
            }
        }
        true
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }
}
