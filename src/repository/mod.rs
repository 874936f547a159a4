//! Generic persistence layer.
//!
//! A [`Repository`] gives uniform CRUD, filtering and pagination over any type implementing
//! [`Entity`]. Two stores implement it: [`MemoryRepository`] keeps records in process and
//! [`PgRepository`] maps them onto Postgres tables through `sqlx`.
//!
//! Every repository call is its own unit of work. There is no transaction spanning calls.

pub mod memory;
pub mod postgres;

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use validator::Validate;

pub use memory::MemoryRepository;
pub use postgres::{PgEntity, PgRepository};

/// Default page size when a caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 100;
/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 1000;

/// A record with a unique identifier that a [`Repository`] can store.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Ord + Display + Send + Sync + 'static;
    /// Partial update accepted by [`Repository::update`].
    type Patch: Send + 'static;
    /// Criteria accepted by [`Repository::list`]. The default value matches everything.
    type Filter: Default + Send + Sync + 'static;

    /// Human readable name used in error messages, e.g. `"Task"`.
    const NAME: &'static str;

    fn id(&self) -> Self::Id;

    fn created_at(&self) -> DateTime<Utc>;

    /// Rejects a patch that does not fit the current record.
    ///
    /// Stores call this on the freshly read record while holding it exclusively, so a check
    /// here cannot race with another update of the same record.
    fn check_patch(&self, _patch: &Self::Patch) -> Result<(), AppError> {
        Ok(())
    }

    /// Applies a partial update in place and refreshes the modification timestamp.
    fn apply(&mut self, patch: Self::Patch);

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Fields that must be unique across all stored records, as `(field, value)` pairs.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Pagination {
    /// Number of records to skip.
    #[serde(default)]
    pub skip: u32,
    /// Maximum number of records to return.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Builds a validated pagination window.
    pub fn new(skip: u32, limit: u32) -> Result<Self, AppError> {
        let pagination = Self { skip, limit };
        pagination.validate()?;
        Ok(pagination)
    }
}

/// One page of results together with the metadata a client needs to walk the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub skip: u32,
    pub limit: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let seen = pagination.skip as u64 + items.len() as u64;
        Self {
            has_next: seen < total,
            has_previous: pagination.skip > 0,
            items,
            total,
            skip: pagination.skip,
            limit: pagination.limit,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// CRUD over a single entity type.
///
/// Implementations must be safe to share between concurrent callers; each method runs
/// in its own transaction against the underlying store.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Fetches a record by id, or `NotFound`.
    async fn get(&self, id: E::Id) -> Result<E, AppError>;

    /// Returns the records matching `filter`, oldest first, windowed by `pagination`.
    async fn list(&self, filter: &E::Filter, pagination: Pagination) -> Result<Vec<E>, AppError>;

    /// Number of records matching `filter`.
    async fn count(&self, filter: &E::Filter) -> Result<u64, AppError>;

    /// Stores a new record. Fails with `Conflict` if its id or a unique key is taken.
    async fn create(&self, entity: E) -> Result<E, AppError>;

    /// Applies `patch` to an existing record and returns the stored result.
    async fn update(&self, id: E::Id, patch: E::Patch) -> Result<E, AppError>;

    /// Removes a record. Fails with `NotFound` if it does not exist.
    async fn delete(&self, id: E::Id) -> Result<(), AppError>;

    /// Removes every record matching `filter` and returns how many were removed.
    async fn delete_matching(&self, filter: &E::Filter) -> Result<u64, AppError>;

    /// Convenience wrapper returning a [`Page`] built from `list` and `count`.
    async fn page(&self, filter: &E::Filter, pagination: Pagination) -> Result<Page<E>, AppError> {
        let total = self.count(filter).await?;
        let items = self.list(filter, pagination).await?;
        Ok(Page::new(items, total, pagination))
    }
}

pub(crate) fn not_found<E: Entity>() -> AppError {
    AppError::NotFound(format!("{} not found", E::NAME))
}
