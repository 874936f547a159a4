use super::{not_found, Entity, Pagination, Repository};
use crate::error::AppError;
use crate::models::{normalize_email, Task, TaskFilter, TaskList, TaskListFilter, User, UserFilter};
use async_trait::async_trait;
use log::debug;
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::marker::PhantomData;
use uuid::Uuid;

/// Maps an [`Entity`] onto a Postgres table.
///
/// `COLUMNS` lists every column in the order `bind_row` binds them; the first one must be
/// `id`. Filters are appended to a query that already ends in `WHERE TRUE`.
pub trait PgEntity: Entity<Id = Uuid> + for<'r> FromRow<'r, PgRow> + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn bind_row(&self, row: &mut Separated<'_, '_, Postgres, &'static str>);

    fn push_filter(filter: &Self::Filter, query: &mut QueryBuilder<'_, Postgres>);
}

/// Postgres-backed repository. Each call opens a transaction from the pool and commits it
/// before returning; an early return drops the transaction, which rolls it back.
pub struct PgRepository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: PgEntity> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn columns() -> String {
        E::COLUMNS.join(", ")
    }

    fn select() -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT {} FROM {}", Self::columns(), E::TABLE))
    }
}

/// Wraps a search term for `ILIKE`, escaping the wildcards it may contain.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl<E: PgEntity> Repository<E> for PgRepository<E> {
    async fn get(&self, id: Uuid) -> Result<E, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query = Self::select();
        query.push(" WHERE id = ").push_bind(id);
        let found = query.build_query_as::<E>().fetch_optional(&mut *tx).await?;

        tx.commit().await?;
        found.ok_or_else(not_found::<E>)
    }

    async fn list(&self, filter: &E::Filter, pagination: Pagination) -> Result<Vec<E>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query = Self::select();
        query.push(" WHERE TRUE");
        E::push_filter(filter, &mut query);
        query
            .push(" ORDER BY created_at, id LIMIT ")
            .push_bind(pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(pagination.skip as i64);
        let rows = query.build_query_as::<E>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok(rows)
    }

    async fn count(&self, filter: &E::Filter) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE TRUE", E::TABLE));
        E::push_filter(filter, &mut query);
        let total: i64 = query.build_query_scalar().fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok(total as u64)
    }

    async fn create(&self, entity: E) -> Result<E, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            E::TABLE,
            Self::columns()
        ));
        entity.bind_row(&mut query.separated(", "));
        query.push(") RETURNING ").push(Self::columns());
        let stored = query.build_query_as::<E>().fetch_one(&mut *tx).await?;

        tx.commit().await?;
        debug!("Inserted {} {} into {}", E::NAME, stored.id(), E::TABLE);
        Ok(stored)
    }

    async fn update(&self, id: Uuid, patch: E::Patch) -> Result<E, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut select = Self::select();
        select.push(" WHERE id = ").push_bind(id).push(" FOR UPDATE");
        let mut current = select
            .build_query_as::<E>()
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_found::<E>)?;

        // Dropping the transaction on error rolls back and releases the row lock
        current.check_patch(&patch)?;
        current.apply(patch);

        let mut query = QueryBuilder::new(format!(
            "UPDATE {} SET ({}) = ROW(",
            E::TABLE,
            Self::columns()
        ));
        current.bind_row(&mut query.separated(", "));
        query
            .push(") WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(Self::columns());
        let stored = query.build_query_as::<E>().fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", E::TABLE));
        query.push_bind(id);
        let result = query.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(not_found::<E>());
        }

        tx.commit().await?;
        debug!("Deleted {} {} from {}", E::NAME, id, E::TABLE);
        Ok(())
    }

    async fn delete_matching(&self, filter: &E::Filter) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::new(format!("DELETE FROM {} WHERE TRUE", E::TABLE));
        E::push_filter(filter, &mut query);
        let result = query.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}

impl PgEntity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "name",
        "password_hash",
        "role",
        "created_at",
        "updated_at",
    ];

    fn bind_row(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.email.clone())
            .push_bind(self.name.clone())
            .push_bind(self.password_hash.clone())
            .push_bind(self.role)
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }

    fn push_filter(filter: &UserFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(email) = &filter.email {
            query.push(" AND email = ").push_bind(normalize_email(email));
        }
        if let Some(term) = &filter.search {
            query.push(" AND name ILIKE ").push_bind(like_pattern(term));
        }
    }
}

impl PgEntity for TaskList {
    const TABLE: &'static str = "task_lists";
    const COLUMNS: &'static [&'static str] = &["id", "name", "created_at", "updated_at"];

    fn bind_row(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.name.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }

    fn push_filter(filter: &TaskListFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(name) = &filter.name {
            query.push(" AND name = ").push_bind(name.trim().to_string());
        }
        if let Some(term) = &filter.search {
            query.push(" AND name ILIKE ").push_bind(like_pattern(term));
        }
    }
}

impl PgEntity for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "status",
        "priority",
        "task_list_id",
        "assigned_to",
        "created_at",
        "updated_at",
    ];

    fn bind_row(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(self.status)
            .push_bind(self.priority)
            .push_bind(self.task_list_id)
            .push_bind(self.assigned_to)
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }

    fn push_filter(filter: &TaskFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(list_id) = filter.task_list_id {
            query.push(" AND task_list_id = ").push_bind(list_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(user_id) = filter.assigned_to {
            query.push(" AND assigned_to = ").push_bind(user_id);
        }
        if let Some(term) = &filter.search {
            query.push(" AND title ILIKE ").push_bind(like_pattern(term));
        }
    }
}
