use super::{not_found, Entity, Pagination, Repository};
use crate::error::AppError;
use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

/// In-process store backed by a vector behind an async `RwLock`.
///
/// Writers hold the lock for the whole operation, so each call observes and leaves a
/// consistent view just like a store transaction would.
pub struct MemoryRepository<E> {
    records: RwLock<Vec<E>>,
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored records, ignoring any filter.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a `Conflict` if `candidate` collides with any stored record other than `skip`.
fn check_unique<E: Entity>(records: &[E], candidate: &E, skip: Option<E::Id>) -> Result<(), AppError> {
    let keys = candidate.unique_keys();
    for existing in records.iter().filter(|r| Some(r.id()) != skip) {
        if skip.is_none() && existing.id() == candidate.id() {
            return Err(AppError::Conflict(format!(
                "{} with id {} already exists",
                E::NAME,
                candidate.id()
            )));
        }
        for (field, value) in existing.unique_keys() {
            if keys.iter().any(|(f, v)| *f == field && *v == value) {
                return Err(AppError::Conflict(format!(
                    "{} with this {} already exists",
                    E::NAME,
                    field
                )));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn get(&self, id: E::Id) -> Result<E, AppError> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(not_found::<E>)
    }

    async fn list(&self, filter: &E::Filter, pagination: Pagination) -> Result<Vec<E>, AppError> {
        let records = self.records.read().await;
        let mut matching: Vec<&E> = records.iter().filter(|r| r.matches(filter)).collect();
        matching.sort_by_key(|r| (r.created_at(), r.id()));

        Ok(matching
            .into_iter()
            .skip(pagination.skip as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &E::Filter) -> Result<u64, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.matches(filter)).count() as u64)
    }

    async fn create(&self, entity: E) -> Result<E, AppError> {
        let mut records = self.records.write().await;
        check_unique(&records, &entity, None)?;

        debug!("Stored {} {}", E::NAME, entity.id());
        records.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: E::Id, patch: E::Patch) -> Result<E, AppError> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(not_found::<E>)?;

        records[index].check_patch(&patch)?;
        let mut updated = records[index].clone();
        updated.apply(patch);
        check_unique(&records, &updated, Some(id))?;

        records[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: E::Id) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(not_found::<E>)?;

        records.remove(index);
        debug!("Deleted {} {}", E::NAME, id);
        Ok(())
    }

    async fn delete_matching(&self, filter: &E::Filter) -> Result<u64, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.matches(filter));
        Ok((before - records.len()) as u64)
    }
}
