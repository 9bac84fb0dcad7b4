//! # Repository Seam
//!
//! The persistence collaborator services call into. Implementations own
//! their concurrency control; a service holds no lock across the
//! read-decide-apply-persist sequence.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use labflow_core::{AssayId, ProjectId};
use labflow_state::{Assay, Project};

/// Errors from a repository implementation.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// `update` on a record that was never inserted.
    #[error("record {0} does not exist")]
    Missing(String),

    /// `insert` on an identifier that is already taken.
    #[error("record {0} already exists")]
    Conflict(String),

    /// Storage backend failure.
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// An entity with a stable identifier.
pub trait Record: Clone + Send + Sync + 'static {
    /// Identifier type.
    type Id: Copy + Ord + fmt::Display + Send + Sync + 'static;

    /// Entity kind name used in errors and logs.
    const KIND: &'static str;

    /// This record's identifier.
    fn record_id(&self) -> Self::Id;
}

impl Record for Project {
    type Id = ProjectId;
    const KIND: &'static str = "project";

    fn record_id(&self) -> ProjectId {
        self.id
    }
}

impl Record for Assay {
    type Id = AssayId;
    const KIND: &'static str = "assay";

    fn record_id(&self) -> AssayId {
        self.id
    }
}

/// Storage for one record type.
pub trait Repository<T: Record>: Send + Sync {
    /// Fetch by identifier.
    fn find_by_id(&self, id: T::Id) -> Result<Option<T>, RepositoryError>;

    /// Store a new record.
    fn insert(&self, record: T) -> Result<(), RepositoryError>;

    /// Replace an existing record, returning what was stored.
    fn update(&self, record: T) -> Result<T, RepositoryError>;

    /// All records, ordered by identifier.
    fn list(&self) -> Result<Vec<T>, RepositoryError>;
}

/// Thread-safe, cloneable in-memory repository.
///
/// Clones share the same map. The lock is `parking_lot`, which does not
/// poison on a panicking writer.
#[derive(Debug)]
pub struct InMemoryRepository<T: Record> {
    data: Arc<RwLock<BTreeMap<T::Id, T>>>,
}

impl<T: Record> InMemoryRepository<T> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl<T: Record> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Record> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Repository<T> for InMemoryRepository<T> {
    fn find_by_id(&self, id: T::Id) -> Result<Option<T>, RepositoryError> {
        Ok(self.data.read().get(&id).cloned())
    }

    fn insert(&self, record: T) -> Result<(), RepositoryError> {
        let id = record.record_id();
        let mut guard = self.data.write();
        if guard.contains_key(&id) {
            return Err(RepositoryError::Conflict(id.to_string()));
        }
        guard.insert(id, record);
        Ok(())
    }

    fn update(&self, record: T) -> Result<T, RepositoryError> {
        let id = record.record_id();
        let mut guard = self.data.write();
        match guard.get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(RepositoryError::Missing(id.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        Ok(self.data.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn project() -> Project {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        Project::new("PRY-1", "Sondeo", "cli-1", start).unwrap()
    }

    #[test]
    fn insert_then_find() {
        let repo = InMemoryRepository::new();
        let p = project();
        repo.insert(p.clone()).unwrap();
        let found = repo.find_by_id(p.id).unwrap().unwrap();
        assert_eq!(found.code, "PRY-1");
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let repo = InMemoryRepository::new();
        let p = project();
        repo.insert(p.clone()).unwrap();
        assert!(matches!(repo.insert(p), Err(RepositoryError::Conflict(_))));
    }

    #[test]
    fn update_requires_existing() {
        let repo: InMemoryRepository<Project> = InMemoryRepository::new();
        assert!(matches!(
            repo.update(project()),
            Err(RepositoryError::Missing(_))
        ));
    }

    #[test]
    fn clones_share_storage() {
        let repo = InMemoryRepository::new();
        let other = repo.clone();
        repo.insert(project()).unwrap();
        assert_eq!(other.list().unwrap().len(), 1);
        assert!(!other.is_empty());
    }
}
