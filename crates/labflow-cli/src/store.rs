//! # JSON File Store
//!
//! One pretty-printed JSON file per record, named after the record's code:
//! `<state-dir>/projects/PRY-001.json`, `<state-dir>/assays/ENS-0042.json`.
//! Unreadable files are skipped with a warning when listing.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use labflow_service::{Record, Repository, RepositoryError};
use labflow_state::{normalize_code, Assay, Project};

/// A record stored under its human-facing code.
pub trait StoredRecord: Record + Serialize + DeserializeOwned {
    fn code(&self) -> &str;
}

impl StoredRecord for Project {
    fn code(&self) -> &str {
        &self.code
    }
}

impl StoredRecord for Assay {
    fn code(&self) -> &str {
        &self.code
    }
}

/// File-backed [`Repository`].
#[derive(Debug, Clone)]
pub struct JsonFileRepository<T> {
    dir: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: StoredRecord> JsonFileRepository<T> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _record: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look a record up by code. Case and surrounding whitespace are
    /// ignored.
    pub fn find_by_code(&self, code: &str) -> Result<Option<T>, RepositoryError> {
        let path = self.file_for(&normalize_code(code))?;
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    /// Resolve the file for `code`, refusing codes that would escape the
    /// store directory.
    fn file_for(&self, code: &str) -> Result<PathBuf, RepositoryError> {
        validate_code(code)?;
        Ok(self.dir.join(format!("{code}.json")))
    }

    fn write(&self, path: &Path, record: &T) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(record).map_err(|e| {
            RepositoryError::Backend(format!("failed to encode {}: {e}", record.code()))
        })?;
        std::fs::write(path, json).map_err(|e| {
            RepositoryError::Backend(format!("failed to write {}: {e}", path.display()))
        })
    }
}

impl<T: StoredRecord> Repository<T> for JsonFileRepository<T> {
    fn find_by_id(&self, id: T::Id) -> Result<Option<T>, RepositoryError> {
        Ok(self.list()?.into_iter().find(|r| r.record_id() == id))
    }

    fn insert(&self, record: T) -> Result<(), RepositoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            RepositoryError::Backend(format!("failed to create {}: {e}", self.dir.display()))
        })?;
        let path = self.file_for(record.code())?;
        if path.exists() {
            return Err(RepositoryError::Conflict(record.code().to_string()));
        }
        self.write(&path, &record)
    }

    fn update(&self, record: T) -> Result<T, RepositoryError> {
        let path = self.file_for(record.code())?;
        if !path.exists() {
            return Err(RepositoryError::Missing(record.code().to_string()));
        }
        let stored: T = read_record(&path)?;
        if stored.record_id() != record.record_id() {
            return Err(RepositoryError::Conflict(format!(
                "{} is held by {}",
                record.code(),
                stored.record_id()
            )));
        }
        self.write(&path, &record)?;
        Ok(record)
    }

    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            RepositoryError::Backend(format!("failed to read {}: {e}", self.dir.display()))
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(
                        dir = %self.dir.display(),
                        error = %e,
                        "failed to read directory entry"
                    );
                    continue;
                }
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record::<T>(&path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable record"
                    );
                }
            }
        }
        records.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(records)
    }
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, RepositoryError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RepositoryError::Backend(format!("failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        RepositoryError::Backend(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Codes become file names: no separators, no traversal, no NUL.
fn validate_code(code: &str) -> Result<(), RepositoryError> {
    if code.is_empty()
        || code.contains(['/', '\\', '\0'])
        || code == "."
        || code == ".."
    {
        return Err(RepositoryError::Backend(format!(
            "code is not usable as a file name: {code:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use labflow_core::ProjectId;

    fn project(code: &str) -> Project {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        Project::new(code, "Pavimento", "cli-4", start).unwrap()
    }

    #[test]
    fn insert_find_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("projects"));
        let p = project("PRY-2");
        repo.insert(p.clone()).unwrap();
        repo.insert(project("PRY-1")).unwrap();

        assert_eq!(repo.find_by_id(p.id).unwrap().unwrap().code, "PRY-2");
        assert_eq!(repo.find_by_code("PRY-2").unwrap().unwrap().id, p.id);
        let codes: Vec<_> = repo.list().unwrap().into_iter().map(|p| p.code).collect();
        assert_eq!(codes, vec!["PRY-1", "PRY-2"]);
    }

    #[test]
    fn lookup_ignores_code_case() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        let p = project("pry-3");
        assert_eq!(p.code, "PRY-3");
        repo.insert(p.clone()).unwrap();
        assert_eq!(repo.find_by_code(" pry-3 ").unwrap().unwrap().id, p.id);
        assert!(matches!(
            repo.insert(project("Pry-3")),
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[test]
    fn duplicate_code_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        repo.insert(project("PRY-1")).unwrap();
        assert!(matches!(
            repo.insert(project("PRY-1")),
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[test]
    fn update_checks_identity() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        let mut p = project("PRY-1");
        repo.insert(p.clone()).unwrap();

        p.name = "Pavimento rigido".to_string();
        repo.update(p.clone()).unwrap();
        assert_eq!(
            repo.find_by_code("PRY-1").unwrap().unwrap().name,
            "Pavimento rigido"
        );

        let mut impostor = project("PRY-1");
        impostor.id = ProjectId::new();
        assert!(matches!(
            repo.update(impostor),
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            repo.update(project("PRY-9")),
            Err(RepositoryError::Missing(_))
        ));
    }

    #[test]
    fn missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo: JsonFileRepository<Project> =
            JsonFileRepository::new(dir.path().join("none"));
        assert!(repo.list().unwrap().is_empty());
        assert!(repo.find_by_code("PRY-1").unwrap().is_none());
    }

    #[test]
    fn corrupt_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        repo.insert(project("PRY-1")).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn traversal_codes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        for code in ["", "..", "../x", "a/b", "a\\b"] {
            assert!(repo.insert(project_unchecked(code)).is_err(), "{code:?}");
        }
    }

    fn project_unchecked(code: &str) -> Project {
        let mut p = project("tmp");
        p.code = code.to_string();
        p
    }
}
