use super::{PatientRepository, RepositoryError, RepositoryResult};
use crate::record::PatientRecord;
use async_trait::async_trait;
use patient_view_types::PatientId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Map-backed repository keyed by [`PatientRecord::id`].
#[derive(Debug, Default)]
pub struct InMemoryPatientRepository {
    records: RwLock<HashMap<String, PatientRecord>>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PatientRecord>) -> Self {
        let repo = Self::new();
        for record in records {
            repo.insert(record);
        }
        repo
    }

    /// Stores `record`, replacing any record with the same id.
    pub fn insert(&self, record: PatientRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id.clone(), record);
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn find(&self, id: &PatientId) -> RepositoryResult<PatientRecord> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::Unavailable("record map lock poisoned".into()))?;

        records
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            friendly_id: format!("P-{id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn finds_inserted_record() {
        let repo = InMemoryPatientRepository::with_records([record("123"), record("456")]);

        let found = repo
            .find(&PatientId::parse("456").unwrap())
            .await
            .expect("record should exist");
        assert_eq!(found.friendly_id, "P-456");
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let repo = InMemoryPatientRepository::new();

        let err = repo
            .find(&PatientId::parse("nope").unwrap())
            .await
            .expect_err("empty repository");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn insert_replaces_existing_record() {
        let repo = InMemoryPatientRepository::with_records([record("123")]);
        let mut updated = record("123");
        updated.friendly_id = "P00001".into();
        repo.insert(updated);

        let found = repo.find(&PatientId::parse("123").unwrap()).await.unwrap();
        assert_eq!(found.friendly_id, "P00001");
    }
}
