//! Patient record repositories.
//!
//! The view only ever reads through [`PatientRepository`]. Two implementations ship with the
//! crate:
//! - [`memory::InMemoryPatientRepository`] for embedding and tests
//! - [`yaml::YamlPatientRepository`] reading `patients/<id>/patient.yaml` under the configured
//!   patient data directory

use crate::record::PatientRecord;
use async_trait::async_trait;
use patient_view_types::PatientId;

pub mod memory;
pub mod yaml;

/// Errors returned by repositories.
///
/// Only [`RepositoryError::NotFound`] means the record does not exist. Every other variant is
/// treated by the view as a transient fetch failure.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("no patient record for id {0}")]
    NotFound(String),
    #[error("failed to read patient file: {0}")]
    FileRead(std::io::Error),
    #[error("translation error: {0}")]
    Translation(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Read access to stored patient records.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Fetch the record for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no record exists for `id`, and another variant
    /// when the backing store could not be read.
    async fn find(&self, id: &PatientId) -> RepositoryResult<PatientRecord>;
}
