//! On-disk patient records.
//!
//! ## Storage Layout
//!
//! ```text
//! <patient_data_dir>/
//!   patients/
//!     <id>/
//!       patient.yaml
//! ```
//!
//! The YAML schema is strict: unknown keys and wrongly-typed fields are rejected, and the `id`
//! stored in the file must match the directory it was read from.

use super::{PatientRepository, RepositoryError, RepositoryResult};
use crate::config::CoreConfig;
use crate::constants::PATIENT_YAML_FILENAME;
use crate::record::PatientRecord;
use async_trait::async_trait;
use patient_view_types::PatientId;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Repository reading one YAML file per patient.
#[derive(Clone, Debug)]
pub struct YamlPatientRepository {
    cfg: Arc<CoreConfig>,
}

impl YamlPatientRepository {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Returns the path of the record file for `id`, or `None` if `id` cannot name a directory.
    pub fn patient_path(&self, id: &PatientId) -> Option<PathBuf> {
        if !id.is_path_safe() {
            return None;
        }
        Some(
            self.cfg
                .patients_dir()
                .join(id.as_str())
                .join(PATIENT_YAML_FILENAME),
        )
    }
}

#[async_trait]
impl PatientRepository for YamlPatientRepository {
    async fn find(&self, id: &PatientId) -> RepositoryResult<PatientRecord> {
        let Some(path) = self.patient_path(id) else {
            tracing::debug!("rejecting unsafe patient id {:?}", id.as_str());
            return Err(RepositoryError::NotFound(id.to_string()));
        };

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(id.to_string()));
            }
            Err(e) => return Err(RepositoryError::FileRead(e)),
        };

        let record = parse_patient_yaml(&contents)?;
        if record.id != id.as_str() {
            return Err(RepositoryError::Translation(format!(
                "{} holds id '{}', expected '{}'",
                path.display(),
                record.id,
                id
            )));
        }

        Ok(record)
    }
}

/// Parse a patient record from YAML text.
///
/// Uses `serde_path_to_error` to report the path to the failing field (e.g. `dateOfBirth`).
///
/// # Errors
///
/// Returns [`RepositoryError::Translation`] if the text does not match the record schema.
pub fn parse_patient_yaml(yaml_text: &str) -> RepositoryResult<PatientRecord> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    let wire = match serde_path_to_error::deserialize::<_, PatientWire>(deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(RepositoryError::Translation(format!(
                "Patient schema mismatch at {path}: {source}"
            )));
        }
    };

    Ok(wire.into())
}

/// Wire representation of a stored patient record.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct PatientWire {
    id: String,
    friendly_id: String,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(rename = "type", default)]
    patient_type: Option<String>,
    #[serde(default)]
    occupation: Option<String>,
    #[serde(default)]
    preferred_language: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    is_approximate_date_of_birth: bool,
}

impl From<PatientWire> for PatientRecord {
    fn from(wire: PatientWire) -> Self {
        PatientRecord {
            id: wire.id,
            friendly_id: wire.friendly_id,
            prefix: wire.prefix,
            given_name: wire.given_name,
            family_name: wire.family_name,
            suffix: wire.suffix,
            sex: wire.sex,
            patient_type: wire.patient_type,
            occupation: wire.occupation,
            preferred_language: wire.preferred_language,
            phone_number: wire.phone_number,
            email: wire.email,
            address: wire.address,
            date_of_birth: wire.date_of_birth,
            is_approximate_date_of_birth: wire.is_approximate_date_of_birth,
        }
    }
}
