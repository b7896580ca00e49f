//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Library
//! code never reads process-wide environment variables; binaries do that and build a `CoreConfig`.

use crate::constants::{DEFAULT_PATIENT_DATA_DIR, PATIENTS_DIR_NAME};
use crate::{ViewError, ViewResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidInput`] if `patient_data_dir` is empty.
    pub fn new(patient_data_dir: PathBuf) -> ViewResult<Self> {
        if patient_data_dir.as_os_str().is_empty() {
            return Err(ViewError::InvalidInput(
                "patient_data_dir cannot be empty".into(),
            ));
        }

        Ok(Self { patient_data_dir })
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    /// Directory holding one sub-directory per stored patient.
    pub fn patients_dir(&self) -> PathBuf {
        self.patient_data_dir.join(PATIENTS_DIR_NAME)
    }
}

/// Resolve the patient data directory from an optional override value.
///
/// `None`, empty and whitespace-only values fall back to [`DEFAULT_PATIENT_DATA_DIR`].
pub fn patient_data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PATIENT_DATA_DIR))
}
