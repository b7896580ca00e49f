//! Constants used throughout the patient view core crate.
//!
//! Path names and label keys live here so the repository, presenter and tests agree on them.

/// Default directory for patient data storage when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Directory name for patient records under the data directory.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Filename for a stored patient record.
pub const PATIENT_YAML_FILENAME: &str = "patient.yaml";

/// Prefix shared by every field label key.
pub const LABEL_PREFIX: &str = "patient";

pub const AGE_LABEL: &str = "patient.age";
pub const APPROXIMATE_AGE_LABEL: &str = "patient.approximateAge";
pub const DATE_OF_BIRTH_LABEL: &str = "patient.dateOfBirth";
pub const APPROXIMATE_DATE_OF_BIRTH_LABEL: &str = "patient.approximateDateOfBirth";
