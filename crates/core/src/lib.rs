//! # Patient View Core
//!
//! Read-only patient record viewing:
//! - [`loader`]: fetch a record by identifier and track the view state
//! - [`presenter`]: derive non-editable field descriptors, including age and the
//!   approximate-date-of-birth labels
//! - [`repositories`]: the read contract and its in-memory and YAML implementations
//!
//! **No API concerns**: HTTP routing and terminal output belong in `api-rest` and `cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod presenter;
pub mod record;
pub mod repositories;

pub use config::CoreConfig;
pub use constants::DEFAULT_PATIENT_DATA_DIR;
pub use error::{ViewError, ViewResult};
pub use loader::{
    ErrorReporter, LoadOutcome, PatientView, RequestToken, TitleSetter, TracingErrorReporter,
    ViewState,
};
pub use presenter::{
    derive_fields, patient_title, DateOfBirthLabels, FieldDescriptor, FieldKind, FieldValue,
    PatientFields,
};
pub use record::PatientRecord;
pub use repositories::{
    memory::InMemoryPatientRepository, yaml::YamlPatientRepository, PatientRepository,
    RepositoryError, RepositoryResult,
};

pub use patient_view_types::{NonEmptyText, PatientId, TextError};
