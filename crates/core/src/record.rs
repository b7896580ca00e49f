//! Stored patient record as seen by the view.
//!
//! The record is owned by whatever system writes patient data. The view reads it once per
//! navigation and never mutates it.

use serde::{Deserialize, Serialize};

/// A patient record as returned by a [`PatientRepository`](crate::PatientRepository).
///
/// Keys are camelCase on the wire (`friendlyId`, `givenName`, `isApproximateDateOfBirth`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    /// Opaque unique identifier.
    pub id: String,

    /// Human-readable identifier, e.g. `P00001`. Display only.
    pub friendly_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub patient_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// ISO 8601 birth date: an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    /// When true the birth date is only known approximately. Affects labels, never values.
    #[serde(default)]
    pub is_approximate_date_of_birth: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialises_camel_case_keys() {
        let json = r#"{
            "id": "123",
            "friendlyId": "P00001",
            "givenName": "givenName",
            "familyName": "familyName",
            "type": "charity",
            "preferredLanguage": "preferredLanguage",
            "phoneNumber": "phoneNumber",
            "dateOfBirth": "1990-01-15",
            "isApproximateDateOfBirth": true
        }"#;

        let record: PatientRecord = serde_json::from_str(json).expect("valid record");
        assert_eq!(record.friendly_id, "P00001");
        assert_eq!(record.given_name.as_deref(), Some("givenName"));
        assert_eq!(record.patient_type.as_deref(), Some("charity"));
        assert_eq!(record.phone_number.as_deref(), Some("phoneNumber"));
        assert_eq!(record.date_of_birth.as_deref(), Some("1990-01-15"));
        assert!(record.is_approximate_date_of_birth);
        assert_eq!(record.email, None);
    }

    #[test]
    fn approximate_flag_defaults_to_false() {
        let record: PatientRecord =
            serde_json::from_str(r#"{"id":"1","friendlyId":"P1"}"#).expect("minimal record");
        assert!(!record.is_approximate_date_of_birth);
        assert_eq!(record.date_of_birth, None);
    }
}
