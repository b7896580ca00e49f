//! Field presenter: turns a loaded [`PatientRecord`] into read-only field descriptors.
//!
//! Everything here is a pure function of the record and the supplied `now`. The only rule with
//! any weight is the date-of-birth one:
//! - age is the number of whole calendar years between the birth date and `now`
//! - an approximate birth date changes the age and date-of-birth *labels*, never their values
//!
//! Label strings are localisation keys; resolving them is the renderer's job.

use crate::constants::{
    AGE_LABEL, APPROXIMATE_AGE_LABEL, APPROXIMATE_DATE_OF_BIRTH_LABEL, DATE_OF_BIRTH_LABEL,
    LABEL_PREFIX,
};
use crate::error::ViewError;
use crate::record::PatientRecord;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Control type the renderer should use for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Select,
    Date,
    TextArea,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Select => "select",
            FieldKind::Date => "date",
            FieldKind::TextArea => "textArea",
        }
    }
}

/// Value carried by a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    /// Left unformatted so the renderer can apply the user's locale.
    Date(DateTime<Utc>),
    /// The stored record has no value for this field.
    Empty,
}

impl FieldValue {
    fn from_optional(value: Option<&String>) -> Self {
        value.map_or(FieldValue::Empty, |v| FieldValue::Text(v.clone()))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// A named, labelled, read-only unit of displayed patient data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: String,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub is_editable: bool,
}

impl FieldDescriptor {
    fn read_only(name: &'static str, label: String, kind: FieldKind, value: FieldValue) -> Self {
        Self {
            name,
            label,
            kind,
            value,
            is_editable: false,
        }
    }

    fn passthrough(name: &'static str, kind: FieldKind, value: Option<&String>) -> Self {
        Self::read_only(
            name,
            format!("{LABEL_PREFIX}.{name}"),
            kind,
            FieldValue::from_optional(value),
        )
    }
}

/// Ordered set of fields derived from one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PatientFields(Vec<FieldDescriptor>);

impl PatientFields {
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for PatientFields {
    type Item = FieldDescriptor;
    type IntoIter = std::vec::IntoIter<FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PatientFields {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Label keys for the age and date-of-birth fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateOfBirthLabels {
    pub age: &'static str,
    pub date_of_birth: &'static str,
}

impl DateOfBirthLabels {
    pub fn for_flag(is_approximate: bool) -> Self {
        if is_approximate {
            Self {
                age: APPROXIMATE_AGE_LABEL,
                date_of_birth: APPROXIMATE_DATE_OF_BIRTH_LABEL,
            }
        } else {
            Self {
                age: AGE_LABEL,
                date_of_birth: DATE_OF_BIRTH_LABEL,
            }
        }
    }
}

/// Age and date-of-birth values, independent of the approximation flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedDateOfBirth {
    /// Whole years as a string; empty when there is no usable birth date.
    pub age: String,
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// Parse a stored birth date.
///
/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` date, the latter taken as midnight UTC.
pub fn parse_date_of_birth(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc3339_err) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .map_err(|_| rfc3339_err),
    }
}

/// Whole calendar years between `date_of_birth` and `now`, compared on UTC dates.
///
/// Never negative: a birth date after `now` yields 0.
pub fn age_in_years(date_of_birth: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    now.date_naive()
        .years_since(date_of_birth.date_naive())
        .unwrap_or(0)
}

/// Derive the age and date-of-birth values for `record`.
///
/// An unparseable birth date degrades to blank values rather than failing the view.
pub fn derive_date_of_birth(record: &PatientRecord, now: DateTime<Utc>) -> DerivedDateOfBirth {
    let Some(raw) = record.date_of_birth.as_deref() else {
        return DerivedDateOfBirth {
            age: String::new(),
            date_of_birth: None,
        };
    };

    match parse_date_of_birth(raw) {
        Ok(date_of_birth) => DerivedDateOfBirth {
            age: age_in_years(date_of_birth, now).to_string(),
            date_of_birth: Some(date_of_birth),
        },
        Err(e) => {
            let err = ViewError::MalformedRecord {
                id: record.id.clone(),
                reason: format!("dateOfBirth {raw:?}: {e}"),
            };
            tracing::warn!("{err}");
            DerivedDateOfBirth {
                age: String::new(),
                date_of_birth: None,
            }
        }
    }
}

/// Derive every displayed field for `record` as of `now`.
pub fn derive_fields(record: &PatientRecord, now: DateTime<Utc>) -> PatientFields {
    let labels = DateOfBirthLabels::for_flag(record.is_approximate_date_of_birth);
    let derived = derive_date_of_birth(record, now);

    let date_of_birth_value = derived
        .date_of_birth
        .map_or(FieldValue::Empty, FieldValue::Date);

    PatientFields(vec![
        FieldDescriptor::passthrough("prefix", FieldKind::Text, record.prefix.as_ref()),
        FieldDescriptor::passthrough("givenName", FieldKind::Text, record.given_name.as_ref()),
        FieldDescriptor::passthrough("familyName", FieldKind::Text, record.family_name.as_ref()),
        FieldDescriptor::passthrough("suffix", FieldKind::Text, record.suffix.as_ref()),
        FieldDescriptor::passthrough("sex", FieldKind::Select, record.sex.as_ref()),
        FieldDescriptor::passthrough("type", FieldKind::Select, record.patient_type.as_ref()),
        FieldDescriptor::read_only(
            "dateOfBirth",
            labels.date_of_birth.to_string(),
            FieldKind::Date,
            date_of_birth_value,
        ),
        FieldDescriptor::read_only(
            "age",
            labels.age.to_string(),
            FieldKind::Text,
            FieldValue::Text(derived.age),
        ),
        FieldDescriptor::passthrough("occupation", FieldKind::Text, record.occupation.as_ref()),
        FieldDescriptor::passthrough(
            "preferredLanguage",
            FieldKind::Text,
            record.preferred_language.as_ref(),
        ),
        FieldDescriptor::passthrough("phoneNumber", FieldKind::Text, record.phone_number.as_ref()),
        FieldDescriptor::passthrough("email", FieldKind::Text, record.email.as_ref()),
        FieldDescriptor::passthrough("address", FieldKind::TextArea, record.address.as_ref()),
    ])
}

/// Page title for a loaded record: `"{given} {family} {suffix} ({friendlyId})"`.
///
/// Empty name parts are skipped, as is the parenthesised friendly id when it is blank.
pub fn patient_title(record: &PatientRecord) -> String {
    let name = [&record.given_name, &record.family_name, &record.suffix]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let friendly_id = record.friendly_id.trim();
    match (name.is_empty(), friendly_id.is_empty()) {
        (_, true) => name,
        (true, false) => format!("({friendly_id})"),
        (false, false) => format!("{name} ({friendly_id})"),
    }
}
