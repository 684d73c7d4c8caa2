//! Patient demographics.

use super::{blank_as_none, Resource};
use crate::validation::{validate_optional_text_len, validate_text_len};
use crate::EhrResult;
use ehr_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Administrative sex as recorded on the patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    #[schema(value_type = String, example = "Jane")]
    pub first_name: NonEmptyText,
    #[schema(value_type = String, example = "Smith")]
    pub last_name: NonEmptyText,
    pub sex: Sex,
    /// Local identifier such as a hospital number.
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<String>, example = "PAT-002")]
    pub identifier: Option<String>,
}

impl Resource for Patient {
    const KIND: &'static str = "patient";

    fn validate(&self) -> EhrResult<()> {
        validate_text_len("first_name", self.first_name.as_str())?;
        validate_text_len("last_name", self.last_name.as_str())?;
        validate_optional_text_len("identifier", self.identifier.as_deref())
    }
}

impl Patient {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_payload_with_blank_identifier() {
        let patient: Patient = serde_json::from_str(
            r#"{"first_name":" John ","last_name":"Doe","sex":"male","identifier":""}"#,
        )
        .expect("parse patient");
        assert_eq!(patient.first_name.as_str(), "John");
        assert_eq!(patient.sex, Sex::Male);
        assert!(patient.identifier.is_none());
        assert_eq!(patient.display_name(), "John Doe");
    }

    #[test]
    fn rejects_unknown_sex_and_empty_names() {
        assert!(serde_json::from_str::<Patient>(
            r#"{"first_name":"A","last_name":"B","sex":"other"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<Patient>(
            r#"{"first_name":"","last_name":"B","sex":"female"}"#
        )
        .is_err());
    }
}
