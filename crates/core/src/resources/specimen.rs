//! Specimens collected for laboratory testing.

use super::{blank_as_none, Resource};
use crate::form::datetime_input;
use crate::validation::{validate_optional_text_len, validate_text_len};
use crate::EhrResult;
use chrono::{DateTime, Utc};
use ehr_types::{NonEmptyText, SnomedCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Specimen {
    #[schema(value_type = String, example = "Venous blood")]
    pub specimen_type: NonEmptyText,
    #[serde(with = "datetime_input")]
    #[schema(value_type = String, example = "2025-04-27T07:45:00Z")]
    pub collection_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<String>, example = "122555007")]
    pub snomed_code: Option<SnomedCode>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
}

impl Resource for Specimen {
    const KIND: &'static str = "specimen";

    fn validate(&self) -> EhrResult<()> {
        validate_text_len("specimen_type", self.specimen_type.as_str())?;
        validate_optional_text_len("description", self.description.as_deref())
    }
}
