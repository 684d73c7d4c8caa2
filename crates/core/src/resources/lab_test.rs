//! Lab tests: an ordered investigation on a specimen within a composition.

use super::{blank_as_none, RecordId, Resource};
use crate::validation::validate_optional_text_len;
use crate::EhrResult;
use ehr_types::LoincCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabTest {
    pub composition_id: RecordId,
    pub specimen_id: RecordId,
    /// Panel or test code, e.g. `57021-8` for a CBC.
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<String>, example = "57021-8")]
    pub loinc_code: Option<LoincCode>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
}

impl Resource for LabTest {
    const KIND: &'static str = "lab test";

    fn validate(&self) -> EhrResult<()> {
        validate_optional_text_len("description", self.description.as_deref())
    }
}
