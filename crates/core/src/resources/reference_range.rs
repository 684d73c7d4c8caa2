//! Reference ranges keyed by LOINC code.

use super::{blank_as_none, Resource};
use crate::interpretation::ReferenceBounds;
use crate::validation::{validate_bounds, validate_optional_text_len};
use crate::EhrResult;
use ehr_types::LoincCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceRange {
    #[schema(value_type = String, example = "718-7")]
    pub loinc_code: LoincCode,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<String>, example = "g/dL")]
    pub unit: Option<String>,
}

impl ReferenceRange {
    pub fn bounds(&self) -> ReferenceBounds {
        ReferenceBounds::new(self.low, self.high)
    }
}

impl Resource for ReferenceRange {
    const KIND: &'static str = "reference range";

    fn validate(&self) -> EhrResult<()> {
        validate_bounds(self.low, self.high)?;
        validate_optional_text_len("unit", self.unit.as_deref())
    }
}

/// Update payload for a reference range.
///
/// The LOINC code is the key and cannot change; a `loinc_code` field in the body is ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceRangeUpdate {
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub unit: Option<String>,
}

impl ReferenceRangeUpdate {
    pub fn into_range(self, loinc_code: LoincCode) -> ReferenceRange {
        ReferenceRange {
            loinc_code,
            low: self.low,
            high: self.high,
            unit: self.unit,
        }
    }
}
