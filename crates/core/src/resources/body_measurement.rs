//! Vital signs and anthropometrics recorded against a patient.

use super::{RecordId, Resource};
use crate::form::{datetime_input, optional_datetime_input};
use crate::validation::{validate_finite, validate_text_len};
use crate::EhrResult;
use chrono::{DateTime, Utc};
use ehr_types::{NonEmptyText, SnomedCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BodyMeasurement {
    pub patient_id: RecordId,
    #[serde(with = "datetime_input")]
    #[schema(value_type = String, example = "2025-04-27T08:00:00Z")]
    pub record_time: DateTime<Utc>,
    pub value: f64,
    #[schema(value_type = String, example = "cm")]
    pub unit: NonEmptyText,
    /// Observable entity, e.g. `50373000` for body height.
    #[schema(value_type = String, example = "50373000")]
    pub snomed_code: SnomedCode,
}

impl Resource for BodyMeasurement {
    const KIND: &'static str = "body measurement";

    fn validate(&self) -> EhrResult<()> {
        validate_finite("value", self.value)?;
        validate_text_len("unit", self.unit.as_str())
    }
}

/// Partial update: absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BodyMeasurementUpdate {
    #[serde(default)]
    pub patient_id: Option<RecordId>,
    #[serde(default, with = "optional_datetime_input")]
    #[schema(value_type = Option<String>)]
    pub record_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub unit: Option<NonEmptyText>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub snomed_code: Option<SnomedCode>,
}

impl BodyMeasurementUpdate {
    pub fn apply_to(self, current: &BodyMeasurement) -> BodyMeasurement {
        BodyMeasurement {
            patient_id: self.patient_id.unwrap_or(current.patient_id),
            record_time: self.record_time.unwrap_or(current.record_time),
            value: self.value.unwrap_or(current.value),
            unit: self.unit.unwrap_or_else(|| current.unit.clone()),
            snomed_code: self
                .snomed_code
                .unwrap_or_else(|| current.snomed_code.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn height() -> BodyMeasurement {
        BodyMeasurement {
            patient_id: 1,
            record_time: Utc.with_ymd_and_hms(2025, 4, 27, 8, 0, 0).unwrap(),
            value: 180.0,
            unit: NonEmptyText::new("cm").unwrap(),
            snomed_code: SnomedCode::parse("50373000").unwrap(),
        }
    }

    #[test]
    fn partial_update_keeps_unspecified_fields() {
        let update: BodyMeasurementUpdate =
            serde_json::from_str(r#"{"value":181.5}"#).expect("parse update");
        let updated = update.apply_to(&height());
        assert_eq!(updated.value, 181.5);
        assert_eq!(updated.unit.as_str(), "cm");
        assert_eq!(updated.record_time, height().record_time);
    }

    #[test]
    fn partial_update_accepts_form_datetime() {
        let update: BodyMeasurementUpdate =
            serde_json::from_str(r#"{"record_time":"2025-05-01T09:30","patient_id":2}"#)
                .expect("parse update");
        let updated = update.apply_to(&height());
        assert_eq!(
            updated.record_time,
            Utc.with_ymd_and_hms(2025, 5, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(updated.patient_id, 2);
    }
}
