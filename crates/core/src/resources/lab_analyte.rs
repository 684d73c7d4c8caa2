//! Individual analyte results reported by a lab test.

use super::{blank_as_none, RecordId, Resource};
use crate::interpretation::{ReferenceBounds, ResultFlag};
use crate::validation::{validate_bounds, validate_finite, validate_text_len};
use crate::{EhrError, EhrResult};
use ehr_types::LoincCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum length of a result flag.
pub const FLAG_MAX_LEN: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabAnalyteResult {
    pub lab_test_id: RecordId,
    #[schema(value_type = String, example = "718-7")]
    pub loinc_code: LoincCode,
    pub value: f64,
    /// Unit of measure; empty for qualitative results such as blood group.
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub reference_low: Option<f64>,
    #[serde(default)]
    pub reference_high: Option<f64>,
    /// Abnormal flag (`L`, `N`, `H`) or coded text for qualitative results (`A`, `POS`).
    /// Computed from the bounds when omitted.
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<String>, example = "N")]
    pub interpretation: Option<ResultFlag>,
}

impl LabAnalyteResult {
    pub fn bounds(&self) -> ReferenceBounds {
        ReferenceBounds::new(self.reference_low, self.reference_high)
    }

    pub fn has_bounds(&self) -> bool {
        !self.bounds().is_unbounded()
    }
}

impl Resource for LabAnalyteResult {
    const KIND: &'static str = "lab analyte result";

    fn validate(&self) -> EhrResult<()> {
        validate_finite("value", self.value)?;
        validate_bounds(self.reference_low, self.reference_high)?;
        if let Some(flag) = &self.interpretation {
            if flag.as_str().chars().count() > FLAG_MAX_LEN {
                return Err(EhrError::InvalidInput(format!(
                    "interpretation exceeds maximum length of {FLAG_MAX_LEN} characters"
                )));
            }
        }
        validate_text_len("unit", &self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpretation::Interpretation;
    use ehr_types::NonEmptyText;

    fn analyte(value: f64, low: Option<f64>, high: Option<f64>) -> LabAnalyteResult {
        LabAnalyteResult {
            lab_test_id: 1,
            loinc_code: LoincCode::parse("2345-7").unwrap(),
            value,
            unit: "mmol/L".into(),
            reference_low: low,
            reference_high: high,
            interpretation: None,
        }
    }

    #[test]
    fn parses_payload_with_null_bounds_and_blank_interpretation() {
        let parsed: LabAnalyteResult = serde_json::from_str(
            r#"{"lab_test_id":4,"loinc_code":"2093-3","value":5.8,"unit":"mmol/L",
                "reference_low":null,"reference_high":5.2,"interpretation":""}"#,
        )
        .expect("parse analyte");
        assert_eq!(parsed.reference_low, None);
        assert_eq!(parsed.reference_high, Some(5.2));
        assert!(parsed.interpretation.is_none());
        assert!(parsed.has_bounds());
    }

    #[test]
    fn accepts_word_interpretation_and_emits_code() {
        let parsed: LabAnalyteResult = serde_json::from_str(
            r#"{"lab_test_id":4,"loinc_code":"2093-3","value":5.8,"unit":"mmol/L",
                "interpretation":"High"}"#,
        )
        .expect("parse analyte");
        assert_eq!(
            parsed.interpretation,
            Some(ResultFlag::Interpretation(Interpretation::High))
        );
        let json = serde_json::to_value(&parsed).expect("serialise");
        assert_eq!(json["interpretation"], "H");
    }

    #[test]
    fn validation_rejects_inverted_bounds() {
        let err = analyte(5.0, Some(6.0), Some(3.0))
            .validate()
            .expect_err("inverted bounds");
        assert!(matches!(err, EhrError::InvalidInput(_)));
        assert!(analyte(5.0, Some(3.9), Some(5.8)).validate().is_ok());
    }

    #[test]
    fn qualitative_flags_parse_as_coded_text() {
        let parsed: LabAnalyteResult = serde_json::from_str(
            r#"{"lab_test_id":9,"loinc_code":"10331-7","value":1,"unit":"",
                "interpretation":"POS"}"#,
        )
        .expect("parse rh result");
        assert_eq!(
            parsed.interpretation,
            Some(ResultFlag::Coded(NonEmptyText::new("POS").unwrap()))
        );
        assert!(parsed.validate().is_ok());

        let mut long = analyte(1.0, None, None);
        long.interpretation = Some(ResultFlag::Coded(
            NonEmptyText::new("x".repeat(FLAG_MAX_LEN + 1)).unwrap(),
        ));
        assert!(matches!(long.validate(), Err(EhrError::InvalidInput(_))));
    }
}
