//! Reference-range interpretation of lab analyte values.
//!
//! A measured value is classified against an optional low bound and an optional high bound:
//!
//! - `Low` when a low bound is present and the value is strictly below it,
//! - otherwise `High` when a high bound is present and the value is strictly above it,
//! - otherwise `Normal`.
//!
//! The low bound is checked first. A value equal to either bound is `Normal`, and a missing
//! bound never triggers. Bounds are `Option<f64>` so that "no bound" and "a bound of zero"
//! stay distinct.
//!
//! The evaluation is pure and holds no state; it can be called from any thread.

use ehr_types::{NonEmptyText, TextError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Abnormal-flag classification of an analyte value.
///
/// On the wire this is the HL7 abnormal-flag code (`"L"`, `"N"`, `"H"`); [`fmt::Display`]
/// renders the full word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interpretation {
    Low,
    Normal,
    High,
}

impl Interpretation {
    /// HL7 abnormal-flag code for this interpretation.
    pub fn code(self) -> &'static str {
        match self {
            Interpretation::Low => "L",
            Interpretation::Normal => "N",
            Interpretation::High => "H",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Interpretation::Low => "Low",
            Interpretation::Normal => "Normal",
            Interpretation::High => "High",
        }
    }

    /// Whether the value fell outside its reference range.
    pub fn is_abnormal(self) -> bool {
        !matches!(self, Interpretation::Normal)
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an interpretation flag fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interpretation '{0}' (expected L, N, H, Low, Normal or High)")]
pub struct ParseInterpretationError(String);

impl FromStr for Interpretation {
    type Err = ParseInterpretationError;

    /// Accepts the HL7 code or the full word, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(Interpretation::Low),
            "n" | "normal" => Ok(Interpretation::Normal),
            "h" | "high" => Ok(Interpretation::High),
            _ => Err(ParseInterpretationError(s.to_owned())),
        }
    }
}

impl Serialize for Interpretation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Interpretation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Flag recorded on a stored analyte result.
///
/// Quantitative results carry an evaluator [`Interpretation`]. Qualitative results such as
/// blood group are flagged with coded text instead (`"A"`, `"POS"`), which the evaluator
/// never produces or overrides. Parsing prefers the evaluator codes, so `"H"` is `High`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResultFlag {
    Interpretation(Interpretation),
    Coded(NonEmptyText),
}

impl ResultFlag {
    pub fn as_str(&self) -> &str {
        match self {
            ResultFlag::Interpretation(i) => i.code(),
            ResultFlag::Coded(text) => text.as_str(),
        }
    }

    /// The evaluator flag, if this is one.
    pub fn interpretation(&self) -> Option<Interpretation> {
        match self {
            ResultFlag::Interpretation(i) => Some(*i),
            ResultFlag::Coded(_) => None,
        }
    }
}

impl From<Interpretation> for ResultFlag {
    fn from(value: Interpretation) -> Self {
        ResultFlag::Interpretation(value)
    }
}

impl fmt::Display for ResultFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultFlag::Interpretation(i) => f.write_str(i.label()),
            ResultFlag::Coded(text) => f.write_str(text.as_str()),
        }
    }
}

impl FromStr for ResultFlag {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Interpretation>() {
            Ok(i) => Ok(ResultFlag::Interpretation(i)),
            Err(_) => NonEmptyText::new(s).map(ResultFlag::Coded),
        }
    }
}

impl Serialize for ResultFlag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResultFlag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors from the strict evaluation path.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InterpretationError {
    #[error("value must be a finite number, got {0}")]
    NonFiniteValue(f64),
}

/// Optional low/high bounds of a reference range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBounds {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl ReferenceBounds {
    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        Self { low, high }
    }

    /// True when neither side is bounded.
    pub fn is_unbounded(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }

    pub fn interpret(&self, value: f64) -> Interpretation {
        interpret(value, self.low, self.high)
    }

    pub fn try_interpret(&self, value: f64) -> Result<Interpretation, InterpretationError> {
        try_interpret(value, self.low, self.high)
    }
}

/// Classify `value` against optional `low` and `high` bounds.
///
/// Comparisons are strict, the low side is checked first, and an absent bound never
/// triggers. A NaN `value` compares false against everything and therefore yields
/// `Normal`; use [`try_interpret`] to reject it instead.
///
/// ```rust
/// # use ehr_core::interpretation::{interpret, Interpretation};
/// assert_eq!(interpret(3.0, Some(4.0), Some(10.0)), Interpretation::Low);
/// assert_eq!(interpret(10.0, Some(4.0), Some(10.0)), Interpretation::Normal);
/// assert_eq!(interpret(12.0, None, Some(10.0)), Interpretation::High);
/// ```
pub fn interpret(value: f64, low: Option<f64>, high: Option<f64>) -> Interpretation {
    if low.is_some_and(|low| value < low) {
        return Interpretation::Low;
    }
    if high.is_some_and(|high| value > high) {
        return Interpretation::High;
    }
    Interpretation::Normal
}

/// Like [`interpret`], but rejects a non-finite `value`.
///
/// # Errors
///
/// Returns [`InterpretationError::NonFiniteValue`] for NaN or infinite input.
pub fn try_interpret(
    value: f64,
    low: Option<f64>,
    high: Option<f64>,
) -> Result<Interpretation, InterpretationError> {
    if !value.is_finite() {
        return Err(InterpretationError::NonFiniteValue(value));
    }
    Ok(interpret(value, low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_scenarios() {
        assert_eq!(interpret(5.0, None, None), Interpretation::Normal);
        assert_eq!(interpret(3.0, Some(4.0), Some(10.0)), Interpretation::Low);
        assert_eq!(interpret(15.0, Some(4.0), Some(10.0)), Interpretation::High);
        assert_eq!(interpret(4.0, Some(4.0), Some(10.0)), Interpretation::Normal);
        assert_eq!(interpret(10.0, Some(4.0), Some(10.0)), Interpretation::Normal);
        assert_eq!(interpret(7.0, None, Some(10.0)), Interpretation::Normal);
        assert_eq!(interpret(12.0, None, Some(10.0)), Interpretation::High);
    }

    #[test]
    fn unbounded_is_always_normal() {
        for value in [-1.0e9, -3.5, 0.0, 0.1, 42.0, 1.0e12] {
            assert_eq!(interpret(value, None, None), Interpretation::Normal);
        }
    }

    #[test]
    fn below_low_wins_regardless_of_high() {
        // An inverted range still reports Low first.
        assert_eq!(interpret(1.0, Some(2.0), Some(0.5)), Interpretation::Low);
        assert_eq!(interpret(1.0, Some(2.0), None), Interpretation::Low);
        assert_eq!(interpret(-5.0, Some(0.0), Some(10.0)), Interpretation::Low);
    }

    #[test]
    fn zero_bound_is_not_absent() {
        assert_eq!(interpret(-0.5, Some(0.0), None), Interpretation::Low);
        assert_eq!(interpret(0.5, None, Some(0.0)), Interpretation::High);
        assert_eq!(interpret(0.0, Some(0.0), Some(0.0)), Interpretation::Normal);
    }

    #[test]
    fn values_inside_closed_range_are_normal() {
        let bounds = ReferenceBounds::new(Some(12.0), Some(17.5));
        for value in [12.0, 12.000001, 14.2, 17.5] {
            assert_eq!(bounds.interpret(value), Interpretation::Normal);
        }
        assert_eq!(bounds.interpret(11.9), Interpretation::Low);
        assert_eq!(bounds.interpret(17.6), Interpretation::High);
    }

    #[test]
    fn nan_is_normal_on_the_lenient_path_and_rejected_on_the_strict_path() {
        assert_eq!(
            interpret(f64::NAN, Some(1.0), Some(2.0)),
            Interpretation::Normal
        );
        assert!(matches!(
            try_interpret(f64::NAN, Some(1.0), Some(2.0)),
            Err(InterpretationError::NonFiniteValue(_))
        ));
        assert!(try_interpret(f64::INFINITY, None, None).is_err());
        assert_eq!(
            try_interpret(3.0, Some(4.0), None),
            Ok(Interpretation::Low)
        );
    }

    #[test]
    fn wire_codes_and_words_parse() {
        assert_eq!("L".parse::<Interpretation>(), Ok(Interpretation::Low));
        assert_eq!("normal".parse::<Interpretation>(), Ok(Interpretation::Normal));
        assert_eq!(" High ".parse::<Interpretation>(), Ok(Interpretation::High));
        assert!("abnormal".parse::<Interpretation>().is_err());
    }

    #[test]
    fn serialises_as_hl7_code() {
        let json = serde_json::to_string(&Interpretation::High).expect("serialise");
        assert_eq!(json, "\"H\"");
        let parsed: Interpretation = serde_json::from_str("\"Low\"").expect("deserialise");
        assert_eq!(parsed, Interpretation::Low);
        assert_eq!(Interpretation::Normal.to_string(), "Normal");
        assert!(!Interpretation::Normal.is_abnormal());
        assert!(Interpretation::Low.is_abnormal());
    }

    #[test]
    fn result_flags_keep_coded_text() {
        assert_eq!(
            "N".parse::<ResultFlag>(),
            Ok(ResultFlag::Interpretation(Interpretation::Normal))
        );
        let pos: ResultFlag = "POS".parse().expect("coded flag");
        assert_eq!(pos, ResultFlag::Coded(NonEmptyText::new("POS").unwrap()));
        assert_eq!(pos.interpretation(), None);
        assert_eq!(pos.to_string(), "POS");
        assert!("  ".parse::<ResultFlag>().is_err());

        let json = serde_json::to_string(&ResultFlag::from(Interpretation::Low)).unwrap();
        assert_eq!(json, "\"L\"");
        let abo: ResultFlag = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(abo.as_str(), "A");
    }
}
