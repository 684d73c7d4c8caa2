//! Validated primitive types shared by the EHR crates.
//!
//! Each type here guarantees its invariant once constructed, so downstream code never has to
//! re-check a patient name for emptiness or a LOINC code for shape.
//!
//! - [`NonEmptyText`]: trimmed, non-empty free text.
//! - [`LoincCode`]: a LOINC observation code such as `718-7`.
//! - [`SnomedCode`]: a SNOMED CT concept identifier such as `122555007`.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors that can occur when parsing a clinical code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("LOINC code cannot be empty")]
    EmptyLoinc,
    #[error("invalid LOINC code '{0}' (expected digits followed by '-' and a check digit)")]
    InvalidLoinc(String),
    #[error("SNOMED CT code cannot be empty")]
    EmptySnomed,
    #[error("invalid SNOMED CT code '{0}' (expected 6 to 18 digits)")]
    InvalidSnomed(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Maximum stored length for a LOINC code column.
const LOINC_MAX_LEN: usize = 20;

/// A LOINC observation identifier.
///
/// LOINC codes are a numeric part followed by a hyphen and a single check digit, e.g. `718-7`
/// (haemoglobin) or `57021-8` (CBC panel). The check digit itself is not verified; only the
/// shape is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoincCode(String);

impl LoincCode {
    /// Parses a LOINC code, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::EmptyLoinc`] for blank input and [`CodeError::InvalidLoinc`] when
    /// the value is too long or not of the form `<digits>-<digit>`.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, CodeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CodeError::EmptyLoinc);
        }
        if trimmed.len() > LOINC_MAX_LEN {
            return Err(CodeError::InvalidLoinc(trimmed.to_owned()));
        }

        let valid = match trimmed.split_once('-') {
            Some((number, check)) => {
                !number.is_empty()
                    && number.bytes().all(|b| b.is_ascii_digit())
                    && check.len() == 1
                    && check.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        };

        if !valid {
            return Err(CodeError::InvalidLoinc(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LoincCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A SNOMED CT concept identifier (SCTID).
///
/// SCTIDs are 6 to 18 decimal digits without a leading zero.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnomedCode(String);

impl SnomedCode {
    /// Parses a SNOMED CT code, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::EmptySnomed`] for blank input and [`CodeError::InvalidSnomed`]
    /// otherwise.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, CodeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CodeError::EmptySnomed);
        }

        let valid = (6..=18).contains(&trimmed.len())
            && trimmed.bytes().all(|b| b.is_ascii_digit())
            && !trimmed.starts_with('0');
        if !valid {
            return Err(CodeError::InvalidSnomed(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SnomedCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Display, AsRef and string-shaped serde for each validated wrapper. Deserialisation goes
// through the type's constructor so invalid values never reach the domain.
macro_rules! validated_string {
    ($ty:ident, $ctor:path) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $ctor(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string!(NonEmptyText, NonEmptyText::new);
validated_string!(LoincCode, LoincCode::parse);
validated_string!(SnomedCode, SnomedCode::parse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Jane  ").expect("valid text");
        assert_eq!(text.as_str(), "Jane");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn accepts_common_loinc_codes() {
        for code in ["718-7", "6690-2", "57021-8", "18262-6", "10331-7"] {
            let parsed = LoincCode::parse(code).expect("valid loinc");
            assert_eq!(parsed.as_str(), code);
        }
    }

    #[test]
    fn rejects_malformed_loinc_codes() {
        assert_eq!(LoincCode::parse(""), Err(CodeError::EmptyLoinc));
        for code in ["7187", "-7", "718-", "718-77", "abc-1", "718-7-1"] {
            assert!(
                matches!(LoincCode::parse(code), Err(CodeError::InvalidLoinc(_))),
                "{code} should be rejected"
            );
        }
    }

    #[test]
    fn snomed_codes_are_digit_strings() {
        assert!(SnomedCode::parse("122555007").is_ok());
        assert!(SnomedCode::parse("50373000").is_ok());
        assert!(matches!(
            SnomedCode::parse("12345"),
            Err(CodeError::InvalidSnomed(_))
        ));
        assert!(matches!(
            SnomedCode::parse("0123456"),
            Err(CodeError::InvalidSnomed(_))
        ));
        assert!(matches!(
            SnomedCode::parse("12a4567"),
            Err(CodeError::InvalidSnomed(_))
        ));
    }

    #[test]
    fn deserialisation_validates() {
        let code: LoincCode = serde_json::from_str("\"2345-7\"").expect("valid json");
        assert_eq!(code.to_string(), "2345-7");

        let err = serde_json::from_str::<LoincCode>("\"glucose\"").expect_err("invalid code");
        assert!(err.to_string().contains("glucose"));

        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("empty text");
        assert!(err.to_string().contains("empty"));
    }
}
