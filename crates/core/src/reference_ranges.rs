//! Reference range catalogue.
//!
//! The catalogue maps LOINC codes to reference bounds and is read from YAML:
//!
//! ```yaml
//! reference_ranges:
//!   - loinc_code: "718-7"
//!     name: Hemoglobin
//!     low: 12.0
//!     high: 17.5
//!     unit: g/dL
//! ```
//!
//! Parsing is strict: unknown keys, malformed codes, duplicate codes and inverted bounds are
//! all rejected, and schema errors report the path of the offending field.

use crate::constants::BUNDLED_REFERENCE_RANGES;
use crate::interpretation::ReferenceBounds;
use crate::resources::{ReferenceRange, Resource};
use crate::{EhrError, EhrResult};
use ehr_types::LoincCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One catalogue row: the range plus an optional display name.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogueEntry {
    pub name: Option<String>,
    pub range: ReferenceRange,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceRangeCatalogue {
    entries: BTreeMap<LoincCode, CatalogueEntry>,
}

impl ReferenceRangeCatalogue {
    /// The catalogue shipped with this crate.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled file is malformed, which the tests guard against.
    pub fn bundled() -> EhrResult<Self> {
        Self::from_yaml(BUNDLED_REFERENCE_RANGES)
    }

    /// Load a catalogue from a YAML file on disk.
    pub fn from_path(path: &Path) -> EhrResult<Self> {
        let text = std::fs::read_to_string(path).map_err(EhrError::FileRead)?;
        tracing::debug!("loading reference ranges from {}", path.display());
        Self::from_yaml(&text)
    }

    /// Parse a catalogue from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `EhrError::Translation` if the YAML does not match the catalogue schema
    /// (including unknown keys), or `EhrError::InvalidInput` for duplicate codes and
    /// inverted bounds.
    pub fn from_yaml(yaml_text: &str) -> EhrResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = match serde_path_to_error::deserialize::<_, CatalogueWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(EhrError::Translation(format!(
                    "reference range schema mismatch at {path}: {source}"
                )));
            }
        };

        let mut entries = BTreeMap::new();
        for row in wire.reference_ranges {
            let loinc_code = LoincCode::parse(&row.loinc_code)?;
            let range = ReferenceRange {
                loinc_code: loinc_code.clone(),
                low: row.low,
                high: row.high,
                unit: row.unit.filter(|u| !u.trim().is_empty()),
            };
            range.validate().map_err(|e| {
                EhrError::InvalidInput(format!("reference range {loinc_code}: {e}"))
            })?;

            let entry = CatalogueEntry {
                name: row.name,
                range,
            };
            if entries.insert(loinc_code.clone(), entry).is_some() {
                return Err(EhrError::InvalidInput(format!(
                    "duplicate reference range for {loinc_code}"
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &LoincCode) -> Option<&CatalogueEntry> {
        self.entries.get(code)
    }

    pub fn bounds_for(&self, code: &LoincCode) -> Option<ReferenceBounds> {
        self.get(code).map(|entry| entry.range.bounds())
    }

    /// Entries ordered by LOINC code.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.values()
    }

    pub fn ranges(&self) -> impl Iterator<Item = &ReferenceRange> {
        self.entries.values().map(|entry| &entry.range)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogueWire {
    #[serde(default)]
    reference_ranges: Vec<RangeWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeWire {
    loinc_code: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn code(s: &str) -> LoincCode {
        LoincCode::parse(s).expect("valid loinc")
    }

    #[test]
    fn bundled_catalogue_loads() {
        let catalogue = ReferenceRangeCatalogue::bundled().expect("bundled catalogue");
        assert_eq!(catalogue.len(), 20);

        let hb = catalogue.get(&code("718-7")).expect("hemoglobin present");
        assert_eq!(hb.name.as_deref(), Some("Hemoglobin"));
        assert_eq!(hb.range.unit.as_deref(), Some("g/dL"));
        assert_eq!(
            catalogue.bounds_for(&code("718-7")),
            Some(ReferenceBounds::new(Some(12.0), Some(17.5)))
        );

        // Open-ended and unbounded ranges survive.
        assert_eq!(
            catalogue.bounds_for(&code("2085-9")),
            Some(ReferenceBounds::new(Some(1.0), None))
        );
        let abo = catalogue.bounds_for(&code("882-1")).expect("abo present");
        assert!(abo.is_unbounded());
        assert!(catalogue.bounds_for(&code("1234-5")).is_none());
    }

    #[test]
    fn rejects_unknown_keys_with_path() {
        let yaml = r#"reference_ranges:
  - loinc_code: "718-7"
    lower: 12.0
"#;
        let err = ReferenceRangeCatalogue::from_yaml(yaml).expect_err("unknown key");
        match err {
            EhrError::Translation(msg) => {
                assert!(msg.contains("reference_ranges[0]"), "{msg}");
                assert!(msg.contains("lower"), "{msg}");
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_inverted_bounds() {
        let yaml = r#"reference_ranges:
  - loinc_code: "718-7"
    low: 17.5
    high: 12.0
"#;
        let err = ReferenceRangeCatalogue::from_yaml(yaml).expect_err("inverted");
        assert!(matches!(err, EhrError::InvalidInput(msg) if msg.contains("718-7")));
    }

    #[test]
    fn rejects_duplicates_and_bad_codes() {
        let duplicate = r#"reference_ranges:
  - loinc_code: "718-7"
  - loinc_code: "718-7"
"#;
        assert!(matches!(
            ReferenceRangeCatalogue::from_yaml(duplicate),
            Err(EhrError::InvalidInput(_))
        ));

        let bad_code = r#"reference_ranges:
  - loinc_code: "hemoglobin"
"#;
        assert!(matches!(
            ReferenceRangeCatalogue::from_yaml(bad_code),
            Err(EhrError::Code(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "reference_ranges:\n  - loinc_code: \"2823-3\"\n    low: 3.5\n    high: 5.0\n    \
             unit: mmol/L"
        )
        .expect("write yaml");

        let catalogue = ReferenceRangeCatalogue::from_path(file.path()).expect("load file");
        assert_eq!(catalogue.len(), 1);
        assert_eq!(
            catalogue.ranges().next().map(|r| r.loinc_code.as_str()),
            Some("2823-3")
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = ReferenceRangeCatalogue::from_path(&dir.path().join("missing.yaml"))
            .expect_err("missing file");
        assert!(matches!(err, EhrError::FileRead(_)));
    }
}
