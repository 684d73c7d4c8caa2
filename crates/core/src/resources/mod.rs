//! Clinical resource records.
//!
//! Each submodule defines the field set of one resource, which doubles as the create/update
//! payload and as the stored data. Identity and versioning are added by the store and shown
//! on the wire by [`Record`] (integer keys) or [`Versioned`] (natural keys):
//!
//! ```text
//! { "id": 3, "first_name": "Jane", ..., "version": 2 }
//! ```

pub mod body_measurement;
pub mod composition;
pub mod lab_analyte;
pub mod lab_test;
pub mod panels;
pub mod patient;
pub mod reference_range;
pub mod specimen;

pub use body_measurement::{BodyMeasurement, BodyMeasurementUpdate};
pub use composition::Composition;
pub use lab_analyte::LabAnalyteResult;
pub use lab_test::LabTest;
pub use panels::{BloodTypePanel, CbcPanel};
pub use patient::{Patient, Sex};
pub use reference_range::{ReferenceRange, ReferenceRangeUpdate};
pub use specimen::Specimen;

use crate::EhrResult;
use serde::{Deserialize, Serialize};

/// Integer identifier assigned by the store.
pub type RecordId = i64;

/// Behaviour shared by every stored resource.
pub trait Resource: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Human-readable resource name used in errors and logs.
    const KIND: &'static str;

    /// Check field-level invariants that the type system does not already enforce.
    fn validate(&self) -> EhrResult<()> {
        Ok(())
    }
}

/// A live integer-keyed record as returned to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: RecordId,
    #[serde(flatten)]
    pub data: T,
    pub version: u32,
}

/// A live record whose key is one of its own fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(flatten)]
    pub data: T,
    pub version: u32,
}

/// Deserialise an optional field, treating a blank string the same as `null`.
///
/// Form inputs left empty arrive as `""`; for optional codes and text that means "absent".
pub(crate) fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
