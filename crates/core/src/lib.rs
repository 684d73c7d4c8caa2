//! # EHR Core
//!
//! Core business logic for the EHR clinical data service.
//!
//! This crate contains pure data operations:
//! - The lab analyte interpretation evaluator (Low / Normal / High against optional bounds)
//! - Versioned in-memory collections for every clinical resource
//! - [`ClinicalService`] with referential checks and automatic analyte interpretation
//! - The reference range catalogue (YAML) and sample data seeding
//!
//! **No API concerns**: HTTP servers, status codes and CLI parsing belong in `api-rest` and
//! `cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod form;
pub mod interpretation;
pub mod reference_ranges;
pub mod resources;
pub mod seed;
pub mod service;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use error::{EhrError, EhrResult};
pub use interpretation::{
    interpret, try_interpret, Interpretation, ReferenceBounds, ResultFlag,
};
pub use reference_ranges::ReferenceRangeCatalogue;
pub use service::ClinicalService;

pub use ehr_types::{LoincCode, NonEmptyText, SnomedCode};
