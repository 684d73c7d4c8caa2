//! Compositions: a clinical encounter or report header for one patient.

use super::{RecordId, Resource};
use crate::form::datetime_input;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Composition {
    pub patient_id: RecordId,
    #[serde(with = "datetime_input")]
    #[schema(value_type = String, example = "2025-04-28T08:00:00Z")]
    pub start_time: DateTime<Utc>,
}

impl Resource for Composition {
    const KIND: &'static str = "composition";
}
