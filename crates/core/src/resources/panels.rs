//! Panels that group analyte results of a lab test.

use super::{RecordId, Resource};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Complete blood count: links the headline analytes of a CBC lab test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CbcPanel {
    pub lab_test_id: RecordId,
    #[serde(default)]
    pub hemoglobin_id: Option<RecordId>,
    #[serde(default)]
    pub white_cell_id: Option<RecordId>,
    #[serde(default)]
    pub platelet_id: Option<RecordId>,
}

impl CbcPanel {
    pub fn analyte_ids(&self) -> impl Iterator<Item = RecordId> {
        [self.hemoglobin_id, self.white_cell_id, self.platelet_id]
            .into_iter()
            .flatten()
    }
}

impl Resource for CbcPanel {
    const KIND: &'static str = "CBC panel";
}

/// ABO and Rh typing results of a blood group lab test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BloodTypePanel {
    pub lab_test_id: RecordId,
    #[serde(default)]
    pub abo_id: Option<RecordId>,
    #[serde(default)]
    pub rh_id: Option<RecordId>,
}

impl BloodTypePanel {
    pub fn analyte_ids(&self) -> impl Iterator<Item = RecordId> {
        [self.abo_id, self.rh_id].into_iter().flatten()
    }
}

impl Resource for BloodTypePanel {
    const KIND: &'static str = "blood type panel";
}
