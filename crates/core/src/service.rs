//! Clinical record service.
//!
//! [`ClinicalService`] owns one versioned collection per resource behind a single lock, so a
//! referential check and the mutation it guards happen atomically. Cloning the service is
//! cheap and every clone sees the same data.
//!
//! Rules enforced here, on top of per-resource validation:
//!
//! - Creating or updating a record that points at a missing record fails with
//!   [`EhrError::UnknownReference`].
//! - Deleting a record that a live record still points at fails with [`EhrError::InUse`].
//! - Lab analyte results without bounds pick up the reference range stored for their LOINC
//!   code, and results without an interpretation get one computed from their bounds.
//!
//! Pure data operations only: HTTP status mapping belongs in `api-rest`.

use crate::interpretation::{Interpretation, ReferenceBounds, ResultFlag};
use crate::reference_ranges::ReferenceRangeCatalogue;
use crate::resources::{
    BloodTypePanel, BodyMeasurement, BodyMeasurementUpdate, CbcPanel, Composition,
    LabAnalyteResult, LabTest, Patient, Record, RecordId, ReferenceRange, ReferenceRangeUpdate,
    Resource, Specimen, Versioned,
};
use crate::store::{Collection, Revision};
use crate::{EhrError, EhrResult};
use ehr_types::LoincCode;
use serde::Serialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    patients: Collection<RecordId, Patient>,
    compositions: Collection<RecordId, Composition>,
    specimens: Collection<RecordId, Specimen>,
    lab_tests: Collection<RecordId, LabTest>,
    lab_analytes: Collection<RecordId, LabAnalyteResult>,
    reference_ranges: Collection<LoincCode, ReferenceRange>,
    body_measurements: Collection<RecordId, BodyMeasurement>,
    cbc_panels: Collection<RecordId, CbcPanel>,
    blood_type_panels: Collection<RecordId, BloodTypePanel>,
}

/// Record counts per collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub patients: usize,
    pub compositions: usize,
    pub specimens: usize,
    pub lab_tests: usize,
    pub lab_analytes: usize,
    pub reference_ranges: usize,
    pub body_measurements: usize,
    pub cbc_panels: usize,
    pub blood_type_panels: usize,
}

/// Result of interpreting a value outside of any stored record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpretationOutcome {
    pub interpretation: Interpretation,
    pub bounds: ReferenceBounds,
}

#[derive(Clone, Debug, Default)]
pub struct ClinicalService {
    tables: Arc<RwLock<Tables>>,
}

impl ClinicalService {
    /// An empty service with no reference ranges.
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose reference range collection starts as a copy of `catalogue`.
    pub fn with_catalogue(catalogue: &ReferenceRangeCatalogue) -> EhrResult<Self> {
        let service = Self::new();
        {
            let mut tables = service.write()?;
            for range in catalogue.ranges() {
                tables
                    .reference_ranges
                    .insert(range.loinc_code.clone(), range.clone())?;
            }
        }
        tracing::info!("loaded {} reference ranges", catalogue.len());
        Ok(service)
    }

    fn read(&self) -> EhrResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| EhrError::StoreUnavailable)
    }

    fn write(&self) -> EhrResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| EhrError::StoreUnavailable)
    }

    pub fn counts(&self) -> EhrResult<StoreCounts> {
        let t = self.read()?;
        Ok(StoreCounts {
            patients: t.patients.len(),
            compositions: t.compositions.len(),
            specimens: t.specimens.len(),
            lab_tests: t.lab_tests.len(),
            lab_analytes: t.lab_analytes.len(),
            reference_ranges: t.reference_ranges.len(),
            body_measurements: t.body_measurements.len(),
            cbc_panels: t.cbc_panels.len(),
            blood_type_panels: t.blood_type_panels.len(),
        })
    }

    // ------------------------------------------------------------------------
    // Patients
    // ------------------------------------------------------------------------

    pub fn list_patients(&self) -> EhrResult<Vec<Record<Patient>>> {
        Ok(self.read()?.patients.records())
    }

    pub fn get_patient(&self, id: RecordId) -> EhrResult<Record<Patient>> {
        self.read()?.patients.record(id)
    }

    pub fn create_patient(&self, patient: Patient) -> EhrResult<Record<Patient>> {
        patient.validate()?;
        let record = self.write()?.patients.create(patient);
        tracing::info!("created patient {}", record.id);
        Ok(record)
    }

    pub fn update_patient(&self, id: RecordId, patient: Patient) -> EhrResult<Record<Patient>> {
        patient.validate()?;
        let row = self.write()?.patients.update(&id, patient)?;
        Ok(row.to_record(id))
    }

    pub fn delete_patient(&self, id: RecordId) -> EhrResult<()> {
        let mut t = self.write()?;
        t.patients.get(&id)?;
        refuse_if_used(Patient::KIND, id, Composition::KIND, || {
            t.compositions.find(|c| c.patient_id == id)
        })?;
        refuse_if_used(Patient::KIND, id, BodyMeasurement::KIND, || {
            t.body_measurements.find(|m| m.patient_id == id)
        })?;
        t.patients.remove(&id)?;
        tracing::info!("deleted patient {}", id);
        Ok(())
    }

    /// Archived revisions of a patient, oldest first.
    pub fn patient_history(&self, id: RecordId) -> EhrResult<Vec<Revision<RecordId, Patient>>> {
        let t = self.read()?;
        history_or_not_found(&t.patients, id)
    }

    // ------------------------------------------------------------------------
    // Compositions
    // ------------------------------------------------------------------------

    pub fn list_compositions(&self) -> EhrResult<Vec<Record<Composition>>> {
        Ok(self.read()?.compositions.records())
    }

    pub fn get_composition(&self, id: RecordId) -> EhrResult<Record<Composition>> {
        self.read()?.compositions.record(id)
    }

    pub fn create_composition(&self, composition: Composition) -> EhrResult<Record<Composition>> {
        composition.validate()?;
        let mut t = self.write()?;
        require(&t.patients, composition.patient_id)?;
        Ok(t.compositions.create(composition))
    }

    pub fn update_composition(
        &self,
        id: RecordId,
        composition: Composition,
    ) -> EhrResult<Record<Composition>> {
        composition.validate()?;
        let mut t = self.write()?;
        require(&t.patients, composition.patient_id)?;
        Ok(t.compositions.update(&id, composition)?.to_record(id))
    }

    pub fn delete_composition(&self, id: RecordId) -> EhrResult<()> {
        let mut t = self.write()?;
        t.compositions.get(&id)?;
        refuse_if_used(Composition::KIND, id, LabTest::KIND, || {
            t.lab_tests.find(|lt| lt.composition_id == id)
        })?;
        t.compositions.remove(&id)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Specimens
    // ------------------------------------------------------------------------

    pub fn list_specimens(&self) -> EhrResult<Vec<Record<Specimen>>> {
        Ok(self.read()?.specimens.records())
    }

    pub fn get_specimen(&self, id: RecordId) -> EhrResult<Record<Specimen>> {
        self.read()?.specimens.record(id)
    }

    pub fn create_specimen(&self, specimen: Specimen) -> EhrResult<Record<Specimen>> {
        specimen.validate()?;
        Ok(self.write()?.specimens.create(specimen))
    }

    pub fn update_specimen(&self, id: RecordId, specimen: Specimen) -> EhrResult<Record<Specimen>> {
        specimen.validate()?;
        Ok(self.write()?.specimens.update(&id, specimen)?.to_record(id))
    }

    pub fn delete_specimen(&self, id: RecordId) -> EhrResult<()> {
        let mut t = self.write()?;
        t.specimens.get(&id)?;
        refuse_if_used(Specimen::KIND, id, LabTest::KIND, || {
            t.lab_tests.find(|lt| lt.specimen_id == id)
        })?;
        t.specimens.remove(&id)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lab tests
    // ------------------------------------------------------------------------

    pub fn list_lab_tests(&self) -> EhrResult<Vec<Record<LabTest>>> {
        Ok(self.read()?.lab_tests.records())
    }

    pub fn get_lab_test(&self, id: RecordId) -> EhrResult<Record<LabTest>> {
        self.read()?.lab_tests.record(id)
    }

    pub fn create_lab_test(&self, lab_test: LabTest) -> EhrResult<Record<LabTest>> {
        lab_test.validate()?;
        let mut t = self.write()?;
        require(&t.compositions, lab_test.composition_id)?;
        require(&t.specimens, lab_test.specimen_id)?;
        Ok(t.lab_tests.create(lab_test))
    }

    pub fn update_lab_test(&self, id: RecordId, lab_test: LabTest) -> EhrResult<Record<LabTest>> {
        lab_test.validate()?;
        let mut t = self.write()?;
        require(&t.compositions, lab_test.composition_id)?;
        require(&t.specimens, lab_test.specimen_id)?;
        Ok(t.lab_tests.update(&id, lab_test)?.to_record(id))
    }

    pub fn delete_lab_test(&self, id: RecordId) -> EhrResult<()> {
        let mut t = self.write()?;
        t.lab_tests.get(&id)?;
        refuse_if_used(LabTest::KIND, id, LabAnalyteResult::KIND, || {
            t.lab_analytes.find(|a| a.lab_test_id == id)
        })?;
        refuse_if_used(LabTest::KIND, id, CbcPanel::KIND, || {
            t.cbc_panels.find(|p| p.lab_test_id == id)
        })?;
        refuse_if_used(LabTest::KIND, id, BloodTypePanel::KIND, || {
            t.blood_type_panels.find(|p| p.lab_test_id == id)
        })?;
        t.lab_tests.remove(&id)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Lab analyte results
    // ------------------------------------------------------------------------

    pub fn list_lab_analytes(&self) -> EhrResult<Vec<Record<LabAnalyteResult>>> {
        Ok(self.read()?.lab_analytes.records())
    }

    pub fn get_lab_analyte(&self, id: RecordId) -> EhrResult<Record<LabAnalyteResult>> {
        self.read()?.lab_analytes.record(id)
    }

    pub fn create_lab_analyte(
        &self,
        analyte: LabAnalyteResult,
    ) -> EhrResult<Record<LabAnalyteResult>> {
        let mut t = self.write()?;
        let analyte = t.prepare_analyte(analyte)?;
        let record = t.lab_analytes.create(analyte);
        tracing::info!(
            "created lab analyte result {} ({} = {} {})",
            record.id,
            record.data.loinc_code,
            record.data.value,
            record.data.unit
        );
        Ok(record)
    }

    pub fn update_lab_analyte(
        &self,
        id: RecordId,
        analyte: LabAnalyteResult,
    ) -> EhrResult<Record<LabAnalyteResult>> {
        let mut t = self.write()?;
        t.lab_analytes.get(&id)?;
        let analyte = t.prepare_analyte(analyte)?;
        Ok(t.lab_analytes.update(&id, analyte)?.to_record(id))
    }

    pub fn delete_lab_analyte(&self, id: RecordId) -> EhrResult<()> {
        let mut t = self.write()?;
        t.lab_analytes.get(&id)?;
        refuse_if_used(LabAnalyteResult::KIND, id, CbcPanel::KIND, || {
            t.cbc_panels.find(|p| p.analyte_ids().any(|a| a == id))
        })?;
        refuse_if_used(LabAnalyteResult::KIND, id, BloodTypePanel::KIND, || {
            t.blood_type_panels.find(|p| p.analyte_ids().any(|a| a == id))
        })?;
        t.lab_analytes.remove(&id)?;
        Ok(())
    }

    pub fn lab_analyte_history(
        &self,
        id: RecordId,
    ) -> EhrResult<Vec<Revision<RecordId, LabAnalyteResult>>> {
        let t = self.read()?;
        history_or_not_found(&t.lab_analytes, id)
    }

    // ------------------------------------------------------------------------
    // Reference ranges
    // ------------------------------------------------------------------------

    pub fn list_reference_ranges(&self) -> EhrResult<Vec<Versioned<ReferenceRange>>> {
        Ok(self
            .read()?
            .reference_ranges
            .iter()
            .map(|(_, row)| row.to_versioned())
            .collect())
    }

    pub fn get_reference_range(&self, code: &LoincCode) -> EhrResult<Versioned<ReferenceRange>> {
        Ok(self.read()?.reference_ranges.get(code)?.to_versioned())
    }

    pub fn create_reference_range(
        &self,
        range: ReferenceRange,
    ) -> EhrResult<Versioned<ReferenceRange>> {
        range.validate()?;
        let row = self
            .write()?
            .reference_ranges
            .insert(range.loinc_code.clone(), range)?;
        Ok(row.to_versioned())
    }

    /// Replace the bounds of a stored range.
    ///
    /// Existing analyte results keep the bounds they were reported with.
    pub fn update_reference_range(
        &self,
        code: &LoincCode,
        update: ReferenceRangeUpdate,
    ) -> EhrResult<Versioned<ReferenceRange>> {
        let range = update.into_range(code.clone());
        range.validate()?;
        Ok(self
            .write()?
            .reference_ranges
            .update(code, range)?
            .to_versioned())
    }

    pub fn delete_reference_range(&self, code: &LoincCode) -> EhrResult<()> {
        self.write()?.reference_ranges.remove(code)?;
        Ok(())
    }

    /// Interpret a value against explicit bounds or the stored range for `loinc_code`.
    ///
    /// Explicit bounds win when either side is given. Otherwise the range stored for
    /// `loinc_code` is used; without a code the value is interpreted as unbounded.
    ///
    /// # Errors
    ///
    /// - `EhrError::Interpretation` for a non-finite value,
    /// - `EhrError::InvalidInput` for inverted explicit bounds,
    /// - `EhrError::NotFound` when a code is given, no bounds are, and no range is stored.
    pub fn interpret(
        &self,
        value: f64,
        loinc_code: Option<&LoincCode>,
        explicit: ReferenceBounds,
    ) -> EhrResult<InterpretationOutcome> {
        crate::validation::validate_bounds(explicit.low, explicit.high)?;

        let bounds = match loinc_code {
            Some(code) if explicit.is_unbounded() => {
                self.read()?.reference_ranges.get(code)?.data.bounds()
            }
            _ => explicit,
        };

        Ok(InterpretationOutcome {
            interpretation: bounds.try_interpret(value)?,
            bounds,
        })
    }

    // ------------------------------------------------------------------------
    // Body measurements
    // ------------------------------------------------------------------------

    pub fn list_body_measurements(&self) -> EhrResult<Vec<Record<BodyMeasurement>>> {
        Ok(self.read()?.body_measurements.records())
    }

    pub fn get_body_measurement(&self, id: RecordId) -> EhrResult<Record<BodyMeasurement>> {
        self.read()?.body_measurements.record(id)
    }

    pub fn create_body_measurement(
        &self,
        measurement: BodyMeasurement,
    ) -> EhrResult<Record<BodyMeasurement>> {
        measurement.validate()?;
        let mut t = self.write()?;
        require(&t.patients, measurement.patient_id)?;
        Ok(t.body_measurements.create(measurement))
    }

    /// Partial update: fields absent from `update` keep their stored values.
    pub fn update_body_measurement(
        &self,
        id: RecordId,
        update: BodyMeasurementUpdate,
    ) -> EhrResult<Record<BodyMeasurement>> {
        let mut t = self.write()?;
        let measurement = update.apply_to(&t.body_measurements.get(&id)?.data);
        measurement.validate()?;
        require(&t.patients, measurement.patient_id)?;
        Ok(t.body_measurements.update(&id, measurement)?.to_record(id))
    }

    pub fn delete_body_measurement(&self, id: RecordId) -> EhrResult<()> {
        self.write()?.body_measurements.remove(&id)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------------

    pub fn list_cbc_panels(&self) -> EhrResult<Vec<Record<CbcPanel>>> {
        Ok(self.read()?.cbc_panels.records())
    }

    pub fn get_cbc_panel(&self, id: RecordId) -> EhrResult<Record<CbcPanel>> {
        self.read()?.cbc_panels.record(id)
    }

    pub fn create_cbc_panel(&self, panel: CbcPanel) -> EhrResult<Record<CbcPanel>> {
        let mut t = self.write()?;
        t.check_panel(panel.lab_test_id, panel.analyte_ids())?;
        Ok(t.cbc_panels.create(panel))
    }

    pub fn update_cbc_panel(&self, id: RecordId, panel: CbcPanel) -> EhrResult<Record<CbcPanel>> {
        let mut t = self.write()?;
        t.check_panel(panel.lab_test_id, panel.analyte_ids())?;
        Ok(t.cbc_panels.update(&id, panel)?.to_record(id))
    }

    pub fn delete_cbc_panel(&self, id: RecordId) -> EhrResult<()> {
        self.write()?.cbc_panels.remove(&id)?;
        Ok(())
    }

    pub fn list_blood_type_panels(&self) -> EhrResult<Vec<Record<BloodTypePanel>>> {
        Ok(self.read()?.blood_type_panels.records())
    }

    pub fn get_blood_type_panel(&self, id: RecordId) -> EhrResult<Record<BloodTypePanel>> {
        self.read()?.blood_type_panels.record(id)
    }

    pub fn create_blood_type_panel(
        &self,
        panel: BloodTypePanel,
    ) -> EhrResult<Record<BloodTypePanel>> {
        let mut t = self.write()?;
        t.check_panel(panel.lab_test_id, panel.analyte_ids())?;
        Ok(t.blood_type_panels.create(panel))
    }

    pub fn update_blood_type_panel(
        &self,
        id: RecordId,
        panel: BloodTypePanel,
    ) -> EhrResult<Record<BloodTypePanel>> {
        let mut t = self.write()?;
        t.check_panel(panel.lab_test_id, panel.analyte_ids())?;
        Ok(t.blood_type_panels.update(&id, panel)?.to_record(id))
    }

    pub fn delete_blood_type_panel(&self, id: RecordId) -> EhrResult<()> {
        self.write()?.blood_type_panels.remove(&id)?;
        Ok(())
    }
}

impl Tables {
    /// Validate an analyte, fill in missing bounds from the stored reference range, and
    /// compute its interpretation if none was supplied.
    fn prepare_analyte(&self, mut analyte: LabAnalyteResult) -> EhrResult<LabAnalyteResult> {
        analyte.validate()?;
        require(&self.lab_tests, analyte.lab_test_id)?;

        if !analyte.has_bounds() {
            if let Ok(row) = self.reference_ranges.get(&analyte.loinc_code) {
                analyte.reference_low = row.data.low;
                analyte.reference_high = row.data.high;
                tracing::debug!(
                    "applied reference range for {} to analyte result",
                    analyte.loinc_code
                );
            }
        }

        let computed = analyte.bounds().try_interpret(analyte.value)?;
        match &analyte.interpretation {
            Some(ResultFlag::Interpretation(given)) if *given != computed => {
                tracing::warn!(
                    "analyte {} value {} recorded as {} but reference range gives {}",
                    analyte.loinc_code,
                    analyte.value,
                    given,
                    computed
                );
            }
            // Coded flags describe qualitative results and are stored as given.
            Some(_) => {}
            None => {}
        }
        if analyte.interpretation.is_none() {
            analyte.interpretation = Some(ResultFlag::Interpretation(computed));
        }
        Ok(analyte)
    }

    /// A panel's lab test must exist, and every linked analyte must exist and belong to it.
    fn check_panel(
        &self,
        lab_test_id: RecordId,
        analyte_ids: impl Iterator<Item = RecordId>,
    ) -> EhrResult<()> {
        require(&self.lab_tests, lab_test_id)?;
        for analyte_id in analyte_ids {
            let analyte = &self
                .lab_analytes
                .get(&analyte_id)
                .map_err(|_| EhrError::unknown_reference(LabAnalyteResult::KIND, analyte_id))?
                .data;
            if analyte.lab_test_id != lab_test_id {
                return Err(EhrError::InvalidInput(format!(
                    "lab analyte result {analyte_id} belongs to lab test {}, not {lab_test_id}",
                    analyte.lab_test_id
                )));
            }
        }
        Ok(())
    }
}

fn require<T: Resource>(collection: &Collection<RecordId, T>, id: RecordId) -> EhrResult<()> {
    if collection.contains(&id) {
        Ok(())
    } else {
        Err(EhrError::unknown_reference(T::KIND, id))
    }
}

fn refuse_if_used(
    kind: &'static str,
    id: RecordId,
    referenced_by: &'static str,
    lookup: impl FnOnce() -> Option<RecordId>,
) -> EhrResult<()> {
    match lookup() {
        Some(by) => {
            tracing::warn!("refusing to delete {kind} {id}: referenced by {referenced_by} {by}");
            Err(EhrError::InUse {
                kind,
                key: id.to_string(),
                referenced_by,
            })
        }
        None => Ok(()),
    }
}

fn history_or_not_found<T: Resource>(
    collection: &Collection<RecordId, T>,
    id: RecordId,
) -> EhrResult<Vec<Revision<RecordId, T>>> {
    if !collection.contains(&id) && !collection.has_history(&id) {
        return Err(EhrError::not_found(T::KIND, id));
    }
    Ok(collection.history(&id))
}
