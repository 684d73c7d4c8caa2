//! Sample clinical data.
//!
//! Five patients with lab work and vital signs, loaded into an empty store so the front end
//! has something to show. Quantitative results carry no bounds or interpretation here: the
//! service fills both in from the reference range collection, so the flags always agree with
//! the ranges in force. Blood group results carry their coded flag (`A`, `POS`).

use crate::form::parse_datetime_input;
use crate::interpretation::ResultFlag;
use crate::resources::{
    BloodTypePanel, BodyMeasurement, CbcPanel, Composition, LabAnalyteResult, LabTest, Patient,
    RecordId, Sex, Specimen,
};
use crate::service::ClinicalService;
use crate::EhrResult;
use ehr_types::{LoincCode, NonEmptyText, SnomedCode};
use serde::Serialize;
use std::collections::HashMap;

/// SNOMED CT code for a venous blood specimen.
const VENOUS_BLOOD: &str = "122555007";

const HEIGHT: &str = "50373000";
const WEIGHT: &str = "27113001";
const SYSTOLIC_BP: &str = "271649006";
const DIASTOLIC_BP: &str = "271650006";
const BODY_TEMPERATURE: &str = "386725007";

/// How many records of each kind [`populate`] created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub patients: usize,
    pub compositions: usize,
    pub specimens: usize,
    pub lab_tests: usize,
    pub lab_analytes: usize,
    pub panels: usize,
    pub body_measurements: usize,
}

#[derive(Clone, Copy)]
enum PanelKind {
    Cbc,
    BloodType,
}

struct SampleAnalyte {
    loinc: &'static str,
    value: f64,
    unit: &'static str,
    coded: Option<&'static str>,
}

const fn analyte(loinc: &'static str, value: f64, unit: &'static str) -> SampleAnalyte {
    SampleAnalyte {
        loinc,
        value,
        unit,
        coded: None,
    }
}

const fn coded(loinc: &'static str, value: f64, flag: &'static str) -> SampleAnalyte {
    SampleAnalyte {
        loinc,
        value,
        unit: "",
        coded: Some(flag),
    }
}

struct SampleTest {
    loinc: &'static str,
    description: &'static str,
    panel: Option<PanelKind>,
    analytes: &'static [SampleAnalyte],
}

struct SampleEncounter {
    start: &'static str,
    collected: &'static str,
    specimen_note: &'static str,
    tests: &'static [SampleTest],
}

struct SampleMeasurement {
    time: &'static str,
    value: f64,
    unit: &'static str,
    snomed: &'static str,
}

const fn measure(
    time: &'static str,
    value: f64,
    unit: &'static str,
    snomed: &'static str,
) -> SampleMeasurement {
    SampleMeasurement {
        time,
        value,
        unit,
        snomed,
    }
}

struct SamplePatient {
    first_name: &'static str,
    last_name: &'static str,
    sex: Sex,
    identifier: &'static str,
    encounters: &'static [SampleEncounter],
    measurements: &'static [SampleMeasurement],
}

const CBC: &str = "57021-8";
const METABOLIC: &str = "51990-0";

const SAMPLE: &[SamplePatient] = &[
    SamplePatient {
        first_name: "John",
        last_name: "Doe",
        sex: Sex::Male,
        identifier: "PAT-001",
        encounters: &[SampleEncounter {
            start: "2025-04-28T08:00:00Z",
            collected: "2025-04-27T07:45:00Z",
            specimen_note: "Venous blood specimen",
            tests: &[SampleTest {
                loinc: CBC,
                description: "Complete Blood Count (CBC)",
                panel: Some(PanelKind::Cbc),
                analytes: &[
                    analyte("718-7", 14.2, "g/dL"),
                    analyte("6690-2", 7.1, "10^9/L"),
                    analyte("777-3", 225.0, "10^9/L"),
                    analyte("789-8", 5.0, "10^12/L"),
                    analyte("4544-3", 42.0, "%"),
                ],
            }],
        }],
        measurements: &[
            measure("2025-04-27T08:00:00Z", 180.0, "cm", HEIGHT),
            measure("2025-04-27T08:00:00Z", 78.0, "kg", WEIGHT),
            measure("2025-04-27T08:10:00Z", 120.0, "mmHg", SYSTOLIC_BP),
            measure("2025-04-27T08:10:00Z", 80.0, "mmHg", DIASTOLIC_BP),
        ],
    },
    SamplePatient {
        first_name: "Jane",
        last_name: "Smith",
        sex: Sex::Female,
        identifier: "PAT-002",
        encounters: &[SampleEncounter {
            start: "2025-04-26T09:30:00Z",
            collected: "2025-04-26T09:15:00Z",
            specimen_note: "Blood sample taken after 12 hour fast",
            tests: &[
                SampleTest {
                    loinc: "24331-1",
                    description: "Lipid Panel",
                    panel: None,
                    analytes: &[
                        analyte("2093-3", 5.8, "mmol/L"),
                        analyte("2571-8", 1.4, "mmol/L"),
                        analyte("2085-9", 1.8, "mmol/L"),
                        analyte("18262-6", 3.6, "mmol/L"),
                    ],
                },
                SampleTest {
                    loinc: METABOLIC,
                    description: "Basic Metabolic Panel",
                    panel: None,
                    analytes: &[
                        analyte("2345-7", 5.1, "mmol/L"),
                        analyte("2823-3", 4.2, "mmol/L"),
                        analyte("2951-2", 140.0, "mmol/L"),
                        analyte("2075-0", 70.0, "µmol/L"),
                    ],
                },
            ],
        }],
        measurements: &[
            measure("2025-04-26T09:30:00Z", 165.0, "cm", HEIGHT),
            measure("2025-04-26T09:30:00Z", 62.0, "kg", WEIGHT),
            measure("2025-04-26T09:40:00Z", 118.0, "mmHg", SYSTOLIC_BP),
            measure("2025-04-26T09:40:00Z", 75.0, "mmHg", DIASTOLIC_BP),
        ],
    },
    SamplePatient {
        first_name: "Michael",
        last_name: "Johnson",
        sex: Sex::Male,
        identifier: "PAT-003",
        encounters: &[SampleEncounter {
            start: "2025-04-30T11:00:00Z",
            collected: "2025-04-30T10:45:00Z",
            specimen_note: "Venous blood specimen",
            tests: &[
                SampleTest {
                    loinc: "10751-6",
                    description: "Liver Function Panel",
                    panel: None,
                    analytes: &[
                        analyte("1920-8", 1.4, "mg/dL"),
                        analyte("6768-6", 45.0, "U/L"),
                        analyte("1975-2", 1.3, "mg/dL"),
                    ],
                },
                SampleTest {
                    loinc: CBC,
                    description: "Complete Blood Count (CBC)",
                    panel: Some(PanelKind::Cbc),
                    analytes: &[
                        analyte("718-7", 15.1, "g/dL"),
                        analyte("6690-2", 8.2, "10^9/L"),
                        analyte("777-3", 275.0, "10^9/L"),
                    ],
                },
            ],
        }],
        measurements: &[
            measure("2025-04-30T11:00:00Z", 188.0, "cm", HEIGHT),
            measure("2025-04-30T11:00:00Z", 92.0, "kg", WEIGHT),
        ],
    },
    SamplePatient {
        first_name: "Sarah",
        last_name: "Williams",
        sex: Sex::Female,
        identifier: "PAT-004",
        encounters: &[SampleEncounter {
            start: "2025-05-02T14:15:00Z",
            collected: "2025-05-02T14:00:00Z",
            specimen_note: "Venous blood specimen",
            tests: &[
                SampleTest {
                    loinc: "934-0",
                    description: "Blood Type Panel",
                    panel: Some(PanelKind::BloodType),
                    // Coded values: ABO 0 = A, Rh 1 = positive.
                    analytes: &[coded("882-1", 0.0, "A"), coded("10331-7", 1.0, "POS")],
                },
                SampleTest {
                    loinc: CBC,
                    description: "Complete Blood Count (CBC)",
                    panel: Some(PanelKind::Cbc),
                    analytes: &[
                        analyte("718-7", 11.8, "g/dL"),
                        analyte("6690-2", 6.2, "10^9/L"),
                        analyte("777-3", 310.0, "10^9/L"),
                        analyte("789-8", 4.0, "10^12/L"),
                    ],
                },
            ],
        }],
        measurements: &[
            measure("2025-05-02T14:15:00Z", 170.0, "cm", HEIGHT),
            measure("2025-05-02T14:15:00Z", 65.0, "kg", WEIGHT),
            measure("2025-05-02T14:20:00Z", 37.2, "C", BODY_TEMPERATURE),
        ],
    },
    SamplePatient {
        first_name: "Robert",
        last_name: "Brown",
        sex: Sex::Male,
        identifier: "PAT-005",
        encounters: &[
            SampleEncounter {
                start: "2025-02-10T09:30:00Z",
                collected: "2025-02-10T09:15:00Z",
                specimen_note: "Venous blood specimen",
                tests: &[SampleTest {
                    loinc: "2339-0",
                    description: "Glucose test",
                    panel: None,
                    analytes: &[analyte("2345-7", 8.2, "mmol/L")],
                }],
            },
            SampleEncounter {
                start: "2025-04-15T10:00:00Z",
                collected: "2025-04-15T09:45:00Z",
                specimen_note: "Venous blood specimen",
                tests: &[SampleTest {
                    loinc: "2339-0",
                    description: "Glucose test",
                    panel: None,
                    analytes: &[analyte("2345-7", 7.1, "mmol/L")],
                }],
            },
            SampleEncounter {
                start: "2025-05-03T09:45:00Z",
                collected: "2025-05-03T09:30:00Z",
                specimen_note: "Venous blood specimen after 8h fast",
                tests: &[SampleTest {
                    loinc: METABOLIC,
                    description: "Basic Metabolic Panel",
                    panel: None,
                    analytes: &[
                        analyte("2345-7", 6.5, "mmol/L"),
                        analyte("2823-3", 4.1, "mmol/L"),
                        analyte("2951-2", 138.0, "mmol/L"),
                        analyte("2075-0", 88.0, "µmol/L"),
                    ],
                }],
            },
        ],
        measurements: &[
            measure("2025-02-10T09:30:00Z", 175.0, "cm", HEIGHT),
            measure("2025-02-10T09:30:00Z", 95.0, "kg", WEIGHT),
            measure("2025-04-15T10:00:00Z", 175.0, "cm", HEIGHT),
            measure("2025-04-15T10:00:00Z", 93.0, "kg", WEIGHT),
            measure("2025-05-03T09:45:00Z", 175.0, "cm", HEIGHT),
            measure("2025-05-03T09:45:00Z", 90.0, "kg", WEIGHT),
            measure("2025-05-03T09:50:00Z", 135.0, "mmHg", SYSTOLIC_BP),
            measure("2025-05-03T09:50:00Z", 85.0, "mmHg", DIASTOLIC_BP),
        ],
    },
];

/// Load the sample data set if the store holds no patients.
///
/// Returns `None` without touching the store when patients already exist.
///
/// # Errors
///
/// Propagates any service error; the store may then hold part of the sample.
pub fn populate(service: &ClinicalService) -> EhrResult<Option<SeedSummary>> {
    if service.counts()?.patients > 0 {
        tracing::debug!("store already holds patients; skipping sample data");
        return Ok(None);
    }

    let mut summary = SeedSummary::default();
    for sample in SAMPLE {
        let patient_id = service
            .create_patient(Patient {
                first_name: NonEmptyText::new(sample.first_name)?,
                last_name: NonEmptyText::new(sample.last_name)?,
                sex: sample.sex,
                identifier: Some(sample.identifier.to_string()),
            })?
            .id;
        summary.patients += 1;

        for encounter in sample.encounters {
            populate_encounter(service, patient_id, encounter, &mut summary)?;
        }

        for m in sample.measurements {
            service.create_body_measurement(BodyMeasurement {
                patient_id,
                record_time: parse_datetime_input(m.time)?,
                value: m.value,
                unit: NonEmptyText::new(m.unit)?,
                snomed_code: SnomedCode::parse(m.snomed)?,
            })?;
            summary.body_measurements += 1;
        }
    }

    tracing::info!(
        "loaded sample data: {} patients, {} lab tests, {} analyte results",
        summary.patients,
        summary.lab_tests,
        summary.lab_analytes
    );
    Ok(Some(summary))
}

fn populate_encounter(
    service: &ClinicalService,
    patient_id: RecordId,
    encounter: &SampleEncounter,
    summary: &mut SeedSummary,
) -> EhrResult<()> {
    let composition_id = service
        .create_composition(Composition {
            patient_id,
            start_time: parse_datetime_input(encounter.start)?,
        })?
        .id;
    summary.compositions += 1;

    let specimen_id = service
        .create_specimen(Specimen {
            specimen_type: NonEmptyText::new("Venous blood")?,
            collection_time: parse_datetime_input(encounter.collected)?,
            snomed_code: Some(SnomedCode::parse(VENOUS_BLOOD)?),
            description: Some(encounter.specimen_note.to_string()),
        })?
        .id;
    summary.specimens += 1;

    for test in encounter.tests {
        let lab_test_id = service
            .create_lab_test(LabTest {
                composition_id,
                specimen_id,
                loinc_code: Some(LoincCode::parse(test.loinc)?),
                description: Some(test.description.to_string()),
            })?
            .id;
        summary.lab_tests += 1;

        let mut by_code = HashMap::new();
        for a in test.analytes {
            let id = service
                .create_lab_analyte(LabAnalyteResult {
                    lab_test_id,
                    loinc_code: LoincCode::parse(a.loinc)?,
                    value: a.value,
                    unit: a.unit.to_string(),
                    reference_low: None,
                    reference_high: None,
                    interpretation: a.coded.map(str::parse::<ResultFlag>).transpose()?,
                })?
                .id;
            by_code.insert(a.loinc, id);
            summary.lab_analytes += 1;
        }

        match test.panel {
            Some(PanelKind::Cbc) => {
                service.create_cbc_panel(CbcPanel {
                    lab_test_id,
                    hemoglobin_id: by_code.get("718-7").copied(),
                    white_cell_id: by_code.get("6690-2").copied(),
                    platelet_id: by_code.get("777-3").copied(),
                })?;
                summary.panels += 1;
            }
            Some(PanelKind::BloodType) => {
                service.create_blood_type_panel(BloodTypePanel {
                    lab_test_id,
                    abo_id: by_code.get("882-1").copied(),
                    rh_id: by_code.get("10331-7").copied(),
                })?;
                summary.panels += 1;
            }
            None => {}
        }
    }
    Ok(())
}
