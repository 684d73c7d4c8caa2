//! CRUD routes for the clinical resources.
//!
//! Every integer-keyed resource exposes the same five routes under its path segment:
//! `/{r}/all`, `/{r}/{id}`, `/{r}/create`, `/{r}/update/{id}` and `/{r}/delete/{id}`.
//! Reference ranges use the same shape keyed by LOINC code.

use crate::error::{ApiError, JsonBody};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use ehr_core::resources::{
    BloodTypePanel, BodyMeasurement, BodyMeasurementUpdate, CbcPanel, Composition,
    LabAnalyteResult, LabTest, Patient, Record, RecordId, ReferenceRange, ReferenceRangeUpdate,
    Resource, Specimen, Versioned,
};
use ehr_core::store::Revision;
use ehr_core::LoincCode;
use serde::Serialize;
use utoipa::ToSchema;

/// Message returned by delete routes.
#[derive(Debug, Serialize, serde::Deserialize, ToSchema)]
pub struct DeleteRes {
    pub message: String,
}

/// Generate the documented CRUD handlers and routes of one integer-keyed resource.
///
/// Each invocation expands to a module holding `routes()` plus one `#[utoipa::path]` handler
/// per route, so every resource appears in the OpenAPI document under its own tag.
macro_rules! resource_routes {
    (
        $module:ident, $ty:ident, $update:ident, $base:literal,
        $list:ident, $get:ident, $create:ident, $upd:ident, $del:ident $(,)?
    ) => {
        pub(crate) mod $module {
            use super::*;

            pub(crate) fn routes() -> Router<AppState> {
                Router::new()
                    .route(concat!("/", $base, "/all"), get(list))
                    .route(concat!("/", $base, "/create"), post(create))
                    .route(concat!("/", $base, "/:id"), get(fetch))
                    .route(concat!("/", $base, "/update/:id"), put(update))
                    .route(concat!("/", $base, "/delete/:id"), delete(remove))
            }

            #[utoipa::path(
                get,
                path = concat!("/", $base, "/all"),
                tag = $base,
                operation_id = concat!("list_", $base),
                responses(
                    (status = 200, description = "All live records", body = [$ty])
                )
            )]
            #[axum::debug_handler]
            pub(crate) async fn list(
                State(state): State<AppState>,
            ) -> Result<Json<Vec<Record<$ty>>>, ApiError> {
                Ok(Json(state.service.$list()?))
            }

            #[utoipa::path(
                get,
                path = concat!("/", $base, "/{id}"),
                tag = $base,
                operation_id = concat!("get_", $base),
                params(("id" = i64, Path, description = "Record id")),
                responses(
                    (status = 200, description = "Live record", body = $ty),
                    (status = 404, description = "No live record with this id")
                )
            )]
            #[axum::debug_handler]
            pub(crate) async fn fetch(
                State(state): State<AppState>,
                Path(id): Path<i64>,
            ) -> Result<Json<Record<$ty>>, ApiError> {
                Ok(Json(state.service.$get(id)?))
            }

            #[utoipa::path(
                post,
                path = concat!("/", $base, "/create"),
                tag = $base,
                operation_id = concat!("create_", $base),
                request_body = $ty,
                responses(
                    (status = 201, description = "Record created at version 1", body = $ty),
                    (status = 400, description = "Bad request"),
                    (status = 422, description = "Referenced record does not exist")
                )
            )]
            #[axum::debug_handler]
            pub(crate) async fn create(
                State(state): State<AppState>,
                JsonBody(data): JsonBody<$ty>,
            ) -> Result<(StatusCode, Json<Record<$ty>>), ApiError> {
                let record = state.service.$create(data)?;
                Ok((StatusCode::CREATED, Json(record)))
            }

            #[utoipa::path(
                put,
                path = concat!("/", $base, "/update/{id}"),
                tag = $base,
                operation_id = concat!("update_", $base),
                params(("id" = i64, Path, description = "Record id")),
                request_body = $update,
                responses(
                    (status = 200, description = "Record updated, version bumped", body = $ty),
                    (status = 400, description = "Bad request"),
                    (status = 404, description = "No live record with this id"),
                    (status = 422, description = "Referenced record does not exist")
                )
            )]
            #[axum::debug_handler]
            pub(crate) async fn update(
                State(state): State<AppState>,
                Path(id): Path<i64>,
                JsonBody(data): JsonBody<$update>,
            ) -> Result<Json<Record<$ty>>, ApiError> {
                Ok(Json(state.service.$upd(id, data)?))
            }

            #[utoipa::path(
                delete,
                path = concat!("/", $base, "/delete/{id}"),
                tag = $base,
                operation_id = concat!("delete_", $base),
                params(("id" = i64, Path, description = "Record id")),
                responses(
                    (status = 200, description = "Record deleted", body = DeleteRes),
                    (status = 404, description = "No live record with this id"),
                    (status = 409, description = "Record is still referenced")
                )
            )]
            #[axum::debug_handler]
            pub(crate) async fn remove(
                State(state): State<AppState>,
                Path(id): Path<i64>,
            ) -> Result<Json<DeleteRes>, ApiError> {
                state.service.$del(id)?;
                Ok(Json(DeleteRes {
                    message: format!("{} {id} deleted", <$ty as Resource>::KIND),
                }))
            }
        }
    };
}

resource_routes!(
    patient,
    Patient,
    Patient,
    "patient",
    list_patients,
    get_patient,
    create_patient,
    update_patient,
    delete_patient,
);
resource_routes!(
    composition,
    Composition,
    Composition,
    "composition",
    list_compositions,
    get_composition,
    create_composition,
    update_composition,
    delete_composition,
);
resource_routes!(
    specimen,
    Specimen,
    Specimen,
    "specimen",
    list_specimens,
    get_specimen,
    create_specimen,
    update_specimen,
    delete_specimen,
);
resource_routes!(
    lab_test,
    LabTest,
    LabTest,
    "lab_test",
    list_lab_tests,
    get_lab_test,
    create_lab_test,
    update_lab_test,
    delete_lab_test,
);
resource_routes!(
    lab_analyte,
    LabAnalyteResult,
    LabAnalyteResult,
    "lab_analyte",
    list_lab_analytes,
    get_lab_analyte,
    create_lab_analyte,
    update_lab_analyte,
    delete_lab_analyte,
);
resource_routes!(
    body_measurement,
    BodyMeasurement,
    BodyMeasurementUpdate,
    "body_measurement",
    list_body_measurements,
    get_body_measurement,
    create_body_measurement,
    update_body_measurement,
    delete_body_measurement,
);
resource_routes!(
    cbc_panel,
    CbcPanel,
    CbcPanel,
    "cbc_panel",
    list_cbc_panels,
    get_cbc_panel,
    create_cbc_panel,
    update_cbc_panel,
    delete_cbc_panel,
);
resource_routes!(
    blood_type_panel,
    BloodTypePanel,
    BloodTypePanel,
    "blood_type_panel",
    list_blood_type_panels,
    get_blood_type_panel,
    create_blood_type_panel,
    update_blood_type_panel,
    delete_blood_type_panel,
);

/// Routes of every integer-keyed resource plus the history routes.
pub(crate) fn crud_routes() -> Router<AppState> {
    Router::new()
        .merge(patient::routes())
        .merge(composition::routes())
        .merge(specimen::routes())
        .merge(lab_test::routes())
        .merge(lab_analyte::routes())
        .merge(body_measurement::routes())
        .merge(cbc_panel::routes())
        .merge(blood_type_panel::routes())
        .route("/patient/:id/history", get(patient_history))
        .route("/lab_analyte/:id/history", get(lab_analyte_history))
}

#[utoipa::path(
    get,
    path = "/patient/{id}/history",
    tag = "patient",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Archived revisions, oldest first", body = [Patient]),
        (status = 404, description = "Patient never existed")
    )
)]
#[axum::debug_handler]
pub(crate) async fn patient_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Revision<RecordId, Patient>>>, ApiError> {
    Ok(Json(state.service.patient_history(id)?))
}

#[utoipa::path(
    get,
    path = "/lab_analyte/{id}/history",
    tag = "lab_analyte",
    params(("id" = i64, Path, description = "Lab analyte result id")),
    responses(
        (
            status = 200,
            description = "Archived revisions, oldest first",
            body = [LabAnalyteResult]
        ),
        (status = 404, description = "Result never existed")
    )
)]
#[axum::debug_handler]
pub(crate) async fn lab_analyte_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Revision<RecordId, LabAnalyteResult>>>, ApiError> {
    Ok(Json(state.service.lab_analyte_history(id)?))
}

// ----------------------------------------------------------------------------
// Reference ranges (keyed by LOINC code)
// ----------------------------------------------------------------------------

pub(crate) fn reference_range_routes() -> Router<AppState> {
    Router::new()
        .route("/reference_range/all", get(list_reference_ranges))
        .route("/reference_range/create", post(create_reference_range))
        .route("/reference_range/:code", get(get_reference_range))
        .route("/reference_range/update/:code", put(update_reference_range))
        .route("/reference_range/delete/:code", delete(delete_reference_range))
}

fn loinc_from_path(code: &str) -> Result<LoincCode, ApiError> {
    LoincCode::parse(code).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[utoipa::path(
    get,
    path = "/reference_range/all",
    responses(
        (status = 200, description = "All reference ranges", body = [ReferenceRange])
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_reference_ranges(
    State(state): State<AppState>,
) -> Result<Json<Vec<Versioned<ReferenceRange>>>, ApiError> {
    Ok(Json(state.service.list_reference_ranges()?))
}

#[utoipa::path(
    get,
    path = "/reference_range/{code}",
    params(("code" = String, Path, description = "LOINC code")),
    responses(
        (status = 200, description = "Reference range", body = ReferenceRange),
        (status = 400, description = "Malformed LOINC code"),
        (status = 404, description = "No range for this code")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_reference_range(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Versioned<ReferenceRange>>, ApiError> {
    let code = loinc_from_path(&code)?;
    Ok(Json(state.service.get_reference_range(&code)?))
}

#[utoipa::path(
    post,
    path = "/reference_range/create",
    request_body = ReferenceRange,
    responses(
        (status = 201, description = "Reference range created", body = ReferenceRange),
        (status = 400, description = "Bad request"),
        (status = 409, description = "A range for this code already exists")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_reference_range(
    State(state): State<AppState>,
    JsonBody(range): JsonBody<ReferenceRange>,
) -> Result<(StatusCode, Json<Versioned<ReferenceRange>>), ApiError> {
    let created = state.service.create_reference_range(range)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/reference_range/update/{code}",
    params(("code" = String, Path, description = "LOINC code")),
    request_body = ReferenceRangeUpdate,
    responses(
        (status = 200, description = "Reference range updated", body = ReferenceRange),
        (status = 400, description = "Bad request"),
        (status = 404, description = "No range for this code")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_reference_range(
    State(state): State<AppState>,
    Path(code): Path<String>,
    JsonBody(update): JsonBody<ReferenceRangeUpdate>,
) -> Result<Json<Versioned<ReferenceRange>>, ApiError> {
    let code = loinc_from_path(&code)?;
    Ok(Json(state.service.update_reference_range(&code, update)?))
}

#[utoipa::path(
    delete,
    path = "/reference_range/delete/{code}",
    params(("code" = String, Path, description = "LOINC code")),
    responses(
        (status = 200, description = "Reference range deleted", body = DeleteRes),
        (status = 404, description = "No range for this code")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_reference_range(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<DeleteRes>, ApiError> {
    let code = loinc_from_path(&code)?;
    state.service.delete_reference_range(&code)?;
    Ok(Json(DeleteRes {
        message: format!("{} {code} deleted", ReferenceRange::KIND),
    }))
}
