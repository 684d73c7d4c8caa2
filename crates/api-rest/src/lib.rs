//! # API REST
//!
//! REST API for the EHR clinical data service.
//!
//! Handles:
//! - HTTP endpoints with axum for every clinical resource
//! - Lab value interpretation (`POST /interpret`)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Data operations live in `ehr-core`; this crate only maps them onto HTTP.

#![warn(rust_2018_idioms)]

pub mod error;
mod resources;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use ehr_core::resources::{
    BloodTypePanel, BodyMeasurement, BodyMeasurementUpdate, CbcPanel, Composition,
    LabAnalyteResult, LabTest, Patient, ReferenceRange, ReferenceRangeUpdate, Sex, Specimen,
};
use ehr_core::{ClinicalService, LoincCode, ReferenceBounds};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use error::{ApiError, JsonBody};
use resources::{crud_routes, DeleteRes};

pub use ehr_core;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: ClinicalService,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Interpretation request: explicit bounds, a LOINC code to look bounds up by, or both.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InterpretReq {
    pub value: f64,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "blank_string_as_none")]
    #[schema(example = "718-7")]
    pub loinc_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InterpretRes {
    /// `L`, `N` or `H`.
    pub interpretation: String,
    /// `Low`, `Normal` or `High`.
    pub label: String,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

fn blank_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        interpret,
        resources::patient::list,
        resources::patient::fetch,
        resources::patient::create,
        resources::patient::update,
        resources::patient::remove,
        resources::patient_history,
        resources::composition::list,
        resources::composition::fetch,
        resources::composition::create,
        resources::composition::update,
        resources::composition::remove,
        resources::specimen::list,
        resources::specimen::fetch,
        resources::specimen::create,
        resources::specimen::update,
        resources::specimen::remove,
        resources::lab_test::list,
        resources::lab_test::fetch,
        resources::lab_test::create,
        resources::lab_test::update,
        resources::lab_test::remove,
        resources::lab_analyte::list,
        resources::lab_analyte::fetch,
        resources::lab_analyte::create,
        resources::lab_analyte::update,
        resources::lab_analyte::remove,
        resources::lab_analyte_history,
        resources::body_measurement::list,
        resources::body_measurement::fetch,
        resources::body_measurement::create,
        resources::body_measurement::update,
        resources::body_measurement::remove,
        resources::cbc_panel::list,
        resources::cbc_panel::fetch,
        resources::cbc_panel::create,
        resources::cbc_panel::update,
        resources::cbc_panel::remove,
        resources::blood_type_panel::list,
        resources::blood_type_panel::fetch,
        resources::blood_type_panel::create,
        resources::blood_type_panel::update,
        resources::blood_type_panel::remove,
        resources::list_reference_ranges,
        resources::get_reference_range,
        resources::create_reference_range,
        resources::update_reference_range,
        resources::delete_reference_range,
    ),
    components(schemas(
        HealthRes,
        InterpretReq,
        InterpretRes,
        DeleteRes,
        Patient,
        Sex,
        Composition,
        Specimen,
        LabTest,
        LabAnalyteResult,
        ReferenceRange,
        ReferenceRangeUpdate,
        BodyMeasurement,
        BodyMeasurementUpdate,
        CbcPanel,
        BloodTypePanel,
    ))
)]
pub struct ApiDoc;

/// Build the full application router: resource routes, interpretation, health and Swagger UI.
pub fn router(service: ClinicalService) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route("/interpret", post(interpret))
        .merge(crud_routes())
        .merge(resources::reference_range_routes())
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "EHR REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/interpret",
    request_body = InterpretReq,
    responses(
        (status = 200, description = "Interpretation of the value", body = InterpretRes),
        (status = 400, description = "Malformed code, inverted bounds or non-finite value"),
        (status = 404, description = "No reference range stored for the LOINC code")
    )
)]
/// Classify a lab value as Low, Normal or High.
///
/// Explicit `low`/`high` win over the stored range for `loinc_code`. Bounds are inclusive.
#[axum::debug_handler]
async fn interpret(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<InterpretReq>,
) -> Result<Json<InterpretRes>, ApiError> {
    let code = req
        .loinc_code
        .as_deref()
        .map(LoincCode::parse)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outcome = state.service.interpret(
        req.value,
        code.as_ref(),
        ReferenceBounds::new(req.low, req.high),
    )?;

    Ok(Json(InterpretRes {
        interpretation: outcome.interpretation.code().to_string(),
        label: outcome.interpretation.label().to_string(),
        low: outcome.bounds.low,
        high: outcome.bounds.high,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use ehr_core::ReferenceRangeCatalogue;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let catalogue = ReferenceRangeCatalogue::bundled().expect("bundled catalogue");
        router(ClinicalService::with_catalogue(&catalogue).expect("service"))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn interpret_scenarios() {
        let app = app();
        let cases = [
            (json!({"value": 5}), "N"),
            (json!({"value": 3, "low": 4, "high": 10}), "L"),
            (json!({"value": 15, "low": 4, "high": 10}), "H"),
            (json!({"value": 4, "low": 4, "high": 10}), "N"),
            (json!({"value": 10, "low": 4, "high": 10}), "N"),
            (json!({"value": 7, "low": null, "high": 10}), "N"),
            (json!({"value": 12, "high": 10}), "H"),
            (json!({"value": 11.2, "loinc_code": "718-7"}), "L"),
        ];
        for (body, expected) in cases {
            let (status, res) = call(&app, Method::POST, "/interpret", Some(body.clone())).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(res["interpretation"], expected, "{body}");
        }

        let (_, res) = call(
            &app,
            Method::POST,
            "/interpret",
            Some(json!({"value": 11.2, "loinc_code": "718-7"})),
        )
        .await;
        assert_eq!(res["label"], "Low");
        assert_eq!(res["low"], 12.0);
        assert_eq!(res["high"], 17.5);
    }

    #[tokio::test]
    async fn interpret_errors() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/interpret",
            Some(json!({"value": 1, "loinc_code": "1234-5"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, _) = call(
            &app,
            Method::POST,
            "/interpret",
            Some(json!({"value": 1, "low": 5, "high": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/interpret",
            Some(json!({"value": 1, "loinc_code": "not-a-code"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, "/interpret", Some(json!({"low": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patient_crud_flow() {
        let app = app();
        let (status, created) = call(
            &app,
            Method::POST,
            "/patient/create",
            Some(json!({
                "first_name": "Jane",
                "last_name": "Smith",
                "sex": "female",
                "identifier": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["version"], 1);
        assert!(created["identifier"].is_null());

        let (status, list) = call(&app, Method::GET, "/patient/all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let (status, updated) = call(
            &app,
            Method::PUT,
            "/patient/update/1",
            Some(json!({"first_name": "Jane", "last_name": "Jones", "sex": "female"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["last_name"], "Jones");
        assert_eq!(updated["version"], 2);

        let (status, history) = call(&app, Method::GET, "/patient/1/history", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history[0]["last_name"], "Smith");

        let (status, body) = call(&app, Method::DELETE, "/patient/delete/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().is_some_and(|m| m.contains("deleted")));

        let (status, _) = call(&app, Method::GET, "/patient/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_payloads_are_bad_requests() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/patient/create",
            Some(json!({"first_name": "  ", "last_name": "Smith", "sex": "female"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn references_are_enforced() {
        let app = app();
        let (status, _) = call(
            &app,
            Method::POST,
            "/composition/create",
            Some(json!({"patient_id": 99, "start_time": "2025-04-28T08:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        call(
            &app,
            Method::POST,
            "/patient/create",
            Some(json!({"first_name": "John", "last_name": "Doe", "sex": "male"})),
        )
        .await;
        let (status, composition) = call(
            &app,
            Method::POST,
            "/composition/create",
            Some(json!({"patient_id": 1, "start_time": "2025-04-28T08:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(composition["start_time"], "2025-04-28T08:00:00Z");

        let (status, _) = call(&app, Method::DELETE, "/patient/delete/1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn analyte_is_interpreted_on_create() {
        let app = app();
        call(
            &app,
            Method::POST,
            "/patient/create",
            Some(json!({"first_name": "Sarah", "last_name": "Williams", "sex": "female"})),
        )
        .await;
        call(
            &app,
            Method::POST,
            "/composition/create",
            Some(json!({"patient_id": 1, "start_time": "2025-05-02T14:15"})),
        )
        .await;
        call(
            &app,
            Method::POST,
            "/specimen/create",
            Some(json!({"specimen_type": "Venous blood", "collection_time": "2025-05-02T14:00",
                        "snomed_code": "122555007"})),
        )
        .await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/lab_test/create",
            Some(json!({"composition_id": 1, "specimen_id": 1, "loinc_code": "57021-8"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, analyte) = call(
            &app,
            Method::POST,
            "/lab_analyte/create",
            Some(json!({"lab_test_id": 1, "loinc_code": "718-7", "value": 11.8, "unit": "g/dL"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(analyte["interpretation"], "L");
        assert_eq!(analyte["reference_low"], 12.0);

        let (status, rh) = call(
            &app,
            Method::POST,
            "/lab_analyte/create",
            Some(json!({"lab_test_id": 1, "loinc_code": "10331-7", "value": 1,
                        "unit": "", "interpretation": "POS"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{rh}");
        let (status, fetched) =
            call(&app, Method::GET, &format!("/lab_analyte/{}", rh["id"]), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["interpretation"], "POS");

        let (status, history) = call(&app, Method::GET, "/lab_analyte/1/history", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn reference_range_routes_use_loinc_keys() {
        let app = app();
        let (status, range) = call(&app, Method::GET, "/reference_range/718-7", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(range["low"], 12.0);

        let (status, updated) = call(
            &app,
            Method::PUT,
            "/reference_range/update/718-7",
            Some(json!({"low": 13.0, "high": 17.0, "unit": "g/dL"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["loinc_code"], "718-7");
        assert_eq!(updated["version"], 2);

        let (status, _) = call(
            &app,
            Method::POST,
            "/reference_range/create",
            Some(json!({"loinc_code": "718-7", "low": 1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::GET, "/reference_range/bogus", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::DELETE, "/reference_range/delete/718-7", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::GET, "/reference_range/718-7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn body_measurement_update_is_partial() {
        let app = app();
        call(
            &app,
            Method::POST,
            "/patient/create",
            Some(json!({"first_name": "Robert", "last_name": "Brown", "sex": "male"})),
        )
        .await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/body_measurement/create",
            Some(json!({"patient_id": 1, "record_time": "2025-02-10T09:30:00Z",
                        "value": 95, "unit": "kg", "snomed_code": "27113001"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, updated) = call(
            &app,
            Method::PUT,
            "/body_measurement/update/1",
            Some(json!({"value": 93})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["value"], 93.0);
        assert_eq!(updated["unit"], "kg");
    }

    #[test]
    fn openapi_documents_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).expect("serialise openapi");
        let paths = doc["paths"].as_object().expect("paths");
        for resource in [
            "patient",
            "composition",
            "specimen",
            "lab_test",
            "lab_analyte",
            "body_measurement",
            "cbc_panel",
            "blood_type_panel",
            "reference_range",
        ] {
            for route in ["all", "create"] {
                assert!(paths.contains_key(&format!("/{resource}/{route}")), "{resource}/{route}");
            }
        }
        assert!(paths["/patient/{id}"]["get"].is_object());
        assert!(paths["/cbc_panel/update/{id}"]["put"].is_object());
        assert!(paths["/specimen/delete/{id}"]["delete"].is_object());
        assert!(paths["/lab_analyte/{id}/history"]["get"].is_object());
        assert_eq!(
            paths["/lab_test/{id}"]["get"]["operationId"],
            "get_lab_test"
        );
        assert_eq!(paths.len(), 49);
    }
}
