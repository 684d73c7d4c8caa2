use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ehr_core::EhrError;
use serde::Serialize;

/// Error returned by every route handler, rendered as `{ "error": message }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                "internal server error".to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unprocessable(msg) => {
                tracing::warn!("request rejected ({status}): {msg}");
                msg
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<EhrError> for ApiError {
    fn from(e: EhrError) -> Self {
        let message = e.to_string();
        match e {
            EhrError::InvalidInput(_)
            | EhrError::Text(_)
            | EhrError::Code(_)
            | EhrError::Interpretation(_) => ApiError::BadRequest(message),
            EhrError::NotFound { .. } => ApiError::NotFound(message),
            EhrError::AlreadyExists { .. } | EhrError::InUse { .. } => ApiError::Conflict(message),
            EhrError::UnknownReference { .. } => ApiError::Unprocessable(message),
            EhrError::FileRead(_)
            | EhrError::Translation(_)
            | EhrError::StoreUnavailable => ApiError::Internal(message),
        }
    }
}

/// JSON body extractor whose rejections use the same error shape as handler failures.
///
/// Field validation runs during deserialisation (blank names, malformed codes), so a body
/// that fails to parse is a client error: `400`, not axum's default `422`.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (EhrError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                EhrError::NotFound {
                    kind: "patient",
                    key: "1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                EhrError::InUse {
                    kind: "patient",
                    key: "1".into(),
                    referenced_by: "composition",
                },
                StatusCode::CONFLICT,
            ),
            (
                EhrError::UnknownReference {
                    kind: "lab test",
                    key: "9".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (EhrError::StoreUnavailable, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
