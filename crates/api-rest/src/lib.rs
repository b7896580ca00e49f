//! # API REST
//!
//! REST rendering surface for patient views.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI document generation
//! - REST-specific concerns (JSON serialisation, CORS, status codes)
//!
//! Each request to `GET /patients/{id}` opens a fresh [`PatientView`], loads the record and
//! returns the page title plus the read-only field descriptors.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use patient_view_core::{
    FieldDescriptor, FieldValue, LoadOutcome, PatientId, PatientRepository, PatientView,
    TitleSetter,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn PatientRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn PatientRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// One read-only field, with dates rendered as RFC 3339 strings.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldRes {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub value: Option<String>,
    pub is_editable: bool,
}

impl From<FieldDescriptor> for FieldRes {
    fn from(field: FieldDescriptor) -> Self {
        let value = match field.value {
            FieldValue::Text(s) => Some(s),
            FieldValue::Date(d) => Some(d.to_rfc3339()),
            FieldValue::Empty => None,
        };
        Self {
            name: field.name.to_string(),
            label: field.label,
            kind: field.kind.as_str().to_string(),
            value,
            is_editable: field.is_editable,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewPatientRes {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldRes>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, view_patient),
    components(schemas(HealthRes, FieldRes, ViewPatientRes))
)]
pub struct ApiDoc;

/// Builds the REST router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients/:id", get(view_patient))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Captures the title a view sets so the handler can return it.
#[derive(Default)]
struct TitleSlot(Mutex<Option<String>>);

impl TitleSetter for TitleSlot {
    fn set_title(&self, title: &str) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(title.to_string());
    }
}

impl TitleSlot {
    fn take(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Patient view REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(
        ("id" = String, Path, description = "Patient identifier")
    ),
    responses(
        (status = 200, description = "Read-only patient view", body = ViewPatientRes),
        (status = 400, description = "Invalid patient identifier"),
        (status = 404, description = "Patient not found"),
        (status = 503, description = "Patient store unavailable")
    )
)]
/// View a patient record
///
/// Loads the record through a fresh view session and renders its fields.
///
/// # Errors
/// Returns:
/// - `400 Bad Request` if the identifier is blank,
/// - `404 Not Found` if no record exists,
/// - `503 Service Unavailable` if the record could not be read.
#[axum::debug_handler]
async fn view_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ViewPatientRes>, (StatusCode, &'static str)> {
    let id = PatientId::parse(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid patient identifier"))?;

    let title = Arc::new(TitleSlot::default());
    let view = PatientView::new(state.repository.clone(), title.clone());

    match view.load(id.clone()).await {
        LoadOutcome::Loaded => {}
        LoadOutcome::NotFound => return Err((StatusCode::NOT_FOUND, "Patient not found")),
        LoadOutcome::Unavailable | LoadOutcome::Stale => {
            return Err((StatusCode::SERVICE_UNAVAILABLE, "Patient record unavailable"));
        }
    }

    let fields = view.fields().ok_or_else(|| {
        tracing::error!("view for {} lost its record after loading", id);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })?;

    Ok(Json(ViewPatientRes {
        id: id.to_string(),
        title: title.take().unwrap_or_default(),
        fields: fields.into_iter().map(FieldRes::from).collect(),
    }))
}

/// OpenAPI document for this API.
async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
