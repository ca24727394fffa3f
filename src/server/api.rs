//! HTTP handlers with Axum and Utoipa

use axum::{
    extract::{rejection::FormRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::core::loader::{Upload, UploadSlot};
use crate::core::model::VehicleId;
use crate::view::html::{dashboard_page, error_page, PageMode};
use crate::view::page::{render, sidebar_files, DeliveryDay, PageState, Selections, ViewModel};

use super::session::{new_session_id, session_id, set_cookie};
use super::AppState;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(api_view, plot_svg, upload, clear, health),
    components(schemas(ViewModel, ErrorResponse)),
    info(
        title = "Delivery Dash API",
        version = "1.0.0",
        description = "Upload pre-computed delivery routes and inspect them as a table, map and chart"
    )
)]
struct ApiDoc;

/// Build the Axum router
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/clear/{slot}", post(clear))
        .route("/api/view", get(api_view))
        .route("/plot.svg", get(plot_svg))
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_json(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

/// Run parsing and chart drawing on the blocking pool
///
/// Large uploads take seconds to parse; the runtime's workers keep serving
/// other sessions meanwhile. A panic in `work` becomes a 500.
async fn render_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!(error = %e, "Render task failed");
        error_json(StatusCode::INTERNAL_SERVER_ERROR, "Rendering failed")
    })
}

// ============ Session ============

/// The browser's session for this request; `fresh` ids still need a cookie
struct RequestSession {
    id: String,
    fresh: bool,
}

impl RequestSession {
    fn from_headers(headers: &HeaderMap) -> Self {
        match session_id(headers) {
            Some(id) => Self { id, fresh: false },
            None => Self {
                id: new_session_id(),
                fresh: true,
            },
        }
    }

    fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.fresh {
            if let Ok(cookie) = HeaderValue::from_str(&set_cookie(&self.id)) {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
        }
        response
    }
}

// ============ Selections ============

/// UI state carried in the query string
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    vehicle: Option<String>,
    day: Option<String>,
}

impl ViewQuery {
    /// Rejects values that do not parse
    fn selections(&self) -> Result<Selections, String> {
        let vehicle = match non_empty(&self.vehicle) {
            Some(v) => Some(parse_vehicle(v)?),
            None => None,
        };
        let day = match non_empty(&self.day) {
            Some(d) => d.parse()?,
            None => DeliveryDay::default(),
        };
        Ok(Selections { vehicle, day })
    }

    /// Falls back to defaults for values that do not parse
    fn selections_or_default(&self) -> Selections {
        Selections {
            vehicle: non_empty(&self.vehicle).and_then(|v| parse_vehicle(v).ok()),
            day: non_empty(&self.day).and_then(|d| d.parse().ok()).unwrap_or_default(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_vehicle(value: &str) -> Result<VehicleId, String> {
    value
        .parse::<i64>()
        .map(VehicleId)
        .map_err(|_| format!("Invalid vehicle id: {value}"))
}

fn home_url(day: Option<DeliveryDay>) -> String {
    match day {
        Some(day) => format!("/?day={day}"),
        None => "/".to_string(),
    }
}

// ============ Page ============

async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ViewQuery>,
) -> Response {
    let session = RequestSession::from_headers(&headers);
    let uploads = state.sessions.uploads(&session.id);
    let selections = query.selections_or_default();

    let page = render_blocking(move || match render(&uploads, &selections) {
        Ok(view) => {
            let svg = view.dashboard().and_then(|dashboard| match dashboard.plot.to_svg() {
                Ok(svg) => Some(svg),
                Err(e) => {
                    warn!(error = %e, "Plot rendering failed");
                    None
                }
            });
            (StatusCode::OK, Html(dashboard_page(&view, svg.as_deref(), PageMode::Interactive)))
        }
        Err(e) => {
            warn!(error = %e, "Uploaded files could not be loaded");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(error_page(
                    &sidebar_files(&uploads),
                    selections.day,
                    &e.to_string(),
                    PageMode::Interactive,
                )),
            )
        }
    })
    .await;

    match page {
        Ok(page) => session.respond(page),
        Err(failed) => session.respond(failed),
    }
}

// ============ Uploads ============

/// Store uploaded files in the browser's session
///
/// Multipart fields `geocode`, `routes`, `distance_matrix` and
/// `duration_matrix` replace the matching slot; empty parts are ignored. An
/// optional `day` field is carried into the redirect.
#[utoipa::path(
    post,
    path = "/upload",
    responses(
        (status = 303, description = "Files stored, redirect to the dashboard"),
        (status = 400, description = "Malformed multipart body", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
    )
)]
async fn upload(State(state): State<Arc<AppState>>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let session = RequestSession::from_headers(&headers);
    let mut received = Vec::new();
    let mut day = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return session.respond(error_json(e.status(), format!("Invalid upload: {}", e.body_text()))),
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == "day" {
            day = field.text().await.ok().and_then(|text| text.parse::<DeliveryDay>().ok());
            continue;
        }
        let Ok(slot) = name.parse::<UploadSlot>() else {
            debug!(field = %name, "Ignoring unknown form field");
            continue;
        };

        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", slot.key(), slot.accept()));
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return session.respond(error_json(e.status(), format!("Invalid upload: {}", e.body_text()))),
        };
        if bytes.is_empty() {
            continue;
        }

        info!(slot = %slot, file = %file_name, bytes = bytes.len(), "Received upload");
        received.push((slot, Upload::new(file_name, bytes)));
    }

    if !received.is_empty() {
        state.sessions.update(&session.id, |uploads| {
            for (slot, upload) in received {
                uploads.set(slot, upload);
            }
        });
    }

    session.respond(Redirect::to(&home_url(day)))
}

/// Remove one uploaded file from the browser's session
///
/// An optional url-encoded `day` field is carried into the redirect.
#[utoipa::path(
    post,
    path = "/clear/{slot}",
    params(
        ("slot" = String, Path, description = "geocode, routes, distance_matrix or duration_matrix"),
    ),
    responses(
        (status = 303, description = "Slot cleared, redirect to the dashboard"),
        (status = 404, description = "Unknown slot", body = ErrorResponse),
    )
)]
async fn clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slot): Path<String>,
    form: Result<Form<ClearForm>, FormRejection>,
) -> Response {
    let session = RequestSession::from_headers(&headers);
    let slot = match slot.parse::<UploadSlot>() {
        Ok(slot) => slot,
        Err(e) => return session.respond(error_json(StatusCode::NOT_FOUND, e)),
    };

    state.sessions.update(&session.id, |uploads| uploads.clear(slot));
    info!(slot = %slot, "Cleared upload");

    let day = form.ok().and_then(|Form(form)| form.day());
    session.respond(Redirect::to(&home_url(day)))
}

/// Body of the sidebar's clear buttons; a missing or unknown day is ignored
#[derive(Debug, Default, Deserialize)]
pub struct ClearForm {
    day: Option<String>,
}

impl ClearForm {
    fn day(&self) -> Option<DeliveryDay> {
        non_empty(&self.day).and_then(|d| d.parse().ok())
    }
}

// ============ Data ============

/// The page's view model as JSON
#[utoipa::path(
    get,
    path = "/api/view",
    params(
        ("vehicle" = Option<i64>, Query, description = "Vehicle whose rows fill the table"),
        ("day" = Option<String>, Query, description = "Monday, Wednesday or Friday"),
    ),
    responses(
        (status = 200, description = "Current view", body = ViewModel),
        (status = 400, description = "Bad selection", body = ErrorResponse),
        (status = 422, description = "Uploaded files could not be loaded", body = ErrorResponse),
    )
)]
async fn api_view(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ViewQuery>,
) -> Response {
    let session = RequestSession::from_headers(&headers);
    let selections = match query.selections() {
        Ok(selections) => selections,
        Err(e) => return session.respond(error_json(StatusCode::BAD_REQUEST, e)),
    };

    let uploads = state.sessions.uploads(&session.id);
    match render_blocking(move || render(&uploads, &selections)).await {
        Ok(Ok(view)) => session.respond(Json(view)),
        Ok(Err(e)) => session.respond(error_json(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
        Err(failed) => session.respond(failed),
    }
}

/// Route overview chart as SVG
#[utoipa::path(
    get,
    path = "/plot.svg",
    responses(
        (status = 200, description = "Chart", body = String, content_type = "image/svg+xml"),
        (status = 404, description = "Not all files uploaded", body = ErrorResponse),
        (status = 422, description = "Uploaded files could not be loaded", body = ErrorResponse),
    )
)]
async fn plot_svg(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = RequestSession::from_headers(&headers);
    let uploads = state.sessions.uploads(&session.id);

    let response = render_blocking(move || {
        let view = match render(&uploads, &Selections::default()) {
            Ok(view) => view,
            Err(e) => return error_json(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        };
        let dashboard = match &view.state {
            PageState::Ready(dashboard) => dashboard,
            PageState::Incomplete { .. } => {
                return error_json(StatusCode::NOT_FOUND, "Not all files uploaded");
            }
        };

        match dashboard.plot.to_svg() {
            Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
            Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    })
    .await;

    match response {
        Ok(response) | Err(response) => session.respond(response),
    }
}

// ============ Service ============

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy"),
    )
)]
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("DASH_VERSION")
    }))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(vehicle: Option<&str>, day: Option<&str>) -> ViewQuery {
        ViewQuery {
            vehicle: vehicle.map(str::to_string),
            day: day.map(str::to_string),
        }
    }

    #[test]
    fn test_strict_selections() {
        let s = query(Some("2"), Some("friday")).selections().unwrap();
        assert_eq!(s.vehicle, Some(VehicleId(2)));
        assert_eq!(s.day, DeliveryDay::Friday);

        assert_eq!(query(Some(""), None).selections().unwrap(), Selections::default());
        assert!(query(Some("two"), None).selections().is_err());
        assert!(query(None, Some("Sunday")).selections().is_err());
    }

    #[test]
    fn test_lenient_selections() {
        let s = query(Some("two"), Some("Sunday")).selections_or_default();
        assert_eq!(s, Selections::default());
        let s = query(Some(" 7 "), Some("Wednesday")).selections_or_default();
        assert_eq!(s.vehicle, Some(VehicleId(7)));
        assert_eq!(s.day, DeliveryDay::Wednesday);
    }

    #[test]
    fn test_home_url_keeps_day() {
        assert_eq!(home_url(None), "/");
        assert_eq!(home_url(Some(DeliveryDay::Friday)), "/?day=Friday");
    }

    #[test]
    fn test_clear_form_day() {
        let form = |day: Option<&str>| ClearForm {
            day: day.map(str::to_string),
        };
        assert_eq!(form(Some("Friday")).day(), Some(DeliveryDay::Friday));
        assert_eq!(form(Some(" wednesday ")).day(), Some(DeliveryDay::Wednesday));
        assert_eq!(form(Some("Sunday")).day(), None);
        assert_eq!(form(None).day(), None);
    }

    #[tokio::test]
    async fn test_render_on_blocking_pool() {
        let rendered = render_blocking(|| render(&Default::default(), &Selections::default()))
            .await
            .ok()
            .and_then(|view| view.ok());
        assert!(matches!(rendered.map(|v| v.state), Some(PageState::Incomplete { .. })));
    }

    #[tokio::test]
    async fn test_render_panic_becomes_server_error() {
        let failed = render_blocking(|| -> u8 { panic!("chart layout diverged") }).await;
        match failed {
            Err(response) => assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR),
            Ok(_) => panic!("Expected the panic to surface as an error response"),
        }
    }

    #[test]
    fn test_openapi_lists_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/api/view", "/plot.svg", "/upload", "/clear/{slot}", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
