use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

use panel_addons::{AddonHost, InstallError, ProgressEvent, Slug};
use panel_addons_github::AddonStoreClient;
use panel_addons_pipeline::{Installer, list_entries, reload, toggle};
use panel_addons_store::AddonRegistry;

/// Shared state behind every admin route.
#[derive(Clone)]
pub struct AppState {
    pub addons_root: PathBuf,
    pub registry: Arc<AddonRegistry>,
    pub client: Arc<AddonStoreClient>,
    pub host: Arc<dyn AddonHost>,
    pub installer: Arc<Installer>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/admin/addons", get(list_addons))
        .route("/admin/addons/reload", post(reload_addons))
        .route("/admin/addons/toggle/{slug}", post(toggle_addon))
        .route("/admin/addons/store/list", get(store_list))
        .route("/admin/addons/store/discussions", get(store_discussions))
        .route("/admin/addons/store/install", post(install_addon))
        .route("/admin/addons/store/uninstall", post(uninstall_addon))
        .with_state(state)
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
        .into_response()
}

fn status_for(error: &InstallError) -> StatusCode {
    match error {
        InstallError::InvalidSlug(_) => StatusCode::BAD_REQUEST,
        InstallError::AlreadyInstalled(_) => StatusCode::CONFLICT,
        InstallError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn list_addons(State(state): State<AppState>) -> Response {
    match list_entries(&state.registry, &state.addons_root) {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => failure(status_for(&e), e.to_string()),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResponse {
    success: bool,
    message: String,
    migrations_applied: u64,
}

async fn reload_addons(State(state): State<AppState>) -> Response {
    match reload(&state.registry, state.host.as_ref(), &state.addons_root).await {
        Ok(report) => Json(ActionResponse {
            success: true,
            message: format!("Reloaded {} addon(s)", report.loaded),
            migrations_applied: report.migrations_applied,
        })
        .into_response(),
        Err(e) => failure(status_for(&e), e.to_string()),
    }
}

#[derive(Deserialize)]
struct ToggleBody {
    enabled: bool,
}

async fn toggle_addon(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<ToggleBody>,
) -> Response {
    let slug = match Slug::parse(&slug) {
        Ok(slug) => slug,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match toggle(
        &state.registry,
        state.host.as_ref(),
        &state.addons_root,
        &slug,
        body.enabled,
    )
    .await
    {
        Ok(outcome) => Json(ActionResponse {
            success: true,
            message: outcome.message,
            migrations_applied: outcome.migrations_applied,
        })
        .into_response(),
        Err(e) => failure(status_for(&e), e.to_string()),
    }
}

async fn store_list(State(state): State<AppState>) -> Response {
    match state.client.list_catalog().await {
        Ok(addons) => Json(json!({ "success": true, "addons": addons })).into_response(),
        Err(e) => failure(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

async fn store_discussions(State(state): State<AppState>) -> Response {
    let counts = state.client.discussion_counts().await;
    Json(json!({ "success": true, "counts": counts })).into_response()
}

#[derive(Deserialize)]
struct SlugBody {
    slug: String,
}

/// Kick off an install and stream its progress as SSE. Slug and
/// already-installed problems are rejected with a plain status before
/// any stream is opened; after that, every outcome arrives as events
/// ending in exactly one `done` or `error`.
async fn install_addon(State(state): State<AppState>, Json(body): Json<SlugBody>) -> Response {
    let slug = match Slug::parse(&body.slug) {
        Ok(slug) => slug,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if let Err(e) = state.installer.precheck(&slug) {
        return failure(status_for(&e), e.to_string());
    }

    let (tx, rx) = mpsc::channel(64);
    let installer = state.installer.clone();

    // The pipeline owns its cleanup; it runs to completion (or rolls
    // back) even if the client disconnects and the stream is dropped.
    tokio::spawn(async move {
        installer.install(&slug, &tx).await;
    });

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(sse_event(&event)), rx))
    });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

fn sse_event(event: &ProgressEvent) -> Event {
    let payload = serde_json::to_string(event)
        .unwrap_or_else(|_| r#"{"type":"error","message":"event serialization failed"}"#.into());
    Event::default().data(payload)
}

async fn uninstall_addon(State(state): State<AppState>, Json(body): Json<SlugBody>) -> Response {
    let slug = match Slug::parse(&body.slug) {
        Ok(slug) => slug,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.installer.uninstall(&slug).await {
        Ok(message) => Json(json!({ "success": true, "message": message })).into_response(),
        Err(e) => failure(status_for(&e), e.to_string()),
    }
}
