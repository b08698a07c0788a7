use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use manch_admin::screens::{self, ScreenConfig};
use manch_admin::RecordLifecycleManager;
use manch_media::{AssetSource, FsObjectStore, ObjectStore};
use manch_shared::{Record, RecordKey};

use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: RecordLifecycleManager,
    pub objects: Arc<FsObjectStore>,
    pub auth: Arc<AuthService>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let body_limit = state.config.max_asset_size as usize + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/auth/login", post(auth_login))
        .route("/auth/logout", post(auth_logout))
        .route("/auth/session", get(auth_session))
        .route("/screens", get(list_screens))
        .route("/api/:namespace", get(list_records))
        .route("/api/:namespace", post(create_record))
        .route("/api/:namespace/events", get(record_events))
        .route("/api/:namespace/:key", put(update_record))
        .route("/api/:namespace/:key", delete(delete_record))
        .route("/assets/*path", get(asset_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    screens: usize,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: Uuid,
}

#[derive(Serialize)]
struct SessionResponse {
    active: bool,
    principal: Option<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        screens: screens::REGISTRY.len(),
    })
}

// ─── Auth ───

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);
    Uuid::parse_str(token).ok()
}

fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<String, ServerError> {
    bearer_token(headers)
        .and_then(|token| state.auth.principal(&token))
        .ok_or(ServerError::Unauthorized)
}

async fn auth_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let token = state
        .auth
        .login(&req.email, &req.password)
        .ok_or(ServerError::Unauthorized)?;
    Ok(Json(LoginResponse { token }))
}

async fn auth_logout(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let token = bearer_token(&headers).ok_or(ServerError::Unauthorized)?;
    if !state.auth.logout(&token) {
        return Err(ServerError::Unauthorized);
    }
    Ok(Json(serde_json::json!({ "loggedOut": true })))
}

async fn auth_session(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Json<SessionResponse> {
    let principal = bearer_token(&headers).and_then(|token| state.auth.principal(&token));
    Json(SessionResponse {
        active: principal.is_some(),
        principal,
    })
}

// ─── Screens & records ───

async fn list_screens(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<&'static [ScreenConfig]>, ServerError> {
    require_auth(&state, &headers)?;
    Ok(Json(screens::REGISTRY))
}

fn find_screen(namespace: &str) -> Result<&'static ScreenConfig, ServerError> {
    screens::find(namespace).ok_or_else(|| ServerError::UnknownScreen(namespace.to_string()))
}

async fn list_records(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<Vec<Record>>, ServerError> {
    require_auth(&state, &headers)?;
    let screen = find_screen(&namespace)?;

    let records = state.lifecycle.store().snapshot(&screen.collection()).await?;
    Ok(Json(records))
}

/// Pull scalar fields and the optional `file` part out of a multipart form.
async fn parse_form(
    mut multipart: Multipart,
) -> Result<(BTreeMap<String, String>, Option<AssetSource>), ServerError> {
    let mut fields = BTreeMap::new();
    let mut file = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = part.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = part.file_name().unwrap_or("unknown").to_string();
            let mime_type = part
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = part
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read file: {e}")))?;

            // an empty part is a file input left blank
            if !data.is_empty() {
                file = Some(AssetSource::from_bytes(file_name, mime_type, data));
            }
        } else if !name.is_empty() {
            let value = part
                .text()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, file))
}

async fn create_record(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Record>), ServerError> {
    require_auth(&state, &headers)?;
    let screen = find_screen(&namespace)?;

    let (fields, file) = parse_form(multipart).await?;
    let record = state.lifecycle.save(screen, None, fields, file).await?;

    info!(namespace = %namespace, key = %record.key, "Record created via API");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_record(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, Uuid)>,
    multipart: Multipart,
) -> Result<Json<Record>, ServerError> {
    require_auth(&state, &headers)?;
    let screen = find_screen(&namespace)?;

    let (fields, file) = parse_form(multipart).await?;
    let record = state
        .lifecycle
        .save(screen, Some(RecordKey(key)), fields, file)
        .await?;

    info!(namespace = %namespace, key = %record.key, "Record updated via API");
    Ok(Json(record))
}

async fn delete_record(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>, ServerError> {
    require_auth(&state, &headers)?;
    let screen = find_screen(&namespace)?;

    let record = state
        .lifecycle
        .store()
        .get(&screen.collection(), &RecordKey(key))
        .await?
        .ok_or(ServerError::NotFound)?;

    state.lifecycle.remove(screen, &record).await?;

    info!(namespace = %namespace, key = %key, "Record deleted via API");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Live snapshot stream for one namespace.
///
/// Each SSE event carries the full ordered snapshot.  When the
/// subscription dies the stream simply ends; reconnecting is the
/// client's move.
async fn record_events(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ServerError> {
    require_auth(&state, &headers)?;
    let screen = find_screen(&namespace)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<Record>>();
    let subscription = state.lifecycle.store().subscribe(
        &screen.collection(),
        move |snapshot| {
            let _ = tx.send(snapshot);
        },
        {
            let namespace = namespace.clone();
            move |e| warn!(namespace = %namespace, error = %e, "Live feed subscription died")
        },
    );

    // the stream owns the subscription, so client disconnect unsubscribes
    let stream = futures::stream::poll_fn(move |cx| {
        let _owned = &subscription;
        rx.poll_recv(cx)
    })
    .map(|snapshot| Event::default().event("snapshot").json_data(&snapshot));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ─── Assets ───

fn content_type_for(path: &str) -> &'static str {
    match std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn asset_download(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ServerError> {
    require_auth(&state, &headers)?;

    let data = state
        .objects
        .get(&path)
        .await
        .map_err(|_| ServerError::NotFound)?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], data).into_response())
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_allowed_uploads() {
        assert_eq!(content_type_for("banners/a.PNG"), "image/png");
        assert_eq!(content_type_for("news/b.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("schemes/c.pdf"), "application/pdf");
        assert_eq!(content_type_for("misc/unknown.bin"), "application/octet-stream");
    }

    #[test]
    fn bearer_token_parses_with_and_without_scheme() {
        let token = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token));

        let mut bare = HeaderMap::new();
        bare.insert(header::AUTHORIZATION, token.to_string().parse().unwrap());
        assert_eq!(bearer_token(&bare), Some(token));

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
