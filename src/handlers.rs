use axum::{
    body::Body,
    extract::{Path as AxumPath, Query, State},
    http::{header, Response},
    response::{Html, IntoResponse, Redirect},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::MutexGuard;

use crate::components::{PickerComponent, TemplateComponent};
use crate::errors::ViewerError;
use crate::services::FileService;
use crate::session::Session;
use crate::types::{AppState, Feedback, ViewState};
use crate::utils::{content_type_for, ensure_safe_path};

const VIEWER_JS: &str = include_str!("../static/viewer.js");
const VIEWER_CSS: &str = include_str!("../static/viewer.css");

/// JSON reply to every session request
#[derive(Debug, Serialize)]
pub struct Reply {
    pub bell: bool,
    pub reload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
    pub state: ViewState,
}

impl Reply {
    fn new(session: &Session, feedback: Feedback) -> Self {
        Self {
            bell: feedback.bell,
            reload: feedback.reload,
            message: None,
            found: None,
            state: session.view_state(),
        }
    }
}

/// Session operations reachable through `POST /api/action`
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    First,
    Last,
    Next,
    Previous,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    NextMatch,
    PreviousMatch,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: Action,
}

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct GotoRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenQuery {
    pub dir: Option<String>,
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Session>, ViewerError> {
    state.session.lock().map_err(|_| {
        log::error!("Session lock poisoned");
        ViewerError::State
    })
}

/// Run a session operation on the blocking pool; loading a file may wait on the converter
async fn with_session<F>(state: &AppState, op: F) -> Result<Reply, ViewerError>
where
    F: FnOnce(&mut Session) -> Feedback + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || -> Result<Reply, ViewerError> {
        let mut session = lock(&state)?;
        let feedback = op(&mut session);
        Ok(Reply::new(&session, feedback))
    })
    .await
    .map_err(|e| {
        log::error!("Session task failed: {}", e);
        ViewerError::State
    })?
}

/// Handle root path requests: the current document wrapped in the viewer chrome
pub async fn handle_root(State(state): State<AppState>) -> Result<Response<Body>, ViewerError> {
    let session = lock(&state)?;
    if session.files().is_empty() && state.picker_on_empty {
        log::debug!("No files loaded, redirecting to the picker");
        return Ok(Redirect::to("/open").into_response());
    }

    let templates = TemplateComponent::new();
    let page = templates.render_viewer_page(session.display(), &session.view_state());
    Ok(([(header::CACHE_CONTROL, "no-store")], Html(page)).into_response())
}

/// Handle the interactive file picker; `dir` defaults to the current document's directory
pub async fn handle_open_page(
    State(state): State<AppState>,
    Query(query): Query<OpenQuery>,
) -> Result<impl IntoResponse, ViewerError> {
    let file_service = FileService::new(state.cwd.as_ref().clone());
    let dir = match query.dir.filter(|d| !d.is_empty()) {
        Some(dir) => file_service.absolute(Path::new(&dir)),
        None => {
            let session = lock(&state)?;
            session
                .current_file()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| state.cwd.as_ref().clone())
        }
    };
    log::info!("Picker request for {:?}", dir);

    let entries = file_service.list_directory(&dir)?;
    let page = PickerComponent::new().render_page(&dir, &entries);
    Ok(([(header::CACHE_CONTROL, "no-store")], Html(page)))
}

/// Handle a picker submission; the selection is sorted ascending
pub async fn handle_open(
    State(state): State<AppState>,
    Json(request): Json<OpenRequest>,
) -> Result<Json<Reply>, ViewerError> {
    let file_service = FileService::new(state.cwd.as_ref().clone());
    let picked = request.files.into_iter().map(PathBuf::from).collect();
    let files = file_service.sort_picked(picked);

    with_session(&state, move |session| session.open_files(files)).await.map(Json)
}

/// Handle navigation, zoom and match stepping
pub async fn handle_action(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<Reply>, ViewerError> {
    let action = request.action;
    log::debug!("Action request: {:?}", action);
    let op = move |session: &mut Session| match action {
        Action::First => session.first(),
        Action::Last => session.last(),
        Action::Next => session.next(),
        Action::Previous => session.previous(),
        Action::ZoomIn => session.zoom_in(),
        Action::ZoomOut => session.zoom_out(),
        Action::ZoomReset => session.zoom_reset(),
        Action::NextMatch => session.next_match(),
        Action::PreviousMatch => session.previous_match(),
    };
    with_session(&state, op).await.map(Json)
}

/// Handle search requests
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Reply>, ViewerError> {
    log::debug!("Search request received for query: '{}'", request.query);
    let mut session = lock(&state)?;
    let feedback = session.search(&request.query);
    Ok(Json(Reply::new(&session, feedback)))
}

pub async fn handle_goto(
    State(state): State<AppState>,
    Json(request): Json<GotoRequest>,
) -> Result<Json<Reply>, ViewerError> {
    let mut session = lock(&state)?;
    let found = session.go_to(request.index);
    let mut reply = Reply::new(&session, Feedback::default());
    reply.found = Some(found);
    Ok(Json(reply))
}

/// Handle export of the cached document; failures come back as an alert message
pub async fn handle_save(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<Reply>, ViewerError> {
    let session = lock(&state)?;
    if request.path.trim().is_empty() {
        return Ok(Json(Reply::new(&session, Feedback::default())));
    }

    let dest = FileService::new(state.cwd.as_ref().clone()).absolute(Path::new(request.path.trim()));
    let reply = match session.save(&dest) {
        Ok(feedback) => Reply::new(&session, feedback),
        Err(e) => {
            log::error!("Export failed: {}", e);
            let mut reply = Reply::new(&session, Feedback::bell());
            reply.message = Some(e.to_string());
            reply
        }
    };
    Ok(Json(reply))
}

pub async fn handle_quit(State(state): State<AppState>) -> Result<Json<Reply>, ViewerError> {
    log::info!("Quit requested");
    // Signal first so a busy session cannot hold up shutdown
    state.shutdown.notify_one();
    with_session(&state, |_| Feedback::default()).await.map(Json)
}

pub async fn handle_state(State(state): State<AppState>) -> Result<Json<ViewState>, ViewerError> {
    let session = lock(&state)?;
    Ok(Json(session.view_state()))
}

/// Serve the embedded viewer assets
pub async fn handle_static(AxumPath(name): AxumPath<String>) -> Result<impl IntoResponse, ViewerError> {
    let body = match name.as_str() {
        "viewer.js" => VIEWER_JS,
        "viewer.css" => VIEWER_CSS,
        _ => return Err(ViewerError::NotFound),
    };
    Ok(([(header::CONTENT_TYPE, content_type_for(Path::new(&name)))], body))
}

/// Serve resources relative to the current document's directory
pub async fn handle_doc(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Result<Response<Body>, ViewerError> {
    ensure_safe_path(&path)?;
    let base = {
        let session = lock(&state)?;
        session
            .current_file()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .ok_or(ViewerError::NotFound)?
    };

    let requested = base.join(&path);
    if !requested.is_file() {
        log::warn!("Document resource not found: {:?}", requested);
        return Err(ViewerError::NotFound);
    }

    let bytes = std::fs::read(&requested)?;
    let mut resp = Response::new(Body::from(bytes));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        content_type_for(&requested)
            .parse()
            .unwrap_or_else(|_| header::HeaderValue::from_static("application/octet-stream")),
    );
    Ok(resp)
}
