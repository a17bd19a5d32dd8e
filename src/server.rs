//! Local HTTP surface: routing, startup and browser launch.

use std::ffi::OsStr;
use std::process::Command;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::errors::ViewerError;
use crate::handlers;
use crate::session::Session;
use crate::types::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_root))
        .route("/open", get(handlers::handle_open_page))
        .route("/api/open", post(handlers::handle_open))
        .route("/api/action", post(handlers::handle_action))
        .route("/api/search", post(handlers::handle_search))
        .route("/api/goto", post(handlers::handle_goto))
        .route("/api/save", post(handlers::handle_save))
        .route("/api/quit", post(handlers::handle_quit))
        .route("/api/state", get(handlers::handle_state))
        .route("/static/*name", get(handlers::handle_static))
        .route("/doc/*path", get(handlers::handle_doc))
        .with_state(state)
}

/// Hand `arg` to the platform opener without waiting for it
pub fn system_open<S: AsRef<OsStr>>(arg: S) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(arg).spawn()?;

    #[cfg(all(unix, not(target_os = "macos")))]
    Command::new("xdg-open").arg(arg).spawn()?;

    #[cfg(target_os = "windows")]
    Command::new("cmd").args(["/C", "start", ""]).arg(arg).spawn()?;

    Ok(())
}

/// Load the masks into a fresh session and serve it until a quit request arrives
pub async fn run(config: &Config, masks: &[String]) -> Result<(), ViewerError> {
    let mut session = Session::new(config.renderer());
    if !masks.is_empty() {
        let files = config.file_service().expand(masks);
        if files.is_empty() {
            log::warn!("No files matched {:?}", masks);
        }
        session.replace_files(files);
    }

    if config.converter.is_available() {
        log::info!(
            "Markdown converter: {} (scratch file {:?})",
            config.converter.program(),
            config.converter.scratch()
        );
    }

    let state = AppState::new(session, config.cwd.clone(), masks.is_empty());
    let shutdown = state.shutdown.clone();
    let app = router(state);

    let listener = TcpListener::bind(config.socket_addr()).await?;
    let url = format!("http://{}/", listener.local_addr()?);
    println!("mdview listening on {}", url);

    if config.open_browser {
        if let Err(e) = system_open(&url) {
            log::warn!("Cannot launch a browser ({}), open {} manually", e, url);
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await?;
    log::info!("Viewer closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Converter, RenderService, Theme};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_routes_and_methods_are_rejected() {
        let dir = tempdir().unwrap();
        let renderer = RenderService::new(
            Theme::Builtin,
            Converter::detect("mdview-no-such-converter", dir.path().join("scratch.html")),
        );
        let state = AppState::new(Session::new(renderer), dir.path().to_path_buf(), false);

        let missing = router(state.clone())
            .oneshot(Request::builder().uri("/wiki/page").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let wrong_method = router(state)
            .oneshot(Request::builder().uri("/api/quit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
