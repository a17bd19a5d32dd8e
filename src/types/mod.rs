use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::Notify;

use crate::session::Session;

/// File extensions the viewer recognises, lowercase and without the dot
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["html", "htm", "md", "markdown"];

/// Ordered, session-owned sequence of document paths
pub type FileList = Vec<PathBuf>;

/// How a document is turned into displayable HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Markdown,
}

impl DocumentKind {
    /// Classify `path` by its lowercased extension; `None` for anything not allowed
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(DocumentKind::Html),
            "md" | "markdown" => Some(DocumentKind::Markdown),
            _ => None,
        }
    }
}

/// A glob mask split into the directory it scans and the pattern applied to file names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub raw: String,
    pub dir: PathBuf,
    pub pattern: String,
}

/// Directory entry shown by the file picker
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub path: PathBuf,
    pub modified: Option<String>,
}

/// Outcome of a session operation, consumed by the presentation surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
    /// Emit the audible alert
    pub bell: bool,
    /// The displayed document changed and must be shown again
    pub reload: bool,
}

impl Feedback {
    pub fn bell() -> Self {
        Self { bell: true, reload: false }
    }

    pub fn reload() -> Self {
        Self { bell: false, reload: true }
    }
}

/// Snapshot of what the presentation surface needs to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub title: String,
    pub file: Option<String>,
    pub zoom: f64,
    pub query: String,
    pub match_count: usize,
    pub current_match: Option<usize>,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub cwd: Arc<PathBuf>,
    pub shutdown: Arc<Notify>,
    /// Started without masks: an empty list sends the browser to the picker
    pub picker_on_empty: bool,
}

impl AppState {
    pub fn new(session: Session, cwd: PathBuf, picker_on_empty: bool) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            cwd: Arc::new(cwd),
            shutdown: Arc::new(Notify::new()),
            picker_on_empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_kind_ignores_case() {
        assert_eq!(DocumentKind::of(Path::new("a/B.HTM")), Some(DocumentKind::Html));
        assert_eq!(DocumentKind::of(Path::new("notes.Markdown")), Some(DocumentKind::Markdown));
        assert_eq!(DocumentKind::of(Path::new("notes.txt")), None);
        assert_eq!(DocumentKind::of(Path::new("Makefile")), None);
    }
}
