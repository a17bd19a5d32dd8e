//! Navigation and session control: the ordered file list, the current
//! document and everything that resets when another document is loaded.

use std::fs;
use std::path::Path;

use log::{error, info};

use crate::components::TemplateComponent;
use crate::errors::ViewerError;
use crate::services::{RenderService, SearchService};
use crate::types::{Feedback, FileList, ViewState};

/// Display scale in tenths, clamped to [0.5, 3.0]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zoom {
    tenths: u32,
}

impl Zoom {
    const MIN: u32 = 5;
    const MAX: u32 = 30;
    const DEFAULT: u32 = 10;

    pub fn increase(&mut self) {
        self.tenths = (self.tenths + 1).min(Self::MAX);
    }

    pub fn decrease(&mut self) {
        self.tenths = self.tenths.saturating_sub(1).max(Self::MIN);
    }

    pub fn reset(&mut self) {
        self.tenths = Self::DEFAULT;
    }

    pub fn factor(&self) -> f64 {
        f64::from(self.tenths) / 10.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self { tenths: Self::DEFAULT }
    }
}

/// The single active viewing session
pub struct Session {
    files: FileList,
    index: usize,
    zoom: Zoom,
    search: SearchService,
    renderer: RenderService,
    templates: TemplateComponent,
    /// Last successfully rendered document, kept for export
    cached: Option<String>,
    /// Document as displayed, including search markers
    display: String,
}

impl Session {
    pub fn new(renderer: RenderService) -> Self {
        let templates = TemplateComponent::new();
        let display = templates.empty_document();
        Self {
            files: Vec::new(),
            index: 0,
            zoom: Zoom::default(),
            search: SearchService::new(),
            renderer,
            templates,
            cached: None,
            display,
        }
    }

    pub fn files(&self) -> &[std::path::PathBuf] {
        &self.files
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.files.get(self.index).map(|p| p.as_path())
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn cached(&self) -> Option<&str> {
        self.cached.as_deref()
    }

    /// `"<filename> [<i+1>/<len>]"`, or the program name without files
    pub fn title(&self) -> String {
        match self.current_file() {
            Some(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                format!("{} [{}/{}]", name, self.index + 1, self.files.len())
            }
            None => "mdview".to_string(),
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            title: self.title(),
            file: self.current_file().map(|p| p.display().to_string()),
            zoom: self.zoom.factor(),
            query: self.search.query().to_string(),
            match_count: self.search.total(),
            current_match: self.search.current(),
        }
    }

    /// Replace the file list wholesale and show its first entry
    pub fn replace_files(&mut self, files: FileList) -> Feedback {
        info!("Loading a list of {} file(s)", files.len());
        self.files = files;
        self.index = 0;
        self.load_current();
        Feedback::reload()
    }

    /// Take a picker selection; an empty selection keeps the current list
    pub fn open_files(&mut self, files: FileList) -> Feedback {
        if files.is_empty() {
            info!("No files picked, keeping the current list");
            return Feedback::default();
        }
        self.replace_files(files)
    }

    pub fn first(&mut self) -> Feedback {
        if self.files.is_empty() {
            return Feedback::bell();
        }
        self.move_to(0, false)
    }

    pub fn last(&mut self) -> Feedback {
        if self.files.is_empty() {
            return Feedback::bell();
        }
        self.move_to(self.files.len() - 1, false)
    }

    /// Step forward; wrapping past the last file rings the bell
    pub fn next(&mut self) -> Feedback {
        let len = self.files.len();
        if len == 0 {
            return Feedback::bell();
        }
        let target = (self.index + 1) % len;
        self.move_to(target, target <= self.index)
    }

    /// Step back; wrapping past the first file rings the bell
    pub fn previous(&mut self) -> Feedback {
        let len = self.files.len();
        if len == 0 {
            return Feedback::bell();
        }
        let target = (self.index + len - 1) % len;
        self.move_to(target, target >= self.index)
    }

    fn move_to(&mut self, index: usize, wrapped: bool) -> Feedback {
        self.index = index;
        self.load_current();
        Feedback { bell: wrapped, reload: true }
    }

    /// Render the current file, resetting zoom and search. Failures show an inline error document.
    pub fn load_current(&mut self) {
        self.zoom.reset();
        self.search.reset();
        let Some(path) = self.files.get(self.index).cloned() else {
            self.cached = None;
            self.display = self.templates.empty_document();
            return;
        };

        match self.renderer.render(&path) {
            Ok(html) => {
                self.display = html.clone();
                self.cached = Some(html);
            }
            Err(e) => {
                error!("Failed to render {:?}: {}", path, e);
                self.cached = None;
                self.display = self.templates.error_document(&path, &e);
            }
        }
        info!("{}", self.title());
    }

    pub fn zoom_in(&mut self) -> Feedback {
        self.zoom.increase();
        Feedback::default()
    }

    pub fn zoom_out(&mut self) -> Feedback {
        self.zoom.decrease();
        Feedback::default()
    }

    pub fn zoom_reset(&mut self) -> Feedback {
        self.zoom.reset();
        Feedback::default()
    }

    /// Highlight `query` in the displayed document and select the first match
    pub fn search(&mut self, query: &str) -> Feedback {
        if self.current_file().is_none() {
            return Feedback::bell();
        }
        let count = self.search.search(&mut self.display, query);
        if count > 0 {
            self.search.go_to(&mut self.display, 0);
        }
        Feedback { bell: !query.is_empty() && count == 0, reload: true }
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        self.search.go_to(&mut self.display, index)
    }

    pub fn next_match(&mut self) -> Feedback {
        match self.search.next(&mut self.display) {
            Some(_) => Feedback::default(),
            None => Feedback::bell(),
        }
    }

    pub fn previous_match(&mut self) -> Feedback {
        match self.search.previous(&mut self.display) {
            Some(_) => Feedback::default(),
            None => Feedback::bell(),
        }
    }

    /// Write the cached document verbatim to `dest`; rings the bell when nothing is cached
    pub fn save(&self, dest: &Path) -> Result<Feedback, ViewerError> {
        let Some(html) = &self.cached else {
            return Ok(Feedback::bell());
        };
        fs::write(dest, html).map_err(|e| ViewerError::Write { path: dest.to_path_buf(), source: e })?;
        info!("Saved {} bytes to {:?}", html.len(), dest);
        Ok(Feedback::default())
    }
}
