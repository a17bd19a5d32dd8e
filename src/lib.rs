//! mdview - a local Markdown and HTML viewer
//!
//! Files are picked by glob masks or an interactive picker, rendered to HTML
//! (Markdown through an external converter) and shown in the browser over a
//! loopback HTTP server with keyboard navigation, zoom, search and export.

pub mod batch;
pub mod cli;
pub mod components;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod server;
pub mod services;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use cli::Cli;
pub use config::Config;
pub use errors::ViewerError;
pub use logger::Logger;
pub use session::{Session, Zoom};
pub use types::{AppState, DirEntry, DocumentKind, Feedback, FileList, Mask, ViewState};
pub use services::{FileService, RenderService, SearchService};
pub use components::{PickerComponent, TemplateComponent};

// Re-export utility functions
pub use utils::{escape_attr, escape_html, ensure_safe_path};
