pub mod file_service;
pub mod pattern;
pub mod render_service;
pub mod search_service;

pub use file_service::FileService;
pub use pattern::{matches, GlobPattern};
pub use render_service::{Converter, RenderService, Theme};
pub use search_service::{MatchSet, SearchService};
