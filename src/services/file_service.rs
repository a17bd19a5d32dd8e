use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::errors::ViewerError;
use crate::services::pattern::GlobPattern;
use crate::types::{DirEntry, DocumentKind, FileList, Mask};
use crate::utils::last_modified;

/// Service for turning masks and picker selections into file lists
#[derive(Clone)]
pub struct FileService {
    cwd: PathBuf,
}

impl FileService {
    /// Create a new file service resolving relative paths against `cwd`
    pub fn new(cwd: PathBuf) -> Self {
        debug!("Creating FileService with working directory: {:?}", cwd);
        Self { cwd }
    }

    /// Make `path` absolute against the working directory
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Split a raw mask into its directory and base pattern
    pub fn parse_mask(&self, raw: &str) -> Mask {
        let (dir, pattern) = match raw.rfind(std::path::is_separator) {
            Some(0) => (PathBuf::from(&raw[..1]), &raw[1..]),
            Some(idx) => (self.absolute(Path::new(&raw[..idx])), &raw[idx + 1..]),
            None => (self.cwd.clone(), raw),
        };
        Mask { raw: raw.to_string(), dir, pattern: pattern.to_string() }
    }

    /// Expand masks into a file list sorted by descending path
    pub fn expand(&self, masks: &[String]) -> FileList {
        let mut files = Vec::new();
        for raw in masks {
            let mask = self.parse_mask(raw);
            self.expand_mask(&mask, &mut files);
        }
        files.sort_by(|a, b| b.as_os_str().cmp(a.as_os_str()));
        info!("Resolved {} mask(s) to {} file(s)", masks.len(), files.len());
        files
    }

    fn expand_mask(&self, mask: &Mask, files: &mut FileList) {
        let glob = match GlobPattern::compile(&mask.pattern) {
            Ok(glob) => glob,
            Err(e) => {
                warn!("Ignoring mask '{}': {}", mask.raw, e);
                return;
            }
        };
        let entries = match fs::read_dir(&mask.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list {:?} for mask '{}': {}", mask.dir, mask.raw, e);
                return;
            }
        };

        let before = files.len();
        for entry in entries.flatten() {
            let path = entry.path();
            if DocumentKind::of(&path).is_none() || !path.is_file() {
                continue;
            }
            let name = entry.file_name();
            if glob.is_match(&name.to_string_lossy()) {
                files.push(path);
            }
        }
        debug!("Mask '{}' contributed {} file(s)", mask.raw, files.len() - before);
    }

    /// Order a picker selection: allowed extensions only, absolute, ascending
    pub fn sort_picked(&self, picked: Vec<PathBuf>) -> FileList {
        let mut files: FileList = picked
            .into_iter()
            .filter(|p| DocumentKind::of(p).is_some())
            .map(|p| self.absolute(&p))
            .collect();
        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        files
    }

    /// List a directory for the picker: subdirectories first, then allowed files
    pub fn list_directory(&self, dir: &Path) -> Result<Vec<DirEntry>, ViewerError> {
        let full_path = self.absolute(dir);
        debug!("Listing directory: {:?}", full_path);

        if !full_path.is_dir() {
            warn!("Path is not a directory: {:?}", full_path);
            return Err(ViewerError::NotFound);
        }

        let mut result = Vec::new();
        for entry in fs::read_dir(&full_path)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            let is_dir = path.is_dir();
            if !is_dir && DocumentKind::of(&path).is_none() {
                continue;
            }
            let modified = if is_dir { None } else { last_modified(&path) };
            result.push(DirEntry { name, is_dir, path, modified });
        }

        result.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        info!("Listed directory {:?}, found {} entries", full_path, result.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "x").unwrap();
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn masks_without_directory_use_cwd() {
        let dir = tempdir().unwrap();
        let service = FileService::new(dir.path().to_path_buf());
        let mask = service.parse_mask("*.md");
        assert_eq!(mask.dir, dir.path());
        assert_eq!(mask.pattern, "*.md");

        let nested = service.parse_mask("docs/ch?.md");
        assert_eq!(nested.dir, dir.path().join("docs"));
        assert_eq!(nested.pattern, "ch?.md");
    }

    #[test]
    fn only_allowed_extensions_are_returned() {
        let dir = tempdir().unwrap();
        for name in ["a.md", "b.MARKDOWN", "c.htm", "d.Html", "e.txt", "f.mdx", "g"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("folder.md")).unwrap();
        let service = FileService::new(dir.path().to_path_buf());

        let files = service.expand(&["*".to_string()]);
        assert_eq!(names(&files), vec!["d.Html", "c.htm", "b.MARKDOWN", "a.md"]);
        assert!(files.iter().all(|p| p.is_absolute()));
        assert!(files.iter().all(|p| DocumentKind::of(p).is_some()));
    }

    #[test]
    fn mask_order_is_descending_and_picker_order_ascending() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.md");
        touch(dir.path(), "b.md");
        let service = FileService::new(dir.path().to_path_buf());

        let masked = service.expand(&["a.md".to_string(), "b.md".to_string()]);
        assert_eq!(names(&masked), vec!["b.md", "a.md"]);

        let picked = service.sort_picked(vec![dir.path().join("b.md"), dir.path().join("a.md")]);
        assert_eq!(names(&picked), vec!["a.md", "b.md"]);
    }

    #[test]
    fn overlapping_masks_keep_duplicates() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "guide.md");
        let service = FileService::new(dir.path().to_path_buf());

        let files = service.expand(&["*.md".to_string(), "g*".to_string()]);
        assert_eq!(names(&files), vec!["guide.md", "guide.md"]);
    }

    #[test]
    fn unreadable_or_empty_masks_contribute_nothing() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "notes.md");
        let service = FileService::new(dir.path().to_path_buf());

        assert!(service.expand(&["missing/*.md".to_string()]).is_empty());
        assert!(service.expand(&["*.html".to_string()]).is_empty());
        assert!(service.expand(&[]).is_empty());
        let files = service.expand(&["missing/*.md".to_string(), "*.md".to_string()]);
        assert_eq!(names(&files), vec!["notes.md"]);
    }

    #[test]
    fn directory_masks_scan_that_directory_only() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs/deep")).unwrap();
        touch(&dir.path().join("docs"), "intro.md");
        touch(&dir.path().join("docs/deep"), "inner.md");
        touch(dir.path(), "top.md");
        let service = FileService::new(dir.path().to_path_buf());

        let files = service.expand(&["docs/*.md".to_string()]);
        assert_eq!(files, vec![dir.path().join("docs").join("intro.md")]);
    }

    #[test]
    fn picker_selection_drops_foreign_extensions() {
        let dir = tempdir().unwrap();
        let service = FileService::new(dir.path().to_path_buf());
        let picked = service.sort_picked(vec![
            PathBuf::from("z.htm"),
            PathBuf::from("notes.txt"),
            PathBuf::from("m.md"),
        ]);
        assert_eq!(picked, vec![dir.path().join("m.md"), dir.path().join("z.htm")]);
    }

    #[test]
    fn picker_listing_puts_directories_first_and_hides_dotfiles() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        touch(dir.path(), "Alpha.md");
        touch(dir.path(), "beta.html");
        touch(dir.path(), "image.png");
        touch(dir.path(), ".hidden.md");
        let service = FileService::new(dir.path().to_path_buf());

        let entries = service.list_directory(Path::new("")).unwrap();
        let listed: Vec<(&str, bool)> = entries.iter().map(|e| (e.name.as_str(), e.is_dir)).collect();
        assert_eq!(listed, vec![("zeta", true), ("Alpha.md", false), ("beta.html", false)]);
        assert!(entries[1].modified.is_some());
        assert!(entries[0].modified.is_none());
    }

    #[test]
    fn listing_a_missing_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let service = FileService::new(dir.path().to_path_buf());
        assert!(matches!(
            service.list_directory(Path::new("nope")),
            Err(ViewerError::NotFound)
        ));
    }
}
