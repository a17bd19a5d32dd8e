use std::path::Path;

use log::{debug, info};

use crate::types::DirEntry;
use crate::utils::{encode_query_value, escape_attr, escape_html};

/// Component for the interactive multi-file picker page
pub struct PickerComponent;

impl PickerComponent {
    /// Create a new picker component
    pub fn new() -> Self {
        debug!("Creating new PickerComponent");
        Self
    }

    /// Build the picker page for `dir` and its entries
    pub fn render_page(&self, dir: &Path, entries: &[DirEntry]) -> String {
        let start_time = std::time::Instant::now();
        let dir_display = dir.display().to_string();

        let mut html = String::new();
        html.push_str("<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
        html.push_str("<title>Open files</title>");
        html.push_str("<link rel=\"stylesheet\" href=\"/static/viewer.css\"></head>");
        html.push_str("<body class=\"mdview-picker\">");
        html.push_str(&format!("<h1>Open files</h1><p class=\"picker-dir\">{}</p>", escape_html(&dir_display)));

        if let Some(parent) = dir.parent() {
            html.push_str(&format!(
                "<p><a href=\"/open?dir={}\">⬑ Up</a></p>",
                escape_attr(&encode_query_value(&parent.display().to_string()))
            ));
        }

        html.push_str("<form id=\"picker\"><ul class=\"listing\">\n");
        for entry in entries {
            let path = entry.path.display().to_string();
            if entry.is_dir {
                html.push_str(&format!(
                    "  <li class=\"dir\"><a href=\"/open?dir={}\">{}/</a></li>\n",
                    escape_attr(&encode_query_value(&path)),
                    escape_html(&entry.name)
                ));
            } else {
                html.push_str(&format!(
                    "  <li><label><input type=\"checkbox\" name=\"file\" value=\"{}\"> {}</label>",
                    escape_attr(&path),
                    escape_html(&entry.name)
                ));
                if let Some(modified) = &entry.modified {
                    html.push_str(&format!(" <span class=\"meta\">{}</span>", escape_html(modified)));
                }
                html.push_str("</li>\n");
            }
        }
        html.push_str("</ul>");
        if !entries.iter().any(|e| !e.is_dir) {
            html.push_str("<p class=\"no-results\">No Markdown or HTML files here.</p>");
        }
        html.push_str("<p><button type=\"submit\">Open</button> <a href=\"/\">Cancel</a></p></form>");
        html.push_str("<script src=\"/static/viewer.js\"></script></body></html>");

        info!(
            "Picker page for {:?} built in {}ms with {} entries",
            dir,
            start_time.elapsed().as_millis(),
            entries.len()
        );
        html
    }
}

impl Default for PickerComponent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(name: &str, is_dir: bool) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            is_dir,
            path: PathBuf::from("/docs").join(name),
            modified: (!is_dir).then(|| "2026-01-02T03:04:05Z".to_string()),
        }
    }

    #[test]
    fn directories_link_and_files_get_checkboxes() {
        let picker = PickerComponent::new();
        let page = picker.render_page(
            Path::new("/docs"),
            &[entry("drafts & notes", true), entry("guide.md", false)],
        );
        assert!(page.contains("<a href=\"/open?dir=%2Fdocs%2Fdrafts%20%26%20notes\">drafts &amp; notes/</a>"));
        assert!(page.contains("value=\"/docs/guide.md\"> guide.md</label>"));
        assert!(page.contains("2026-01-02T03:04:05Z"));
        assert!(page.contains("/open?dir=%2F\""));
        assert!(!page.contains("No Markdown or HTML files here."));
    }

    #[test]
    fn empty_directories_say_so() {
        let page = PickerComponent::new().render_page(Path::new("/docs"), &[entry("sub", true)]);
        assert!(page.contains("No Markdown or HTML files here."));
    }
}
