use std::path::Path;

use log::debug;

use crate::errors::ViewerError;
use crate::types::ViewState;
use crate::utils::{escape_attr, escape_html, find_ignore_ascii_case};

/// Mount point for resources next to the current document
pub const DOC_BASE: &str = "/doc/";

/// Component for the documents and chrome the viewer shows around rendered files
pub struct TemplateComponent;

impl TemplateComponent {
    /// Create a new template component
    pub fn new() -> Self {
        Self
    }

    /// Inline document shown in place of a file that failed to render
    pub fn error_document(&self, path: &Path, error: &ViewerError) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        format!(
            r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{name}</title>
    <style>
        body {{ font-family: sans-serif; margin: 3em auto; max-width: 40em; color: #1f2328; }}
        .error-title {{ color: #cf222e; }}
        .error-path {{ color: #59636e; word-break: break-all; }}
        pre {{ background: #f6f8fa; padding: 1em; white-space: pre-wrap; }}
    </style>
</head>
<body>
    <h1 class="error-title">Cannot display {name}</h1>
    <p class="error-path">{path}</p>
    <pre>{error}</pre>
</body>
</html>"#,
            name = escape_html(&name),
            path = escape_html(&path.display().to_string()),
            error = escape_html(&error.to_string()),
        )
    }

    /// Placeholder shown while no file is loaded
    pub fn empty_document(&self) -> String {
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>mdview</title>
    <style>
        body { font-family: sans-serif; margin: 3em auto; max-width: 40em; color: #1f2328; }
        kbd { border: 1px solid #d1d9e0; border-radius: 4px; padding: 0 0.3em; }
    </style>
</head>
<body>
    <h1>No documents</h1>
    <p>Nothing matched. Press <kbd>o</kbd> or <a href="/open">open files</a>.</p>
</body>
</html>"#
            .to_string()
    }

    /// Wrap a displayed document with the viewer chrome: base URL, state and key handling
    pub fn render_viewer_page(&self, document: &str, state: &ViewState) -> String {
        debug!("Rendering viewer page for '{}'", state.title);
        let base = format!("<base href=\"{}\">", escape_attr(DOC_BASE));
        let bootstrap = serde_json::to_string(state)
            .unwrap_or_else(|_| "{}".to_string())
            .replace("</", "<\\/");
        let chrome = format!(
            "<link rel=\"stylesheet\" href=\"/static/viewer.css\">\
             <script>window.MDVIEW = {bootstrap};</script>\
             <script src=\"/static/viewer.js\"></script>"
        );

        let mut page = String::with_capacity(document.len() + base.len() + chrome.len());
        match head_open_end(document) {
            Some(at) => {
                page.push_str(&document[..at]);
                page.push_str(&base);
                page.push_str(&document[at..]);
            }
            None => {
                page.push_str("<head>");
                page.push_str(&base);
                page.push_str("</head>");
                page.push_str(document);
            }
        }

        match find_ignore_ascii_case(&page, "</body>") {
            Some(at) => page.insert_str(at, &chrome),
            None => page.push_str(&chrome),
        }
        page
    }
}

impl Default for TemplateComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset just past the `<head ...>` start tag
fn head_open_end(document: &str) -> Option<usize> {
    let mut from = 0;
    loop {
        let at = from + find_ignore_ascii_case(&document[from..], "<head")?;
        let after = at + "<head".len();
        match document.as_bytes().get(after) {
            Some(b'>') => return Some(after + 1),
            Some(b) if b.is_ascii_whitespace() => {
                return document[after..].find('>').map(|i| after + i + 1);
            }
            _ => from = after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn state() -> ViewState {
        ViewState {
            title: "a.md [1/2]".to_string(),
            file: Some("/tmp/a.md".to_string()),
            zoom: 1.0,
            query: "</script>".to_string(),
            match_count: 0,
            current_match: None,
        }
    }

    #[test]
    fn error_document_escapes_details() {
        let templates = TemplateComponent::new();
        let err = ViewerError::Unsupported(PathBuf::from("<x>.txt"));
        let html = templates.error_document(Path::new("/docs/<x>.md"), &err);
        assert!(html.contains("Cannot display &lt;x&gt;.md"));
        assert!(html.contains("unsupported file type: &lt;x&gt;.txt"));
        assert!(!html.contains("<x>"));
    }

    #[test]
    fn chrome_goes_after_head_open_and_before_body_close() {
        let templates = TemplateComponent::new();
        let doc = "<html><head lang=\"en\"><title>t</title><header-x></header-x></head><body><p>x</p></BODY></html>";
        let page = templates.render_viewer_page(doc, &state());

        assert!(page.starts_with("<html><head lang=\"en\"><base href=\"/doc/\"><title>t</title>"));
        let script = page.find("/static/viewer.js").unwrap();
        assert!(page.find("<p>x</p>").unwrap() < script);
        assert!(script < page.find("</BODY>").unwrap());
    }

    #[test]
    fn bootstrap_state_cannot_close_the_script() {
        let templates = TemplateComponent::new();
        let page = templates.render_viewer_page("<p>fragment</p>", &state());
        assert!(page.starts_with("<head><base href=\"/doc/\"></head><p>fragment</p>"));
        assert!(page.contains("<\\/script>"));
        assert_eq!(page.matches("</script>").count(), 2);
    }

    #[test]
    fn head_lookup_skips_similar_elements() {
        assert_eq!(head_open_end("<header><head>"), Some(14));
        assert_eq!(head_open_end("<body></body>"), None);
    }
}
