use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use pulldown_cmark::{html, Options, Parser};

use crate::errors::ViewerError;
use crate::types::DocumentKind;
use crate::utils::{escape_html, find_ignore_ascii_case};

/// Stylesheet used when no custom theme is configured or it cannot be read
pub const DEFAULT_CSS: &str = include_str!("../../static/default.css");

/// Print rules appended after the theme so they win at equal specificity
pub const PRINT_CSS: &str = r#"@media print {
  @page { margin: 0; }
  html, body { margin: 0; }
  body { padding: 1.6cm 1.8cm; max-width: none; font-size: 11pt; }
  h1 { font-size: 20pt; }
  h2 { font-size: 16pt; }
  h3 { font-size: 13pt; }
  h4, h5, h6 { font-size: 11pt; }
  pre, code, kbd, samp { font-size: 9pt; }
  pre, blockquote { page-break-inside: avoid; break-inside: avoid; }
}"#;

/// Display stylesheet source, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Theme {
    Builtin,
    Custom(PathBuf),
}

impl Theme {
    /// Resolve `--css`; relative paths are taken from `cwd`, missing files fall back to the builtin theme
    pub fn resolve(css: Option<&Path>, cwd: &Path) -> Self {
        let Some(css) = css else {
            return Theme::Builtin;
        };
        let path = if css.is_absolute() { css.to_path_buf() } else { cwd.join(css) };
        if path.is_file() {
            info!("Using stylesheet {:?}", path);
            Theme::Custom(path)
        } else {
            warn!("Stylesheet {:?} not found, using the default theme", path);
            Theme::Builtin
        }
    }

    /// Theme CSS, read fresh from disk for custom themes
    pub fn css(&self) -> String {
        match self {
            Theme::Builtin => DEFAULT_CSS.to_string(),
            Theme::Custom(path) => fs::read_to_string(path).unwrap_or_else(|e| {
                warn!("Cannot read stylesheet {:?} ({}), using the default theme", path, e);
                DEFAULT_CSS.to_string()
            }),
        }
    }
}

/// External Markdown to HTML converter
#[derive(Debug, Clone)]
pub struct Converter {
    program: String,
    prefix: Vec<OsString>,
    scratch: PathBuf,
    available: bool,
}

impl Converter {
    pub const DEFAULT_PROGRAM: &'static str = "pandoc";

    /// Look `program` up on `PATH`; the converter is still created when it is missing
    pub fn detect(program: &str, scratch: PathBuf) -> Self {
        let available = find_in_path(program).is_some();
        if available {
            debug!("Found converter '{}' on PATH", program);
        } else {
            warn!(
                "Converter '{}' not found on PATH; Markdown falls back to the built-in renderer",
                program
            );
        }
        Self { program: program.to_string(), prefix: Vec::new(), scratch, available }
    }

    /// Run `program` with `prefix` arguments ahead of the conversion arguments
    pub fn with_launcher(program: &str, prefix: Vec<OsString>, scratch: PathBuf) -> Self {
        Self { program: program.to_string(), prefix, scratch, available: true }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn args(&self, source: &Path) -> Vec<OsString> {
        let mut args = self.prefix.clone();
        args.extend(
            [
                "--from=markdown",
                "--to=html5",
                "--standalone",
                "--embed-resources",
                "--highlight-style=pygments",
                "--mathml",
            ]
            .map(OsString::from),
        );
        if let Some(dir) = source.parent() {
            let mut resource = OsString::from("--resource-path=");
            resource.push(dir);
            args.push(resource);
        }
        if let Some(stem) = source.file_stem() {
            let mut title = OsString::from("--metadata=pagetitle:");
            title.push(stem);
            args.push(title);
        }
        let mut output = OsString::from("--output=");
        output.push(&self.scratch);
        args.push(output);
        args.push(source.as_os_str().to_owned());
        args
    }

    /// Convert `source` into a standalone HTML document, blocking until the converter exits
    pub fn convert(&self, source: &Path) -> Result<String, ViewerError> {
        // A previous render must never be read back as this one's output
        match fs::remove_file(&self.scratch) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!("Cannot clear scratch file {:?}: {}", self.scratch, e);
                return Err(ViewerError::Write { path: self.scratch.clone(), source: e });
            }
            _ => {}
        }

        debug!("Running {} on {:?}", self.program, source);
        let status = Command::new(&self.program)
            .args(self.args(source))
            .status()
            .map_err(|e| ViewerError::ConverterLaunch { program: self.program.clone(), source: e })?;
        if !status.success() {
            return Err(ViewerError::Conversion { path: source.to_path_buf(), code: status.code() });
        }
        fs::read_to_string(&self.scratch).map_err(|e| {
            warn!("Converter left no readable output in {:?}: {}", self.scratch, e);
            ViewerError::Conversion { path: source.to_path_buf(), code: status.code() }
        })
    }
}

/// Locate an executable on `PATH`
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// Service producing displayable HTML for a document
#[derive(Debug, Clone)]
pub struct RenderService {
    theme: Theme,
    converter: Converter,
}

impl RenderService {
    pub fn new(theme: Theme, converter: Converter) -> Self {
        Self { theme, converter }
    }

    /// Render `path`: HTML passes through untouched, Markdown is converted and styled
    pub fn render(&self, path: &Path) -> Result<String, ViewerError> {
        let start_time = std::time::Instant::now();
        let html = match DocumentKind::of(path) {
            Some(DocumentKind::Html) => read_text(path)?,
            Some(DocumentKind::Markdown) => self.render_markdown(path)?,
            None => return Err(ViewerError::Unsupported(path.to_path_buf())),
        };
        info!("Rendered {:?} in {}ms", path, start_time.elapsed().as_millis());
        Ok(html)
    }

    fn render_markdown(&self, path: &Path) -> Result<String, ViewerError> {
        fs::metadata(path).map_err(|e| ViewerError::Read { path: path.to_path_buf(), source: e })?;
        let document = if self.converter.is_available() {
            self.converter.convert(path)?
        } else {
            builtin_markdown(path)?
        };
        Ok(inject_styles(&document, &self.theme.css()))
    }
}

fn read_text(path: &Path) -> Result<String, ViewerError> {
    fs::read_to_string(path).map_err(|e| ViewerError::Read { path: path.to_path_buf(), source: e })
}

/// Degraded-mode conversion used when the external converter is missing
fn builtin_markdown(path: &Path) -> Result<String, ViewerError> {
    let content = read_text(path)?;
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut body = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut body, Parser::new_ext(&content, options));

    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(&title),
        body
    ))
}

/// Insert the theme and print rules right before `</head>`; documents without one are returned as is
pub fn inject_styles(document: &str, css: &str) -> String {
    let Some(pos) = find_ignore_ascii_case(document, "</head>") else {
        debug!("No </head> found, leaving document unstyled");
        return document.to_string();
    };
    let mut out = String::with_capacity(document.len() + css.len() + PRINT_CSS.len() + 32);
    out.push_str(&document[..pos]);
    out.push_str("<style>\n");
    out.push_str(css);
    out.push('\n');
    out.push_str(PRINT_CSS);
    out.push_str("\n</style>\n");
    out.push_str(&document[pos..]);
    out
}
