use std::path::PathBuf;

use clap::Parser;

use crate::services::Converter;

/// Command-line arguments accepted by the `mdview` binary.
#[derive(Parser, Debug)]
#[command(
    name = "mdview",
    version,
    about = "View local Markdown and HTML files in the browser",
    after_help = "Keys: 0/$ first/last, j/k previous/next file, / search, n/N next/previous match,\n\
                  +/-/= zoom, g top, p print, w save as HTML, o open files, q quit"
)]
pub struct Cli {
    /// File masks such as `*.md` or `docs/ch??.markdown`; without masks a file picker opens
    #[arg(value_name = "MASK")]
    pub masks: Vec<String>,

    /// Stylesheet applied to Markdown documents
    #[arg(long, value_name = "FILE")]
    pub css: Option<PathBuf>,

    /// Render the first matching file to FILE and exit without opening a viewer
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Port for the local viewer (0 picks a free one)
    #[arg(long, env = "MDVIEW_PORT", default_value_t = 0)]
    pub port: u16,

    /// Markdown converter executable
    #[arg(long, env = "MDVIEW_CONVERTER", default_value = Converter::DEFAULT_PROGRAM)]
    pub converter: String,

    /// Do not launch the browser
    #[arg(long)]
    pub no_browser: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_and_options_parse() {
        let cli = Cli::try_parse_from(["mdview", "*.md", "--css", "dark.css", "docs/?.html"]).unwrap();
        assert_eq!(cli.masks, vec!["*.md", "docs/?.html"]);
        assert_eq!(cli.css, Some(PathBuf::from("dark.css")));
        assert!(cli.output.is_none());
        assert!(!cli.no_browser);
    }

    #[test]
    fn masks_are_optional() {
        let cli = Cli::try_parse_from(["mdview", "--output", "out.html"]).unwrap();
        assert!(cli.masks.is_empty());
        assert_eq!(cli.output, Some(PathBuf::from("out.html")));
    }

    #[test]
    fn help_is_not_an_error_exit() {
        let err = Cli::try_parse_from(["mdview", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }
}
