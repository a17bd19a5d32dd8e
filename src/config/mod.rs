use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::services::{Converter, FileService, RenderService, Theme};

/// Single scratch file the converter writes to; renders are serialized by the session
pub const SCRATCH_FILE: &str = "mdview-render.html";

/// Application configuration, resolved once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub cwd: PathBuf,
    pub theme: Theme,
    pub converter: Converter,
    pub host: IpAddr,
    pub port: u16,
    pub open_browser: bool,
}

impl Config {
    /// Resolve the command line against `cwd`; warns about a missing stylesheet or converter
    pub fn from_cli(cli: &Cli, cwd: PathBuf) -> Self {
        let theme = Theme::resolve(cli.css.as_deref(), &cwd);
        let converter = Converter::detect(&cli.converter, Self::scratch_path());
        Self {
            cwd,
            theme,
            converter,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: cli.port,
            open_browser: !cli.no_browser,
        }
    }

    pub fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(SCRATCH_FILE)
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn renderer(&self) -> RenderService {
        RenderService::new(self.theme.clone(), self.converter.clone())
    }

    pub fn file_service(&self) -> FileService {
        FileService::new(self.cwd.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn relative_stylesheet_resolves_against_cwd() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("site.css"), "body {}").unwrap();
        let cli = Cli::try_parse_from(["mdview", "--css", "site.css", "--no-browser"]).unwrap();

        let config = Config::from_cli(&cli, dir.path().to_path_buf());
        assert_eq!(config.theme, Theme::Custom(dir.path().join("site.css")));
        assert!(!config.open_browser);
        assert!(config.socket_addr().ip().is_loopback());
    }

    #[test]
    fn missing_stylesheet_is_only_a_warning() {
        let dir = tempdir().unwrap();
        let cli = Cli::try_parse_from(["mdview", "--css", "gone.css", "--converter", "mdview-no-such-converter"])
            .unwrap();

        let config = Config::from_cli(&cli, dir.path().to_path_buf());
        assert_eq!(config.theme, Theme::Builtin);
        assert!(!config.converter.is_available());
        assert_eq!(config.converter.scratch(), Config::scratch_path());
    }
}
