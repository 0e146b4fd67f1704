//! Application configuration
//!
//! Layered: `config.ron` in the user config dir (or `--config <path>`), then the
//! `PIXELPULSE_API_URL` environment variable, then command line flags.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the platform config dir
pub const APP_DIR: &str = "pixelpulse";

/// Environment override for the backend base URL
pub const API_URL_ENV: &str = "PIXELPULSE_API_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Command line interface
#[derive(Parser, Debug, Default)]
#[command(name = "pixelpulse", version, about = "3D asset dashboard")]
pub struct Cli {
    /// Path to a config.ron file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend base URL (e.g. http://localhost:8000/api/)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Max log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Model files to open once the dashboard is shown (.glb, or .gltf plus its resources)
    pub files: Vec<PathBuf>,
}

/// Viewport tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Internal render resolution relative to the viewport (before anti-aliasing)
    pub render_scale: f32,
    /// Shadow map resolution (square)
    pub shadow_map_size: usize,
    /// Largest bounding-box dimension of a freshly loaded model
    pub target_size: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            render_scale: 0.5,
            shadow_map_size: 512,
            target_size: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub log_level: String,
    /// Overrides the OS color-scheme hint when set
    pub prefers_dark: Option<bool>,
    /// Where local storage lives (defaults to the config dir)
    pub storage_dir: Option<PathBuf>,
    pub viewer: ViewerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/".to_string(),
            log_level: "info".to_string(),
            prefers_dark: None,
            storage_dir: None,
            viewer: ViewerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default config directory (`<config_dir>/pixelpulse`)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    /// Read a config file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve the full configuration for this run
    ///
    /// Never fails: an unreadable file is reported and defaults are used.
    /// Returns the config plus any load error so it can be logged once the
    /// subscriber exists.
    pub fn resolve(cli: &Cli, env_api_url: Option<String>) -> (Self, Option<ConfigError>) {
        let path = cli
            .config
            .clone()
            .or_else(|| Self::config_dir().map(|d| d.join("config.ron")));

        let (mut config, error) = match path {
            Some(path) => match Self::load_from(&path) {
                Ok(config) => (config, None),
                Err(e) => (Self::default(), Some(e)),
            },
            None => (Self::default(), None),
        };

        if let Some(url) = env_api_url.filter(|u| !u.trim().is_empty()) {
            config.api_base_url = url;
        }
        if let Some(url) = &cli.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(level) = &cli.log_level {
            config.log_level = level.clone();
        }
        (config, error)
    }

    /// Directory for local storage
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir.clone().or_else(Self::config_dir)
    }

    /// Parsed log level, falling back to INFO
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// Join a backend endpoint onto the base URL (`login` → `{base}/login/`)
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/", self.api_base_url.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_config(path: PathBuf) -> Cli {
        Cli {
            config: Some(path),
            ..Cli::default()
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(prefers_dark: Some(true), viewer: (render_scale: 1.0))").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.prefers_dark, Some(true));
        assert_eq!(config.viewer.render_scale, 1.0);
        assert_eq!(config.viewer.target_size, 2.0);
        assert_eq!(config.api_base_url, "http://localhost:8000/api/");
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(api_base_url: ").unwrap();

        let (config, error) = AppConfig::resolve(&cli_with_config(path), None);
        assert_eq!(config, AppConfig::default());
        assert!(matches!(error, Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(api_base_url: \"http://file/api/\")").unwrap();

        let (config, _) = AppConfig::resolve(&cli_with_config(path.clone()), None);
        assert_eq!(config.api_base_url, "http://file/api/");

        let (config, _) = AppConfig::resolve(&cli_with_config(path.clone()), Some("http://env/api/".into()));
        assert_eq!(config.api_base_url, "http://env/api/");

        let mut cli = cli_with_config(path);
        cli.api_url = Some("http://cli/api/".into());
        let (config, _) = AppConfig::resolve(&cli, Some("http://env/api/".into()));
        assert_eq!(config.api_base_url, "http://cli/api/");
    }

    #[test]
    fn test_endpoint_join() {
        let mut config = AppConfig::default();
        assert_eq!(config.endpoint("login"), "http://localhost:8000/api/login/");
        config.api_base_url = "https://example.com/api".into();
        assert_eq!(config.endpoint("signup"), "https://example.com/api/signup/");
    }

    #[test]
    fn test_cli_parses_files() {
        let cli = Cli::parse_from(["pixelpulse", "--log-level", "debug", "scene.gltf", "scene.bin"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.files.len(), 2);
    }
}
