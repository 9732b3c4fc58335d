// Configuration - layered runtime settings
//
// Sources, later ones win:
// 1. built-in defaults
// 2. `$XDG_CONFIG_HOME/video-fetch-api/config.toml`
// 3. `video-fetch-api.toml` in the working directory
// 4. the file named by `VIDEO_FETCH_CONFIG` (must exist when set)
// 5. `VIDEO_FETCH__SECTION__KEY` environment variables
// 6. `PORT`, for hosting platforms that inject it

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::downloader::extractors::ExtractorMode;

const APP_NAME: &str = "video-fetch-api";
const ENV_PREFIX: &str = "VIDEO_FETCH";
const CONFIG_PATH_VAR: &str = "VIDEO_FETCH_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),

    #[error("invalid listen address {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub extractor: ExtractorSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Default tracing filter, `RUST_LOG` overrides it
    pub log_filter: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_filter: "video_fetch_lib=info,video_fetch_api=info,tower_http=info".to_string(),
        }
    }
}

impl ServerSettings {
    /// Listen address. `host` is an IPv4/IPv6 literal (brackets optional) or a
    /// resolvable name such as `localhost`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self
            .host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']');

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        (host, self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Flat directory holding every artifact
    pub download_dir: PathBuf,
    /// Artifacts older than this are deleted by the sweeper
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            retention_secs: 60 * 60,
            sweep_interval_secs: 10 * 60,
        }
    }
}

impl StorageSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    pub mode: ExtractorMode,
    /// Explicit yt-dlp binary, otherwise searched in common locations
    pub ytdlp_path: Option<String>,
    /// Python interpreter with the yt_dlp module installed
    pub python_path: Option<String>,
    /// Passed to yt-dlp as `--socket-timeout`
    pub socket_timeout_secs: u32,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    pub audio_codec: String,
    pub audio_bitrate_kbps: u32,
    /// Byte budget for the title part of artifact names, clamped to fit the filesystem limit
    pub title_max_len: usize,
    /// YouTube player clients in preference order
    pub player_clients: Vec<String>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Auto,
            ytdlp_path: None,
            python_path: None,
            socket_timeout_secs: 30,
            proxy: None,
            cookies_path: None,
            audio_codec: "mp3".to_string(),
            audio_bitrate_kbps: 192,
            title_max_len: 80,
            player_clients: vec!["android".to_string(), "web".to_string()],
        }
    }
}

impl Settings {
    /// Load settings from files and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(dir) = dirs::config_dir() {
            let path = dir.join(APP_NAME).join("config.toml");
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(File::with_name(APP_NAME).required(false));

        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("extractor.player_clients"),
        );

        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse settings from TOML text on top of the defaults
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
