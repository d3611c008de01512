//! Runtime configuration loaded from the environment.
//!
//! Call `dotenvy::dotenv()` at the binary edge before [`Config::from_env`]
//! so a local `.env` file can override the defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Hosted detection service used when `IBROOD_API_URL` is not set.
const DEFAULT_API_URL: &str = "https://rozu1726-ibrood-app.hf.space";

/// Default bind address for the HTTP gateway.
const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted analysis history.
    pub data_dir: PathBuf,
    /// Directory holding bundled model folders served by the gateway.
    pub models_dir: PathBuf,
    /// Bind address for the HTTP gateway.
    pub bind: SocketAddr,
    /// External detection service settings.
    pub inference: InferenceConfig,
}

/// Settings for the external detection service client.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL of the hosted detection service.
    pub api_url: String,
    /// Base URL of a local development service tried when the hosted one
    /// is unreachable.
    pub local_api_url: Option<String>,
    /// Request timeout against the hosted service.
    pub timeout: Duration,
    /// Request timeout against the local development service.
    pub local_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            local_api_url: None,
            timeout: Duration::from_secs(30),
            local_timeout: Duration::from_secs(3),
        }
    }
}

impl Config {
    /// Build the configuration from environment variables, falling back
    /// to platform defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("IBROOD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let models_dir = std::env::var("IBROOD_MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/MODELS"));

        let bind = std::env::var("IBROOD_BIND")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND));

        let inference = InferenceConfig {
            api_url: std::env::var("IBROOD_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            local_api_url: std::env::var("IBROOD_LOCAL_API_URL").ok(),
            ..InferenceConfig::default()
        };

        Self {
            data_dir,
            models_dir,
            bind,
            inference,
        }
    }
}

/// Platform data directory for the app, e.g. `~/.local/share/ibrood`.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ibrood")
}
