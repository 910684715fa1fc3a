//! Configuration management for the Suno Player.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Every value has a sensible default, so a fresh
//! install works without any configuration at all.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults
//!
//! The individual getters are resolved once into a [`Settings`] value which is
//! handed to the token store, the API client and the acquisition backends.

use dotenv;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::Res;

pub const DEFAULT_API_URL: &str = "https://studio-api.prod.suno.com";
pub const DEFAULT_DEVICE_ID: &str = "8f955be9-40b8-496e-9a05-c12b86abd5f8";
pub const DEFAULT_CREATE_URL: &str = "https://suno.com/create";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the application directory if it doesn't exist and loads
/// environment variables from `sunoplayer/.env` inside the platform-specific
/// local data directory.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/sunoplayer/.env`
/// - macOS: `~/Library/Application Support/sunoplayer/.env`
/// - Windows: `%LOCALAPPDATA%/sunoplayer/.env`
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// exists but cannot be parsed. A missing `.env` file is not an error since
/// every setting has a default.
pub async fn load_env() -> Res<()> {
    load_env_from(&data_dir()).await
}

/// Loads `dir/.env`, creating `dir` first.
pub async fn load_env_from(dir: &Path) -> Res<()> {
    async_fs::create_dir_all(dir).await?;

    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path)?;
    Ok(())
}

/// Platform data directory for the application, `<data_local_dir>/sunoplayer`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sunoplayer");
    path
}

/// Base directory holding the cached token and temporary playback files.
///
/// Reads `SUNO_PLAYER_HOME`, falling back to [`data_dir`].
pub fn player_home() -> PathBuf {
    env::var("SUNO_PLAYER_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir())
}

/// Base URL of the Suno studio API (`SUNO_API_URL`).
pub fn suno_api_url() -> String {
    env::var("SUNO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Device identifier sent in the `Device-Id` header (`SUNO_DEVICE_ID`).
pub fn suno_device_id() -> String {
    env::var("SUNO_DEVICE_ID").unwrap_or_else(|_| DEFAULT_DEVICE_ID.to_string())
}

/// Page the browser is sent to for signing in (`SUNO_CREATE_URL`).
pub fn suno_create_url() -> String {
    env::var("SUNO_CREATE_URL").unwrap_or_else(|_| DEFAULT_CREATE_URL.to_string())
}

/// Address of a running WebDriver server such as chromedriver (`SUNO_WEBDRIVER_URL`).
pub fn webdriver_url() -> String {
    env::var("SUNO_WEBDRIVER_URL").unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string())
}

/// Whether the automated browser runs headless (`SUNO_BROWSER_HEADLESS`).
///
/// Defaults to `false` since the user has to log in through the window.
pub fn browser_headless() -> bool {
    env::var("SUNO_BROWSER_HEADLESS")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Request timeout for API calls in seconds (`SUNO_HTTP_TIMEOUT_SECS`).
pub fn http_timeout_secs() -> u64 {
    env::var("SUNO_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
}

/// Resolved configuration passed explicitly to the components that need it.
#[derive(Debug, Clone)]
pub struct Settings {
    pub home: PathBuf,
    pub api_url: String,
    pub device_id: String,
    pub create_url: String,
    pub webdriver_url: String,
    pub headless: bool,
    pub http_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            home: player_home(),
            api_url: suno_api_url(),
            device_id: suno_device_id(),
            create_url: suno_create_url(),
            webdriver_url: webdriver_url(),
            headless: browser_headless(),
            http_timeout: Duration::from_secs(http_timeout_secs()),
        }
    }

    /// Defaults rooted at `home`, ignoring the environment.
    pub fn with_home(home: PathBuf) -> Self {
        Self {
            home,
            api_url: DEFAULT_API_URL.to_string(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            create_url: DEFAULT_CREATE_URL.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Temporary file used to stage audio before playback.
    pub fn playback_file(&self) -> PathBuf {
        self.home.join("temp_play.mp3")
    }
}
