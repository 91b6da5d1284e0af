use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::api::models::SessionUser;
use crate::error::{Result, ShopError};

pub const BASE_URL_ENV: &str = "DIYSHOP_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    pub reply_delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self { reply_delay_ms: 1000 }
    }
}

impl AssistantConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_age_secs: 300 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppState {
    pub base_url: String,
    /// Keep the user logged in across launches.
    pub remember_me: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    pub assistant: AssistantConfig,
    pub cache: CacheConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "diyshop")?;
        Some(proj.config_dir().join("diyshop.toml"))
    }

    /// Loads the saved state, falling back to defaults; `DIYSHOP_BASE_URL` wins over the file.
    pub fn load() -> Self {
        let mut state = Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                state.base_url = crate::utils::normalize_url(&url);
            }
        }
        state
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
                return Self::new();
            }
        };
        match toml::from_str::<AppState>(&text) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("ignoring unparsable config {}: {e}", path.display());
                Self::new()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| ShopError::Config("no config directory".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(&self.persisted()).map_err(|e| ShopError::Config(e.to_string()))?;
        fs::write(path, toml)?;
        Ok(())
    }

    /// What goes to disk: the logged-in user only survives when remember-me is on.
    fn persisted(&self) -> AppState {
        let mut out = self.clone();
        if !out.remember_me {
            out.user = None;
        }
        out
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.remember_me = false;
    }
}

/// Entry point once logging and storage are up: log in if needed, then show the main screen.
pub async fn run() -> Result<()> {
    let mut state = AppState::load();
    let mut console = crate::utils::Console::new();
    loop {
        if state.user.is_none() || !state.is_configured() {
            if !crate::ui::login::show_login(&mut state, &mut console).await? {
                return Ok(());
            }
        }
        match crate::ui::main_window::show_main_window(&mut state, &mut console).await? {
            crate::ui::main_window::Exit::Logout => {
                state.logout();
                if let Err(e) = state.save() {
                    log::warn!("failed to save settings: {e}");
                }
            }
            crate::ui::main_window::Exit::Quit => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: 7,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: None,
            address: Some("12 Mabini St".into()),
            image_url: None,
            token: Some("tok".into()),
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load_from(&dir.path().join("nope.toml"));
        assert_eq!(state, AppState::default());
        assert_eq!(state.assistant.reply_delay(), Duration::from_secs(1));
    }

    #[test]
    fn remembered_session_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("diyshop.toml");
        let state = AppState {
            base_url: "https://shop.example.com/api".into(),
            remember_me: true,
            user: Some(user()),
            ..AppState::default()
        };
        state.save_to(&path).unwrap();
        assert_eq!(AppState::load_from(&path), state);
    }

    #[test]
    fn user_is_not_written_without_remember_me() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diyshop.toml");
        let state = AppState {
            base_url: "https://shop.example.com/api".into(),
            remember_me: false,
            user: Some(user()),
            ..AppState::default()
        };
        state.save_to(&path).unwrap();
        let loaded = AppState::load_from(&path);
        assert!(loaded.user.is_none());
        assert_eq!(loaded.base_url, state.base_url);
    }

    #[test]
    fn partial_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diyshop.toml");
        fs::write(&path, "base_url = \"http://10.0.2.2\"\n[assistant]\nreply_delay_ms = 250\n").unwrap();
        let state = AppState::load_from(&path);
        assert_eq!(state.base_url, "http://10.0.2.2");
        assert_eq!(state.assistant.reply_delay_ms, 250);
        assert_eq!(state.cache, CacheConfig::default());

        fs::write(&path, "base_url = [").unwrap();
        assert_eq!(AppState::load_from(&path), AppState::default());
    }

    #[test]
    fn logout_forgets_user() {
        let mut state = AppState {
            remember_me: true,
            user: Some(user()),
            ..AppState::default()
        };
        state.logout();
        assert!(state.user.is_none());
        assert!(!state.remember_me);
    }
}
