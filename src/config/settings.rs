use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8787/callback";
const DEFAULT_CREDENTIAL_KEY: &str = "gmail_credentials";
const DEFAULT_API_BASE_URL: &str = "https://gmail.googleapis.com";
const DEFAULT_LAUNCHER_APP: &str = "Alfred 2";
const DEFAULT_SEARCH_KEYWORD: &str = "gmail";
const DEFAULT_MAIL_WEB_URL: &str = "https://mail.google.com/mail/u/0/?ui=2&pli=1#inbox/";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub credential_key: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub launcher_app: Option<String>,
    #[serde(default)]
    pub search_keyword: Option<String>,
    #[serde(default)]
    pub mail_web_url: Option<String>,
}

impl Settings {
    pub fn client_id(&self) -> AppResult<&str> {
        self.client_id.as_deref().ok_or_else(|| {
            AppError::Config(
                "missing oauth client_id in profile settings. run `gmail-launcher auth login`"
                    .to_string(),
            )
        })
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }

    /// Name of the single credential slot in the credential store.
    pub fn credential_key(&self) -> &str {
        non_blank(self.credential_key.as_deref()).unwrap_or(DEFAULT_CREDENTIAL_KEY)
    }

    pub fn api_base_url(&self) -> &str {
        non_blank(self.api_base_url.as_deref()).unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn launcher_app(&self) -> &str {
        non_blank(self.launcher_app.as_deref()).unwrap_or(DEFAULT_LAUNCHER_APP)
    }

    pub fn search_keyword(&self) -> &str {
        non_blank(self.search_keyword.as_deref()).unwrap_or(DEFAULT_SEARCH_KEYWORD)
    }

    pub fn message_url(&self, message_id: &str) -> String {
        let base = non_blank(self.mail_web_url.as_deref()).unwrap_or(DEFAULT_MAIL_WEB_URL);
        format!("{base}{message_id}")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}

pub fn save(path: PathBuf, settings: &Settings) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(&path, payload)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}
