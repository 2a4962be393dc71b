use crate::auth::{AuthSession, FileCredentialStore, GoogleOAuth};
use crate::cache::LocalCache;
use crate::config::{self, AppPaths, Settings};
use crate::error::AppResult;
use crate::launcher::SystemLauncher;
use crate::output::Output;

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub verbose: u8,
    pub paths: AppPaths,
    pub settings: Settings,
    pub credentials: FileCredentialStore,
    pub oauth: GoogleOAuth,
    pub cache: LocalCache,
    pub launcher: SystemLauncher,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool, verbose: u8) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let credentials = FileCredentialStore::new(paths.credentials_dir(&profile));
        let oauth = GoogleOAuth::new(settings.clone());
        let cache = LocalCache::new(paths.cache_dir(&profile));
        let launcher = SystemLauncher::new(settings.launcher_app(), settings.search_keyword());
        let output = Output::new(json);

        tracing::debug!(%profile, config_dir = %paths.config_dir().display(), "context ready");

        Ok(Self {
            profile,
            verbose,
            paths,
            settings,
            credentials,
            oauth,
            cache,
            launcher,
            output,
        })
    }

    pub fn session(&self) -> AuthSession<'_> {
        AuthSession::new(
            &self.credentials,
            &self.oauth,
            self.settings.credential_key(),
            self.settings.api_base_url(),
        )
    }
}
