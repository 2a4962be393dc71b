use std::sync::Mutex;
use std::time::SystemTime;

use crate::api::client::GmailClient;
use crate::error::{AppError, AppResult};

use super::oauth::OAuthProvider;
use super::token::{AuthorizationToken, TokenSet, TokenValidity};
use super::token_store::CredentialStore;

/// Owns the credential lifecycle for one process invocation and hands out
/// authorized Gmail transports.
pub struct AuthSession<'a> {
    store: &'a dyn CredentialStore,
    provider: &'a dyn OAuthProvider,
    key: String,
    api_base_url: String,
    authorized: Mutex<Option<TokenSet>>,
}

impl<'a> AuthSession<'a> {
    pub fn new(
        store: &'a dyn CredentialStore,
        provider: &'a dyn OAuthProvider,
        key: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            key: key.into(),
            api_base_url: api_base_url.into(),
            authorized: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns a transport bound to a valid token.
    ///
    /// Fails with [`AppError::CredentialsUnavailable`] when nothing has ever
    /// been stored. An invalid token is renewed, by refresh when possible and
    /// otherwise by the interactive consent flow, and persisted before use.
    pub async fn ensure_authorized(&self) -> AppResult<GmailClient> {
        if let Some(token) = self.cached() {
            return Ok(self.transport(&token));
        }

        let stored = self.store.load(&self.key)?;
        let token = match stored.decode() {
            Some(token) if token.validity(SystemTime::now()) == TokenValidity::Valid => token,
            Some(token) => self.renew(&token).await?,
            None => {
                tracing::warn!(key = %self.key, "stored credential is malformed");
                self.authorize_interactive().await?
            }
        };

        let transport = self.transport(&token);
        if let Ok(mut slot) = self.authorized.lock() {
            *slot = Some(token);
        }
        Ok(transport)
    }

    async fn renew(&self, expired: &TokenSet) -> AppResult<TokenSet> {
        if expired.has_refresh_token() {
            match self.provider.refresh(expired).await {
                Ok(refreshed) => {
                    tracing::debug!(key = %self.key, "access token refreshed");
                    self.persist(&refreshed)?;
                    return Ok(refreshed);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "token refresh failed; reauthorizing");
                }
            }
        }

        self.authorize_interactive().await
    }

    async fn authorize_interactive(&self) -> AppResult<TokenSet> {
        let fresh = self.provider.authorize_interactive().await?;
        if fresh.validity(SystemTime::now()) != TokenValidity::Valid {
            return Err(AppError::Auth(
                "authorization flow returned an unusable token".to_string(),
            ));
        }

        self.persist(&fresh)?;
        tracing::info!(key = %self.key, "authorization stored");
        Ok(fresh)
    }

    fn persist(&self, token: &TokenSet) -> AppResult<()> {
        self.store
            .save(&self.key, &AuthorizationToken::encode(token)?)
    }

    fn cached(&self) -> Option<TokenSet> {
        let slot = self.authorized.lock().ok()?;
        slot.as_ref()
            .filter(|token| token.validity(SystemTime::now()) == TokenValidity::Valid)
            .cloned()
    }

    fn transport(&self, token: &TokenSet) -> GmailClient {
        GmailClient::new(&token.access_token).with_api_base(&self.api_base_url)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::auth::token_store::FileCredentialStore;

    const KEY: &str = "gmail_credentials";

    fn token(access: &str, expires_at_unix: Option<u64>, refresh: Option<&str>) -> TokenSet {
        TokenSet {
            access_token: access.to_string(),
            refresh_token: refresh.map(ToOwned::to_owned),
            expires_at_unix,
            token_type: Some("Bearer".to_string()),
            scope: None,
        }
    }

    #[derive(Default)]
    struct CountingProvider {
        interactive: AtomicUsize,
        refreshes: AtomicUsize,
        refresh_fails: bool,
        deny: bool,
    }

    #[async_trait]
    impl OAuthProvider for CountingProvider {
        async fn authorize_interactive(&self) -> AppResult<TokenSet> {
            self.interactive.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                return Err(AppError::AuthorizationDenied("window closed".to_string()));
            }
            Ok(token("interactive", None, Some("refresh-new")))
        }

        async fn refresh(&self, _token: &TokenSet) -> AppResult<TokenSet> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.refresh_fails {
                return Err(AppError::Auth("invalid_grant".to_string()));
            }
            Ok(token("refreshed", None, Some("refresh-old")))
        }

        async fn revoke(&self, _token: &TokenSet) -> AppResult<()> {
            Ok(())
        }
    }

    fn stored(dir: &tempfile::TempDir, token: &TokenSet) -> FileCredentialStore {
        let store = FileCredentialStore::new(dir.path());
        store
            .save(KEY, &AuthorizationToken::encode(token).expect("encode"))
            .expect("seed token");
        store
    }

    fn stored_access_token(store: &FileCredentialStore) -> String {
        store
            .load(KEY)
            .expect("load")
            .decode()
            .expect("decode")
            .access_token
    }

    #[tokio::test]
    async fn missing_credentials_propagate() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileCredentialStore::new(dir.path());
        let provider = CountingProvider::default();
        let session = AuthSession::new(&store, &provider, KEY, "http://localhost");

        let result = session.ensure_authorized().await;
        assert!(matches!(result, Err(AppError::CredentialsUnavailable(_))));
        assert_eq!(provider.interactive.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_token_needs_no_interaction_on_repeat_calls() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = stored(&dir, &token("valid", None, None));
        let provider = CountingProvider::default();
        let session = AuthSession::new(&store, &provider, KEY, "http://localhost");

        session.ensure_authorized().await.expect("first call");
        store.delete(KEY).expect("remove backing token");
        session.ensure_authorized().await.expect("second call uses cache");

        assert_eq!(provider.interactive.load(Ordering::SeqCst), 0);
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = stored(&dir, &token("stale", Some(1), Some("refresh-old")));
        let provider = CountingProvider::default();
        let session = AuthSession::new(&store, &provider, KEY, "http://localhost");

        session.ensure_authorized().await.expect("authorized");

        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(provider.interactive.load(Ordering::SeqCst), 0);
        assert_eq!(stored_access_token(&store), "refreshed");
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_interactive_flow() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = stored(&dir, &token("stale", Some(1), Some("refresh-old")));
        let provider = CountingProvider {
            refresh_fails: true,
            ..CountingProvider::default()
        };
        let session = AuthSession::new(&store, &provider, KEY, "http://localhost");

        session.ensure_authorized().await.expect("authorized");

        assert_eq!(provider.interactive.load(Ordering::SeqCst), 1);
        assert_eq!(stored_access_token(&store), "interactive");
    }

    #[tokio::test]
    async fn malformed_token_triggers_interactive_flow() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileCredentialStore::new(dir.path());
        store
            .save(KEY, &AuthorizationToken::from_blob("not a token"))
            .expect("seed");
        let provider = CountingProvider::default();
        let session = AuthSession::new(&store, &provider, KEY, "http://localhost");

        session.ensure_authorized().await.expect("authorized");

        assert_eq!(provider.interactive.load(Ordering::SeqCst), 1);
        assert_eq!(stored_access_token(&store), "interactive");
    }

    #[tokio::test]
    async fn denied_consent_is_surfaced_and_nothing_is_saved() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = stored(&dir, &token("stale", Some(1), None));
        let provider = CountingProvider {
            deny: true,
            ..CountingProvider::default()
        };
        let session = AuthSession::new(&store, &provider, KEY, "http://localhost");

        let result = session.ensure_authorized().await;

        assert!(matches!(result, Err(AppError::AuthorizationDenied(_))));
        assert_eq!(stored_access_token(&store), "stale");
    }
}
