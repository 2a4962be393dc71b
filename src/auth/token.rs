use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at_unix: Option<u64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

impl TokenSet {
    const EXPIRY_SKEW_SECS: u64 = 30;

    pub fn is_expired(&self, now: SystemTime) -> bool {
        let Some(expires_at) = self.expires_at_unix else {
            return false;
        };

        let Ok(duration) = now.duration_since(UNIX_EPOCH) else {
            return false;
        };

        duration.as_secs().saturating_add(Self::EXPIRY_SKEW_SECS) >= expires_at
    }

    pub fn expires_in_seconds(&self, now: SystemTime) -> Option<i64> {
        let expires_at = self.expires_at_unix? as i64;
        let now_secs = now.duration_since(UNIX_EPOCH).ok()?.as_secs() as i64;
        Some(expires_at - now_secs)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub fn validity(&self, now: SystemTime) -> TokenValidity {
        if self.access_token.trim().is_empty() || self.is_expired(now) {
            TokenValidity::Invalid
        } else {
            TokenValidity::Valid
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenValidity {
    Valid,
    Invalid,
    Absent,
}

/// Serialized credential blob as kept by a credential store. The store never
/// looks inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationToken {
    blob: String,
}

impl AuthorizationToken {
    pub fn from_blob(blob: impl Into<String>) -> Self {
        Self { blob: blob.into() }
    }

    pub fn encode(token: &TokenSet) -> AppResult<Self> {
        Ok(Self {
            blob: serde_json::to_string(token)?,
        })
    }

    /// `None` when the blob is malformed.
    pub fn decode(&self) -> Option<TokenSet> {
        serde_json::from_str(&self.blob).ok()
    }

    pub fn validity(&self, now: SystemTime) -> TokenValidity {
        self.decode()
            .map_or(TokenValidity::Invalid, |token| token.validity(now))
    }

    pub fn as_str(&self) -> &str {
        &self.blob
    }
}
