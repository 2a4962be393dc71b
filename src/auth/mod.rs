pub mod oauth;
pub mod session;
pub mod token;
pub mod token_store;

pub use oauth::{GoogleOAuth, OAuthProvider};
pub use session::AuthSession;
pub use token::{AuthorizationToken, TokenSet, TokenValidity};
pub use token_store::{CredentialStore, FileCredentialStore};
