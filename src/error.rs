use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("no stored credentials under `{0}`")]
    CredentialsUnavailable(String),
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Reasons an action payload cannot be dispatched. None of these are shown to
/// the user.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request has no thread_id")]
    MissingThreadId,
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("malformed request payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure of a single mailbox mutation. Except for `MissingMessageId`, the
/// display text is the status line printed for the launcher.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("An error occurred.")]
    VerificationFailed { expected: String },
    #[error("Connection error")]
    Transport(#[source] AppError),
    #[error("request has no message_id")]
    MissingMessageId,
}
