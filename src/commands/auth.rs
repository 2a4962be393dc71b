use std::io::{self, IsTerminal, Write};
use std::time::SystemTime;

use serde::Serialize;

use crate::auth::{AuthorizationToken, CredentialStore, GoogleOAuth, OAuthProvider, TokenValidity};
use crate::cache::CacheRefreshNotifier;
use crate::cli::AuthCommand;
use crate::config::{self, Settings};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub profile: String,
    pub credential_key: String,
    pub validity: TokenValidity,
    pub expires_in_seconds: Option<i64>,
    pub has_refresh_token: Option<bool>,
    pub note: Option<String>,
}

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Login => login(ctx).await,
        AuthCommand::Status => {
            let status = status(ctx)?;
            let text = match status.validity {
                TokenValidity::Valid => format!("{}: authorized", status.profile),
                TokenValidity::Invalid => format!(
                    "{}: stored credentials need reauthorization{}",
                    status.profile,
                    if status.has_refresh_token == Some(true) {
                        " (refresh available)"
                    } else {
                        ""
                    }
                ),
                TokenValidity::Absent => format!("{}: not authorized", status.profile),
            };
            ctx.output.emit(&text, &status)
        }
        AuthCommand::Logout => {
            let status = logout(ctx).await?;
            let text = format!("{}: deauthorized", status.profile);
            ctx.output.emit(&text, &status)
        }
    }
}

async fn login(ctx: &AppContext) -> AppResult<()> {
    let settings = ensure_login_settings(ctx)?;
    let key = settings.credential_key().to_string();
    let provider = GoogleOAuth::new(settings);

    let token = provider.authorize_interactive().await?;
    ctx.credentials
        .save(&key, &AuthorizationToken::encode(&token)?)?;
    tracing::info!(profile = %ctx.profile, %key, "authorization stored");

    let status = status(ctx)?;
    let text = format!("{}: authorized", status.profile);
    ctx.output.emit(&text, &status)
}

fn status(ctx: &AppContext) -> AppResult<AuthStatus> {
    let key = ctx.settings.credential_key();
    let stored = match ctx.credentials.load(key) {
        Ok(stored) => stored,
        Err(AppError::CredentialsUnavailable(_)) => {
            return Ok(AuthStatus {
                profile: ctx.profile.clone(),
                credential_key: key.to_string(),
                validity: TokenValidity::Absent,
                expires_in_seconds: None,
                has_refresh_token: None,
                note: Some("no credentials stored".to_string()),
            });
        }
        Err(err) => return Err(err),
    };

    let now = SystemTime::now();
    let token = stored.decode();
    Ok(AuthStatus {
        profile: ctx.profile.clone(),
        credential_key: key.to_string(),
        validity: stored.validity(now),
        expires_in_seconds: token.as_ref().and_then(|token| token.expires_in_seconds(now)),
        has_refresh_token: token.as_ref().map(|token| token.has_refresh_token()),
        note: token
            .is_none()
            .then(|| "stored credentials are malformed".to_string()),
    })
}

async fn logout(ctx: &AppContext) -> AppResult<AuthStatus> {
    let key = ctx.settings.credential_key();
    let note = match ctx.credentials.load(key).map(|stored| stored.decode()) {
        Ok(Some(token)) => match ctx.oauth.revoke(&token).await {
            Ok(()) => "remote token revoked and local credentials removed".to_string(),
            Err(err) => format!("local credentials removed (revoke failed: {err})"),
        },
        Ok(None) | Err(AppError::CredentialsUnavailable(_)) => {
            "local credentials removed".to_string()
        }
        Err(err) => return Err(err),
    };

    ctx.credentials.delete(key)?;
    ctx.cache.clear()?;

    Ok(AuthStatus {
        profile: ctx.profile.clone(),
        credential_key: key.to_string(),
        validity: TokenValidity::Absent,
        expires_in_seconds: None,
        has_refresh_token: None,
        note: Some(note),
    })
}

fn ensure_login_settings(ctx: &AppContext) -> AppResult<Settings> {
    let mut settings = ctx.settings.clone();
    let missing_client_id = is_blank(settings.client_id.as_deref());
    let missing_client_secret = is_blank(settings.client_secret.as_deref());

    if !missing_client_id && !missing_client_secret {
        return Ok(settings);
    }

    let settings_path = ctx.paths.settings_file(&ctx.profile);
    if !io::stdin().is_terminal() {
        let missing = format_missing_fields(missing_client_id, missing_client_secret);
        return Err(AppError::Config(format!(
            "missing oauth {missing} in {}. run `gmail-launcher auth login` in an interactive terminal to be prompted, or add the values manually",
            settings_path.display(),
        )));
    }

    println!(
        "OAuth client config is missing for profile `{}`.",
        ctx.profile
    );
    println!("Settings will be saved to {}.", settings_path.display());

    if missing_client_id {
        settings.client_id = Some(prompt_required("OAuth client_id: ")?);
    }

    if missing_client_secret {
        settings.client_secret = Some(prompt_required("OAuth client_secret: ")?);
    }

    let default_redirect = settings.redirect_uri();
    let redirect_uri = prompt_line(&format!("OAuth redirect_uri [{default_redirect}]: "))?;
    settings.redirect_uri = Some(if redirect_uri.is_empty() {
        default_redirect
    } else {
        redirect_uri
    });

    config::save_settings(&ctx.paths, &ctx.profile, &settings)?;
    println!("Saved profile settings to {}.", settings_path.display());

    Ok(settings)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).is_none_or(str::is_empty)
}

fn format_missing_fields(missing_client_id: bool, missing_client_secret: bool) -> String {
    match (missing_client_id, missing_client_secret) {
        (true, true) => "client_id and client_secret".to_string(),
        (true, false) => "client_id".to_string(),
        (false, true) => "client_secret".to_string(),
        (false, false) => "configuration".to_string(),
    }
}

fn prompt_required(prompt: &str) -> AppResult<String> {
    loop {
        let value = prompt_line(prompt)?;
        if !value.is_empty() {
            return Ok(value);
        }
        eprintln!("value is required");
    }
}

fn prompt_line(prompt: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}
