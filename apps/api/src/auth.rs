//! Authentication handlers: registration, password login, sessions and the
//! OAuth redirect flow.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use redressa_application::{AuthOutcome, RegisterParams};
use redressa_core::{AppError, AppResult, UserIdentity};
use redressa_domain::{Role, UserProfile};
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;
use url::Url;

use crate::dto::{
    GenericMessageResponse, LoginRequest, RegisterRequest, UserProfileResponse,
};
use crate::error::ApiResult;
use crate::state::{AppState, OAuthProviderConfig};

/// Session key holding the authenticated identity.
pub const SESSION_USER_KEY: &str = "user_identity";
/// Absolute session creation timestamp for absolute timeout enforcement.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";

/// Query parameters for OAuth initiation.
#[derive(Debug, Deserialize)]
pub struct OAuthStartQuery {
    /// Role the principal asked for at initiation; defaults to "user".
    pub role: Option<String>,
}

/// Query parameters delivered to the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn register_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfileResponse>)> {
    let role = match payload.role.as_deref() {
        None | Some("") => Role::User,
        Some(value) => Role::from_str(value)?,
    };

    let profile = state
        .account_service
        .register(RegisterParams {
            email: payload.email,
            password: payload.password,
            name: payload.name,
            role,
        })
        .await?;

    establish_session(&session, &profile).await?;

    Ok((StatusCode::CREATED, Json(UserProfileResponse::from(profile))))
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserProfileResponse>> {
    let outcome = state
        .account_service
        .login(&payload.email, &payload.password)
        .await?;

    match outcome {
        AuthOutcome::Authenticated(profile) => {
            establish_session(&session, &profile).await?;
            Ok(Json(UserProfileResponse::from(profile)))
        }
        AuthOutcome::Failed => {
            Err(AppError::Unauthorized("invalid email or password".to_owned()).into())
        }
    }
}

pub async fn logout_handler(session: Session) -> ApiResult<Json<GenericMessageResponse>> {
    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear session: {error}")))?;

    Ok(Json(GenericMessageResponse {
        message: "signed out".to_owned(),
    }))
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserProfileResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let profile = state
        .account_service
        .find_profile(identity.subject())
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "role profile missing for subject '{}'",
                identity.subject()
            ))
        })?;

    Ok(Json(UserProfileResponse::from(profile)))
}

pub async fn oauth_start_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthStartQuery>,
) -> ApiResult<Redirect> {
    let config = require_provider(&state, &provider)?;

    let role = match query.role.as_deref() {
        None | Some("") => Role::User,
        Some(value) => Role::from_str(value)?,
    };

    // The chosen role rides in a signed short-lived state token; the
    // callback only honors it after validating the signature.
    let state_token = state.oauth_state_service.issue(role)?;

    let mut authorize_url = Url::parse(&config.authorize_url)
        .map_err(|error| AppError::Internal(format!("invalid authorize URL: {error}")))?;
    authorize_url
        .query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_url)
        .append_pair("scope", "openid email profile")
        .append_pair("state", &state_token);

    Ok(Redirect::to(authorize_url.as_str()))
}

pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OAuthCallbackQuery>,
) -> ApiResult<Redirect> {
    // Success and failure are signaled to the frontend by the redirect
    // target alone; provider errors never surface as API errors here.
    let failure = Redirect::to(&format!("{}/login?oauth=failed", state.frontend_url));

    if query.error.is_some() {
        return Ok(failure);
    }

    let (Some(code), Some(state_token)) = (query.code.as_deref(), query.state.as_deref()) else {
        return Ok(failure);
    };

    let Ok(role) = state.oauth_state_service.validate(state_token) else {
        tracing::warn!("oauth callback presented an invalid state token");
        return Ok(failure);
    };

    let Some(config) = state.oauth.clone() else {
        return Ok(failure);
    };

    let principal = match fetch_oauth_principal(&state.http_client, &config, code).await {
        Ok(principal) => principal,
        Err(error) => {
            tracing::warn!(%error, "oauth code exchange failed");
            return Ok(failure);
        }
    };

    let display_name = if principal.name.trim().is_empty() {
        default_display_name(&principal.email).to_owned()
    } else {
        principal.name.clone()
    };

    let profile = match state
        .account_service
        .ensure_oauth_profile(&principal.subject, &display_name, &principal.email, role)
        .await
    {
        Ok(profile) => profile,
        Err(error) => {
            tracing::warn!(%error, "oauth profile creation failed");
            return Ok(failure);
        }
    };

    establish_session(&session, &profile).await?;

    Ok(Redirect::to(&format!("{}/dashboard", state.frontend_url)))
}

struct OAuthPrincipal {
    subject: String,
    name: String,
    email: String,
}

async fn fetch_oauth_principal(
    http_client: &reqwest::Client,
    config: &OAuthProviderConfig,
    code: &str,
) -> AppResult<OAuthPrincipal> {
    let token_response = http_client
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_url.as_str()),
        ])
        .send()
        .await
        .map_err(|error| AppError::Upstream(format!("token exchange transport error: {error}")))?;

    if !token_response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "token exchange returned status {}",
            token_response.status()
        )));
    }

    let token_payload: Value = token_response.json().await.map_err(|error| {
        AppError::Upstream(format!("token exchange returned invalid JSON: {error}"))
    })?;
    let access_token = token_payload
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Upstream("token response missing access_token".to_owned()))?;

    let userinfo_response = http_client
        .get(&config.userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|error| AppError::Upstream(format!("userinfo transport error: {error}")))?;

    if !userinfo_response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "userinfo returned status {}",
            userinfo_response.status()
        )));
    }

    let userinfo: Value = userinfo_response
        .json()
        .await
        .map_err(|error| AppError::Upstream(format!("userinfo returned invalid JSON: {error}")))?;

    let subject = userinfo
        .get("sub")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Upstream("userinfo missing subject claim".to_owned()))?;
    let email = userinfo
        .get("email")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Upstream("userinfo missing email claim".to_owned()))?;
    let name = userinfo
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(OAuthPrincipal {
        subject: subject.to_owned(),
        name: name.to_owned(),
        email: email.to_owned(),
    })
}

async fn establish_session(session: &Session, profile: &UserProfile) -> Result<(), AppError> {
    let identity = UserIdentity::new(
        profile.subject(),
        profile.name().as_str(),
        Some(profile.email().as_str().to_owned()),
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    Ok(())
}

fn require_provider(state: &AppState, provider: &str) -> Result<OAuthProviderConfig, AppError> {
    if provider != "google" {
        return Err(AppError::NotFound(format!(
            "unknown oauth provider '{provider}'"
        )));
    }

    state
        .oauth
        .clone()
        .ok_or_else(|| AppError::Validation("oauth login is not configured".to_owned()))
}

fn default_display_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::default_display_name;

    #[test]
    fn display_name_defaults_to_email_local_part() {
        assert_eq!(default_display_name("pat@example.com"), "pat");
        assert_eq!(default_display_name("no-at-sign"), "no-at-sign");
    }
}
