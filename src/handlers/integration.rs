//! OAuth integration endpoints: redirect-URL minting and the callback that
//! turns an authorization code into a connected account + store.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::{Platform, Store, User};
use crate::platforms;
use crate::resolver;
use crate::util::{generate_secret, hash_secret};

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub authorization_url: String,
}

/// GET /integration/{platform}/authorize
pub async fn authorize(
    State(state): State<AppState>,
    Path(platform): Path<Platform>,
) -> Result<Json<AuthorizeResponse>> {
    let authorization_url = platforms::authorize_url(platform, &state.config)?;
    Ok(Json(AuthorizeResponse { authorization_url }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub user: User,
    pub store: Store,
    /// Plaintext API token, shown exactly once. Only its hash is stored.
    pub token: String,
    /// One-time password-setup link for accounts created with a random
    /// password during resolution.
    pub reset_url: String,
}

/// GET /integration/{platform}/callback
///
/// Exchanges the authorization code, fetches the merchant profile and runs
/// the resolver. The response carries a freshly minted API token and a
/// password-reset link; their hashes land on the user row.
pub async fn callback(
    State(state): State<AppState>,
    Path(platform): Path<Platform>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        return Err(AppError::UpstreamAuth(format!(
            "{} authorization denied: {} {}",
            platform, error, description
        )));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let token = platforms::exchange_code(platform, &state.config, &code).await?;
    let info = platforms::fetch_user_info(platform, &state.config, &token.access_token).await?;

    let mut conn = state.db.get()?;
    let (user, store) = resolver::resolve(&mut conn, platform, &info, &token)?;

    let api_token = generate_secret(48);
    let reset_token = generate_secret(48);
    queries::set_user_auth_tokens(
        &conn,
        &user.id,
        &hash_secret(&api_token),
        &hash_secret(&reset_token),
    )?;

    let reset_url = format!(
        "{}/reset-password?token={}&email={}",
        state.config.base_url,
        reset_token,
        urlencoding::encode(&user.email),
    );

    Ok(Json(CallbackResponse {
        user,
        store,
        token: api_token,
        reset_url,
    }))
}
