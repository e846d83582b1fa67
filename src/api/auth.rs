use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::auth::gate::bearer_token;
use crate::auth::password;
use crate::directory::Role;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    role: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct LoginQuery {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>> {
    let role: Role = req.role.parse()?;
    password::validate_password(&req.password)?;
    let hash = password::hash_password(&req.password).await?;

    let (user_id, role) = {
        let mut directory = state.directory.write().await;
        let user = directory.register(&req.email, hash, role, req.name)?;
        (user.id, user.role)
    };

    let token = state.tokens.issue(user_id, role)?;
    Ok(Json(TokenResponse { token }))
}

async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Json<TokenResponse>> {
    // Unknown email and wrong password are deliberately the same failure
    let (user_id, role, hash) = {
        let directory = state.directory.read().await;
        match directory.find_by_email(&query.email) {
            Some(user) => (user.id, user.role, user.password_hash.clone()),
            None => return Err(Error::InvalidCredentials),
        }
    };

    if !password::verify_password(&query.password, &hash).await? {
        return Err(Error::InvalidCredentials);
    }

    let token = state.tokens.issue(user_id, role)?;
    Ok(Json(TokenResponse { token }))
}

/// Exchange a token for a fresh one. The token may come in the body; when
/// the body is absent, the caller's own bearer credential is refreshed.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<TokenResponse>> {
    let presented = match body.and_then(|Json(req)| req.token) {
        Some(token) => token,
        None => bearer_token(&headers)?.to_string(),
    };

    let token = state.tokens.refresh(&presented)?;
    Ok(Json(TokenResponse { token }))
}
