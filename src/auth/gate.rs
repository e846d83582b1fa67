use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::api::AppState;
use crate::directory::Role;
use crate::error::{Error, Result};

/// The verified acting principal. Constructed only from a token that passed
/// signature and expiry checks; the role is never taken from anywhere else.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: u64,
    pub role: Role,
}

impl AuthUser {
    /// Admit the caller only if their verified role is in `allowed`.
    /// Admins pass every gate.
    pub fn require_role(&self, allowed: &[Role]) -> Result<()> {
        if self.role == Role::Admin || allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "operation not permitted for role {}",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Extract the raw token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthenticated("missing bearer token".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthenticated("expected 'Bearer <token>'".to_string()))?;
    if token.is_empty() {
        return Err(Error::Unauthenticated("missing bearer token".to_string()));
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens.verify(token)?;
        Ok(AuthUser {
            id: claims.user_id()?,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_require_role() {
        let cleaner = AuthUser {
            id: 1,
            role: Role::Cleaner,
        };
        assert!(cleaner.require_role(&[Role::Cleaner]).is_ok());
        assert!(matches!(
            cleaner.require_role(&[Role::Host]),
            Err(Error::Forbidden(_))
        ));

        let admin = AuthUser {
            id: 2,
            role: Role::Admin,
        };
        assert!(admin.require_role(&[Role::Host]).is_ok());
        assert!(admin.require_role(&[]).is_ok());
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

        let mut bad = HeaderMap::new();
        bad.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            bearer_token(&bad),
            Err(Error::Unauthenticated(_))
        ));

        let mut empty = HeaderMap::new();
        empty.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(
            bearer_token(&empty),
            Err(Error::Unauthenticated(_))
        ));

        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(Error::Unauthenticated(_))
        ));
    }
}
