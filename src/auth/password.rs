use bcrypt::DEFAULT_COST;

use crate::error::{Error, Result};

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(Error::WeakPassword(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Hash a password with bcrypt on the blocking thread pool. The salt is
/// embedded in the returned hash string.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password, DEFAULT_COST)
            .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| Error::Internal(format!("hashing task failed: {}", e)))?
}

/// Verify a password against a stored bcrypt hash.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hash)
            .map_err(|e| Error::Internal(format!("password verification failed: {}", e)))
    })
    .await
    .map_err(|e| Error::Internal(format!("verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("hunter22").await.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("abc"),
            Err(Error::WeakPassword(_))
        ));
        assert!(validate_password("abcdef").is_ok());
    }
}
