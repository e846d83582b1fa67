use std::net::SocketAddr;
use std::path::PathBuf;

/// Token signing configuration.
///
/// The secret is injected once at startup and never mutated afterwards;
/// every issued credential is an HS256 JWT signed with it.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Server-held signing secret
    pub secret: String,
    /// Validity window of a freshly issued token, in seconds
    pub token_ttl_secs: i64,
    /// How long past nominal expiry a token may still be refreshed, in seconds
    pub refresh_grace_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: "insecure-dev-secret".to_string(),
            token_ttl_secs: 24 * 60 * 60,
            refresh_grace_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Directory where uploaded checklist photos are written
    pub media_dir: PathBuf,
    pub auth: AuthConfig,
    /// When true, a job can only be completed once every checklist item is
    /// checked. Off by default; see DESIGN.md for the policy decision.
    pub require_checklist_complete: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // SAFETY: This is a hardcoded valid address that will always parse
            listen_addr: "127.0.0.1:8000"
                .parse()
                .expect("default listen address is valid"),
            media_dir: PathBuf::from("media"),
            auth: AuthConfig::default(),
            require_checklist_complete: false,
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth.secret = secret.into();
        self
    }

    pub fn with_media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = dir.into();
        self
    }

    pub fn require_checklist_complete(mut self, required: bool) -> Self {
        self.require_checklist_complete = required;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_default() {
        let cfg = AuthConfig::default();
        assert_eq!(cfg.token_ttl_secs, 86_400);
        assert_eq!(cfg.refresh_grace_secs, 3_600);
        assert!(!cfg.secret.is_empty());
    }

    #[test]
    fn server_config_default() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(cfg.media_dir, PathBuf::from("media"));
        assert!(!cfg.require_checklist_complete);
    }

    #[test]
    fn server_config_builders() {
        let addr: SocketAddr = "0.0.0.0:9000".parse().unwrap();
        let cfg = ServerConfig::new(addr)
            .with_secret("s3cret")
            .with_media_dir("/tmp/media")
            .require_checklist_complete(true);
        assert_eq!(cfg.listen_addr, addr);
        assert_eq!(cfg.auth.secret, "s3cret");
        assert_eq!(cfg.media_dir, PathBuf::from("/tmp/media"));
        assert!(cfg.require_checklist_complete);
    }
}
