//! Opaque session tokens and the demo credential check

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use oncoderma_core::Config;
use oncoderma_infra::spawn_periodic;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const TOKEN_LOG_PREFIX_LEN: usize = 8;

/// Shortened token for log lines
pub fn token_prefix(token: &str) -> &str {
    token.get(..TOKEN_LOG_PREFIX_LEN).unwrap_or(token)
}

#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub login_time: DateTime<Utc>,
    issued_at: Instant,
}

impl Session {
    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.issued_at) >= ttl)
    }
}

/// In-memory token → session map. `ttl: None` keeps sessions until logout.
#[derive(Debug, Clone)]
pub struct TokenStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Option<Duration>,
}

fn generate_token(username: &str) -> String {
    let nonce: [u8; 16] = rand::random();
    let material = format!(
        "{}:{}:{}",
        username,
        Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        hex::encode(nonce)
    );
    hex::encode(Sha256::digest(material.as_bytes()))
}

impl TokenStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Open a session for `username` and return its token.
    pub async fn issue(&self, username: &str) -> (String, Session) {
        let token = generate_token(username);
        let session = Session {
            username: username.to_string(),
            login_time: Utc::now(),
            issued_at: Instant::now(),
        };

        self.sessions
            .write()
            .await
            .insert(token.clone(), session.clone());

        tracing::info!(
            username = %username,
            token_prefix = token_prefix(&token),
            "Session issued"
        );
        (token, session)
    }

    /// Look up a live session. Expired sessions are removed on the way.
    pub async fn validate(&self, token: &str) -> Option<Session> {
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return None,
                Some(session) if !session.is_expired(self.ttl, now) => {
                    return Some(session.clone())
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(token)
            .is_some_and(|session| session.is_expired(self.ttl, now))
        {
            sessions.remove(token);
            tracing::debug!(token_prefix = token_prefix(token), "Session expired");
        }
        None
    }

    /// Drop every session belonging to `username`. Returns how many were removed.
    pub async fn revoke_all(&self, username: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.username != username);
        let removed = before - sessions.len();
        tracing::info!(username = %username, revoked = removed, "Sessions revoked");
        removed
    }

    pub async fn sweep_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(Some(ttl), now));
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "Swept expired sessions");
        }
        removed
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn spawn_sweeper(&self, period: Duration, cancel_token: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        spawn_periodic("token_sweep", period, cancel_token, move || {
            let store = store.clone();
            async move {
                store.sweep_expired().await;
            }
        })
    }
}

/// Checks credentials against the single configured demo identity.
#[derive(Clone)]
pub struct Authenticator {
    username: String,
    password: String,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.demo_username.clone(), config.demo_password.clone())
    }

    /// The canonical username on a match. Both fields are always compared.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        let username = username.trim();
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());

        if bool::from(user_ok & pass_ok) {
            Some(self.username.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_and_validate() {
        let store = TokenStore::new(None);
        let (token, _) = store.issue("admin").await;

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let session = store.validate(&token).await.unwrap();
        assert_eq!(session.username, "admin");
        assert!(store.validate("not-a-token").await.is_none());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = TokenStore::new(None);
        let (a, _) = store.issue("admin").await;
        let (b, _) = store.issue("admin").await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_revoke_all_only_hits_that_user() {
        let store = TokenStore::new(None);
        let (a1, _) = store.issue("admin").await;
        let (a2, _) = store.issue("admin").await;
        let (other, _) = store.issue("someone").await;

        assert_eq!(store.revoke_all("admin").await, 2);
        assert!(store.validate(&a1).await.is_none());
        assert!(store.validate(&a2).await.is_none());
        assert!(store.validate(&other).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_expire_after_ttl() {
        let store = TokenStore::new(Some(Duration::from_secs(3600)));
        let (token, _) = store.issue("admin").await;

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(store.validate(&token).await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.validate(&token).await.is_none());
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_sessions() {
        let store = TokenStore::new(Some(Duration::from_secs(60)));
        store.issue("admin").await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let (fresh, _) = store.issue("admin").await;
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(store.sweep_expired().await, 1);
        assert!(store.validate(&fresh).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ttl_never_expires() {
        let store = TokenStore::new(None);
        let (token, _) = store.issue("admin").await;
        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;
        assert_eq!(store.sweep_expired().await, 0);
        assert!(store.validate(&token).await.is_some());
    }

    #[test]
    fn test_authenticate_trims_username_only() {
        let auth = Authenticator::new("admin", "1234");
        assert_eq!(auth.authenticate("  admin ", "1234").as_deref(), Some("admin"));
        assert!(auth.authenticate("admin", " 1234").is_none());
        assert!(auth.authenticate("admin", "wrong").is_none());
        assert!(auth.authenticate("root", "1234").is_none());
        assert!(auth.authenticate("", "").is_none());
    }

    #[test]
    fn test_token_prefix() {
        assert_eq!(token_prefix("abcdef0123456789"), "abcdef01");
        assert_eq!(token_prefix("abc"), "abc");
    }
}
