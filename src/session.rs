//! Bearer token session lifecycle.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::user::Role;

/// Bytes of entropy per token. Hex-encoded, so tokens are twice as long.
const TOKEN_LENGTH: usize = 32;

/// An issued session, denormalized at login time.
///
/// Role changes after login do not retroactively affect existing sessions;
/// password reset revokes them instead.
#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes opaque bearer tokens.
pub struct SessionManager {
    lifetime: Duration,
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    /// Create a new [`SessionManager`].
    pub fn new(lifetime_days: i64) -> Self {
        Self {
            lifetime: Duration::days(lifetime_days),
            sessions: HashMap::new(),
        }
    }

    /// Issue a fresh token bound to `username`/`role`.
    pub fn issue(&mut self, username: &str, role: Role) -> Session {
        self.issue_at(username, role, Utc::now())
    }

    fn issue_at(&mut self, username: &str, role: Role, now: DateTime<Utc>) -> Session {
        let mut bytes = [0u8; TOKEN_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let session = Session {
            token: token.clone(),
            username: username.to_owned(),
            role,
            issued_at: now,
            expires_at: now + self.lifetime,
        };
        self.sessions.insert(token, session.clone());
        session
    }

    /// Resolve a token, deleting it on the way out if it expired.
    pub fn validate(&mut self, token: &str) -> Option<Session> {
        self.validate_at(token, Utc::now())
    }

    fn validate_at(&mut self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self.sessions.get(token)?;
        if now > session.expires_at {
            // lazy expiry sweep, no background timer.
            self.sessions.remove(token);
            return None;
        }
        Some(session.clone())
    }

    /// Idempotent delete. Revoking an unknown token is a no-op.
    pub fn revoke(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    /// Delete every session bound to `username`. Used by password reset.
    pub fn revoke_all_for(&mut self, username: &str) {
        self.sessions.retain(|_, session| session.username != username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let mut manager = SessionManager::new(14);
        let session = manager.issue("admin", Role::Admin);

        // 32 random bytes, hex-encoded.
        assert_eq!(session.token.len(), TOKEN_LENGTH * 2);
        assert_eq!(session.expires_at - session.issued_at, Duration::days(14));

        let resolved = manager.validate(&session.token).unwrap();
        assert_eq!(resolved.username, "admin");
        assert_eq!(resolved.role, Role::Admin);
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut manager = SessionManager::new(14);
        let first = manager.issue("staff", Role::Staff);
        let second = manager.issue("staff", Role::Staff);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_unknown_token() {
        let mut manager = SessionManager::new(14);
        assert!(manager.validate("deadbeef").is_none());
    }

    #[test]
    fn test_expired_token_is_deleted() {
        let mut manager = SessionManager::new(14);
        let now = Utc::now();
        let session = manager.issue_at("staff", Role::Staff, now);

        let after_expiry = now + Duration::days(14) + Duration::seconds(1);
        assert!(manager.validate_at(&session.token, after_expiry).is_none());
        // a second attempt before expiry must also fail: the token is gone.
        assert!(manager.validate_at(&session.token, now).is_none());
    }

    #[test]
    fn test_validate_just_before_expiry() {
        let mut manager = SessionManager::new(14);
        let now = Utc::now();
        let session = manager.issue_at("staff", Role::Staff, now);

        let almost = now + Duration::days(14) - Duration::seconds(1);
        assert!(manager.validate_at(&session.token, almost).is_some());
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let mut manager = SessionManager::new(14);
        let session = manager.issue("admin", Role::Admin);

        manager.revoke(&session.token);
        assert!(manager.validate(&session.token).is_none());
        // unknown token, still fine.
        manager.revoke(&session.token);
    }

    #[test]
    fn test_revoke_all_for_user() {
        let mut manager = SessionManager::new(14);
        let first = manager.issue("staff", Role::Staff);
        let second = manager.issue("staff", Role::Staff);
        let other = manager.issue("admin", Role::Admin);

        manager.revoke_all_for("staff");
        assert!(manager.validate(&first.token).is_none());
        assert!(manager.validate(&second.token).is_none());
        assert!(manager.validate(&other.token).is_some());
    }
}
