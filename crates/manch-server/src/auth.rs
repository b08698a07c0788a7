//! The credential gate.
//!
//! A single configured admin principal signs in with an email/password
//! pair; sessions are opaque UUID bearer tokens.  The rest of the system
//! consumes only two things from this layer: whether a session is active
//! and the current principal's address, both observable through a watch
//! channel.

use std::collections::HashMap;
use std::sync::Mutex;

use subtle::ConstantTimeEq;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Verifies credentials and tracks live sessions.
pub struct AuthService {
    admin_email: String,
    password_digest: [u8; 32],
    sessions: Mutex<HashMap<Uuid, String>>,
    state_tx: watch::Sender<Option<String>>,
}

impl AuthService {
    /// Build the gate from the configured principal and password digest.
    pub fn new(admin_email: impl Into<String>, password_digest: [u8; 32]) -> Self {
        let (state_tx, _) = watch::channel(None);
        Self {
            admin_email: admin_email.into(),
            password_digest,
            sessions: Mutex::new(HashMap::new()),
            state_tx,
        }
    }

    /// Digest a plaintext password the way this gate expects it.
    pub fn digest_password(password: &str) -> [u8; 32] {
        *blake3::hash(password.as_bytes()).as_bytes()
    }

    /// Verify a credential pair; on success returns a fresh session token.
    pub fn login(&self, email: &str, password: &str) -> Option<Uuid> {
        let digest = Self::digest_password(password);

        // Constant-time comparison to prevent timing attacks on the password.
        let password_ok = digest[..].ct_eq(&self.password_digest[..]).unwrap_u8() == 1;
        if email != self.admin_email || !password_ok {
            return None;
        }

        let token = Uuid::new_v4();
        {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            sessions.insert(token, email.to_string());
        }
        let _ = self.state_tx.send_replace(Some(email.to_string()));

        info!(principal = %email, "Session opened");
        Some(token)
    }

    /// End a session.  Returns `false` for unknown tokens.
    pub fn logout(&self, token: &Uuid) -> bool {
        let (removed, now_empty) = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            let removed = sessions.remove(token);
            (removed, sessions.is_empty())
        };

        match removed {
            Some(principal) => {
                if now_empty {
                    let _ = self.state_tx.send_replace(None);
                }
                info!(principal = %principal, "Session closed");
                true
            }
            None => false,
        }
    }

    /// The principal behind a session token, if the session is live.
    pub fn principal(&self, token: &Uuid) -> Option<String> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .cloned()
    }

    /// Observe session state changes: `Some(address)` while a session is
    /// active, `None` once the last one ends.
    pub fn session_changes(&self) -> watch::Receiver<Option<String>> {
        self.state_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthService {
        AuthService::new(
            "admin@manch.local",
            AuthService::digest_password("correct horse"),
        )
    }

    #[test]
    fn accepts_configured_pair_and_rejects_others() {
        let auth = gate();

        assert!(auth.login("admin@manch.local", "wrong").is_none());
        assert!(auth.login("other@manch.local", "correct horse").is_none());

        let token = auth.login("admin@manch.local", "correct horse").unwrap();
        assert_eq!(
            auth.principal(&token).as_deref(),
            Some("admin@manch.local")
        );
    }

    #[test]
    fn logout_ends_the_session_once() {
        let auth = gate();
        let token = auth.login("admin@manch.local", "correct horse").unwrap();

        assert!(auth.logout(&token));
        assert!(!auth.logout(&token));
        assert!(auth.principal(&token).is_none());
    }

    #[test]
    fn session_state_is_observable() {
        let auth = gate();
        let state = auth.session_changes();
        assert!(state.borrow().is_none());

        let token = auth.login("admin@manch.local", "correct horse").unwrap();
        assert_eq!(state.borrow().as_deref(), Some("admin@manch.local"));

        auth.logout(&token);
        assert!(state.borrow().is_none());
    }
}
