//! Identity provider contract and the in-memory provider used by the service.
//!
//! The provider owns credentials, sessions and email ownership; it stores no
//! application data. Registration emits a verification notice, which the
//! in-memory provider keeps in an outbox until the code is confirmed.
//!
//! The in-memory provider is a reference implementation for tests and demos.
//! Passwords are stored as a salted single-round SHA-256 digest, which is not
//! a password hashing function; deployments holding real credentials must put
//! an external identity service behind [`IdentityProvider`] instead.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use super::domain::AccountId;
use crate::portal::next_record_id;

/// Authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub account_id: AccountId,
    pub email: String,
    pub email_verified: bool,
}

/// Opaque bearer token for an authenticated session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub principal: Principal,
}

/// Verification mail produced by a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationNotice {
    pub email: String,
    pub code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("email address is already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session is invalid or expired")]
    InvalidSession,
    #[error("verification code is unknown or already used")]
    UnknownVerificationCode,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

pub trait IdentityProvider: Send + Sync {
    /// Create credentials and dispatch a verification notice.
    fn register(&self, email: &str, password: &str) -> Result<Principal, IdentityError>;
    /// Drop credentials created by a registration that could not be completed.
    fn discard(&self, account_id: &AccountId) -> Result<(), IdentityError>;
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;
    fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityError>;
    fn authenticate(&self, token: &SessionToken) -> Result<Principal, IdentityError>;
    fn confirm_email(&self, code: &str) -> Result<Principal, IdentityError>;
}

struct Credential {
    account_id: AccountId,
    email: String,
    salt: String,
    digest: String,
    email_verified: bool,
}

impl Credential {
    fn principal(&self) -> Principal {
        Principal {
            account_id: self.account_id.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
        }
    }
}

/// Sessions kept per account; signing in beyond this ends the oldest one.
pub const MAX_SESSIONS_PER_ACCOUNT: usize = 8;

struct SessionEntry {
    email: String,
    issued: u64,
}

#[derive(Default)]
struct IdentityState {
    // keyed by normalized email
    credentials: HashMap<String, Credential>,
    sessions: HashMap<SessionToken, SessionEntry>,
    issued_sessions: u64,
    pending_codes: HashMap<String, String>,
    outbox: Vec<VerificationNotice>,
}

impl IdentityState {
    fn open_session(&mut self, email: String) -> SessionToken {
        let mut owned: Vec<(u64, SessionToken)> = self
            .sessions
            .iter()
            .filter(|(_, entry)| entry.email == email)
            .map(|(token, entry)| (entry.issued, token.clone()))
            .collect();
        if owned.len() >= MAX_SESSIONS_PER_ACCOUNT {
            owned.sort_by_key(|(issued, _)| *issued);
            let excess = owned.len() + 1 - MAX_SESSIONS_PER_ACCOUNT;
            for (_, token) in owned.into_iter().take(excess) {
                self.sessions.remove(&token);
            }
        }

        self.issued_sessions += 1;
        let token = SessionToken(Uuid::new_v4().to_string());
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                email,
                issued: self.issued_sessions,
            },
        );
        token
    }
}

#[derive(Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<IdentityState>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl InMemoryIdentityProvider {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, IdentityState>, IdentityError> {
        self.state
            .lock()
            .map_err(|_| IdentityError::Unavailable("identity state poisoned".to_string()))
    }

    /// Verification notices dispatched so far, oldest first.
    pub fn outbox(&self) -> Vec<VerificationNotice> {
        self.lock()
            .map(|state| state.outbox.clone())
            .unwrap_or_default()
    }

    /// Most recent verification code sent to `email`.
    pub fn latest_code_for(&self, email: &str) -> Option<String> {
        let email = normalize_email(email);
        self.outbox()
            .into_iter()
            .rev()
            .find(|notice| notice.email == email)
            .map(|notice| notice.code)
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn register(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
        let email = normalize_email(email);
        let mut state = self.lock()?;
        if state.credentials.contains_key(&email) {
            return Err(IdentityError::EmailTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let credential = Credential {
            account_id: AccountId(next_record_id("acc")),
            email: email.clone(),
            digest: password_digest(&salt, password),
            salt,
            email_verified: false,
        };
        let principal = credential.principal();
        state.credentials.insert(email.clone(), credential);

        let code = Uuid::new_v4().simple().to_string();
        state.pending_codes.insert(code.clone(), email.clone());
        state.outbox.push(VerificationNotice {
            email: email.clone(),
            code,
        });
        info!(account_id = %principal.account_id, "verification notice queued");

        Ok(principal)
    }

    fn discard(&self, account_id: &AccountId) -> Result<(), IdentityError> {
        let mut state = self.lock()?;
        let email = state
            .credentials
            .values()
            .find(|credential| &credential.account_id == account_id)
            .map(|credential| credential.email.clone());
        if let Some(email) = email {
            state.credentials.remove(&email);
            state.sessions.retain(|_, entry| entry.email != email);
            state.pending_codes.retain(|_, owner| *owner != email);
            state.outbox.retain(|notice| notice.email != email);
        }
        Ok(())
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let email = normalize_email(email);
        let mut state = self.lock()?;
        let principal = match state.credentials.get(&email) {
            Some(credential)
                if credential.digest == password_digest(&credential.salt, password) =>
            {
                credential.principal()
            }
            _ => return Err(IdentityError::InvalidCredentials),
        };

        let token = state.open_session(email);
        Ok(Session { token, principal })
    }

    fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityError> {
        let mut state = self.lock()?;
        state
            .sessions
            .remove(token)
            .map(|_| ())
            .ok_or(IdentityError::InvalidSession)
    }

    fn authenticate(&self, token: &SessionToken) -> Result<Principal, IdentityError> {
        let state = self.lock()?;
        state
            .sessions
            .get(token)
            .and_then(|entry| state.credentials.get(&entry.email))
            .map(Credential::principal)
            .ok_or(IdentityError::InvalidSession)
    }

    fn confirm_email(&self, code: &str) -> Result<Principal, IdentityError> {
        let code = code.trim();
        let mut state = self.lock()?;
        let email = state
            .pending_codes
            .remove(code)
            .ok_or(IdentityError::UnknownVerificationCode)?;
        state.outbox.retain(|notice| notice.code != code);
        let credential = state
            .credentials
            .get_mut(&email)
            .ok_or(IdentityError::UnknownVerificationCode)?;
        credential.email_verified = true;
        Ok(credential.principal())
    }
}
