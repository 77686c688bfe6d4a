//! Explicit client session state.
//!
//! A `ClientSession` starts in [`AuthState::Loading`] and moves to
//! `Unauthenticated` or `Authenticated` whenever the principal changes
//! (restore, sign-in, sign-out, refresh). Every transition is published on a
//! watch channel so any number of views can re-render from it.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;

use super::domain::{Account, Credentials};
use super::identity::{IdentityProvider, SessionToken};
use super::repository::AccountRepository;
use super::service::AccountService;
use crate::portal::access::AccessGate;
use crate::portal::error::PortalError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Loading,
    Unauthenticated,
    Authenticated { account: Account, gate: AccessGate },
}

impl AuthState {
    pub fn gate(&self) -> Option<AccessGate> {
        match self {
            AuthState::Authenticated { gate, .. } => Some(*gate),
            AuthState::Loading | AuthState::Unauthenticated => None,
        }
    }
}

pub struct ClientSession<S, I> {
    accounts: Arc<AccountService<S, I>>,
    token: Mutex<Option<SessionToken>>,
    state: watch::Sender<AuthState>,
}

impl<S, I> ClientSession<S, I>
where
    S: AccountRepository + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(accounts: Arc<AccountService<S, I>>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            accounts,
            token: Mutex::new(None),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.token_slot().clone()
    }

    /// Initial load: resolve a previously stored token, if any.
    pub fn restore(&self, token: Option<SessionToken>) -> Result<AuthState, PortalError> {
        *self.token_slot() = token;
        self.refresh()
    }

    /// Re-read the account behind the current token, e.g. after an approval.
    pub fn refresh(&self) -> Result<AuthState, PortalError> {
        let Some(token) = self.token() else {
            return Ok(self.publish(AuthState::Unauthenticated));
        };

        match self.accounts.session(&token) {
            Ok(view) => Ok(self.publish(AuthState::Authenticated {
                account: view.account,
                gate: view.gate,
            })),
            Err(PortalError::Unauthenticated) => {
                *self.token_slot() = None;
                Ok(self.publish(AuthState::Unauthenticated))
            }
            Err(err) => Err(err),
        }
    }

    pub fn sign_in(&self, credentials: &Credentials) -> Result<AuthState, PortalError> {
        let signed_in = self.accounts.sign_in(credentials)?;
        *self.token_slot() = Some(signed_in.token);
        Ok(self.publish(AuthState::Authenticated {
            account: signed_in.account,
            gate: signed_in.gate,
        }))
    }

    pub fn sign_out(&self) -> Result<AuthState, PortalError> {
        let token = self.token_slot().take();
        if let Some(token) = token {
            match self.accounts.sign_out(&token) {
                Ok(()) | Err(PortalError::Unauthenticated) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(self.publish(AuthState::Unauthenticated))
    }

    fn publish(&self, state: AuthState) -> AuthState {
        self.state.send_replace(state.clone());
        state
    }

    fn token_slot(&self) -> MutexGuard<'_, Option<SessionToken>> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
