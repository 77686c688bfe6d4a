//! Business rules for the career portal: accounts and approvals, course
//! admissions, and job postings.
//!
//! Persistence and identity are consumed through the traits in
//! [`repository`] and [`accounts::identity`]; [`memory::MemoryStore`] and
//! [`accounts::InMemoryIdentityProvider`] back the service and the tests.
//! Every mutating operation takes an [`Actor`] resolved from a verified
//! session and checks the role itself instead of trusting the caller.

pub mod access;
pub mod accounts;
pub mod admissions;
pub mod careers;
pub mod error;
pub mod memory;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::PortalSettings;

pub use access::{AccessGate, Actor};
pub use accounts::{AccountService, ClientSession, IdentityProvider, InMemoryIdentityProvider};
pub use admissions::AdmissionsService;
pub use careers::CareersService;
pub use error::{PortalError, ValidationFailure};
pub use memory::MemoryStore;
pub use repository::{PortalStore, RepositoryError};
pub use router::portal_router;

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Monotonic identifiers, so lexical order of ids of one kind follows creation order.
pub(crate) fn next_record_id(prefix: &str) -> String {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// The composed portal: one service per area sharing the store and identity provider.
pub struct Portal<S, I> {
    pub accounts: AccountService<S, I>,
    pub admissions: AdmissionsService<S>,
    pub careers: CareersService<S>,
}

impl<S, I> Portal<S, I>
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, identity: Arc<I>, settings: &PortalSettings) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), identity, settings),
            admissions: AdmissionsService::new(store.clone(), settings),
            careers: CareersService::new(store),
        }
    }
}
