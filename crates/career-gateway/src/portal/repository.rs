//! Record store contract shared by the portal services.

pub use super::accounts::repository::AccountRepository;
pub use super::admissions::repository::{
    AdmissionBatch, AdmissionPrecondition, AdmissionWrite, AdmissionsRepository,
};
pub use super::careers::repository::CareersRepository;

/// Error enumeration for record store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// A store able to serve every portal collection.
pub trait PortalStore: AccountRepository + AdmissionsRepository + CareersRepository {}

impl<T> PortalStore for T where T: AccountRepository + AdmissionsRepository + CareersRepository {}
