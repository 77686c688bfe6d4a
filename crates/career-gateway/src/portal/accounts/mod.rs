//! Accounts, identity, approvals and the client session state.

pub mod domain;
pub mod identity;
pub mod repository;
pub mod service;
pub mod session;

pub use domain::{
    Account, AccountFilter, AccountId, AccountStatus, AdminProfile, CompanyProfile, Credentials,
    InstituteProfile, Profile, Registration, Role, StudentProfile, StudentProfileUpdate,
};
pub use identity::{
    IdentityError, IdentityProvider, InMemoryIdentityProvider, Principal, Session, SessionToken,
    VerificationNotice,
};
pub use repository::AccountRepository;
pub use service::{AccountService, SessionView, SignIn};
pub use session::{AuthState, ClientSession};
