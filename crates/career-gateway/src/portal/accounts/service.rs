use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Account, AccountFilter, AccountId, AccountStatus, AdminProfile, Credentials, Profile,
    Registration, Role, StudentProfile, StudentProfileUpdate,
};
use super::identity::{IdentityError, IdentityProvider, SessionToken};
use super::repository::AccountRepository;
use crate::config::PortalSettings;
use crate::portal::access::{AccessGate, Actor};
use crate::portal::error::{PortalError, ValidationFailure};
use crate::portal::repository::RepositoryError;

/// Result of a successful sign-in. Authentication can succeed while the gate
/// still keeps the account away from its dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SignIn {
    pub token: SessionToken,
    pub account: Account,
    pub gate: AccessGate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub account: Account,
    pub gate: AccessGate,
}

/// Registration, sign-in and the administrator approval workflow.
pub struct AccountService<S, I> {
    store: Arc<S>,
    identity: Arc<I>,
    min_password_length: usize,
}

impl<S, I> AccountService<S, I>
where
    S: AccountRepository + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, identity: Arc<I>, settings: &PortalSettings) -> Self {
        Self {
            store,
            identity,
            min_password_length: settings.min_password_length,
        }
    }

    pub fn identity(&self) -> &Arc<I> {
        &self.identity
    }

    /// Register a student, institute or company account.
    pub fn register(&self, registration: Registration) -> Result<Account, PortalError> {
        if registration.profile.role() == Role::Admin {
            return Err(PortalError::Forbidden(
                "administrator accounts cannot be self-registered".to_string(),
            ));
        }
        validate_registration(&registration, self.min_password_length)?;

        let role = registration.profile.role();
        let principal = self
            .identity
            .register(&registration.email, &registration.password)?;

        let status = if role.requires_approval() {
            AccountStatus::Pending
        } else {
            AccountStatus::Active
        };
        let account = Account {
            id: principal.account_id.clone(),
            email: principal.email.clone(),
            email_verified: principal.email_verified,
            status,
            profile: registration.profile,
            created_at: Utc::now(),
        };

        match self.store.insert_account(account) {
            Ok(stored) => {
                info!(account_id = %stored.id, role = role.label(), "account registered");
                Ok(stored)
            }
            Err(err) => {
                if let Err(discard_err) = self.identity.discard(&principal.account_id) {
                    warn!(
                        account_id = %principal.account_id,
                        error = %discard_err,
                        "failed to discard orphaned credentials"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Create the bootstrap administrator; admins bypass verification and approval.
    pub fn seed_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, PortalError> {
        let principal = self.identity.register(email, password)?;
        let account = Account {
            id: principal.account_id,
            email: principal.email,
            email_verified: true,
            status: AccountStatus::Active,
            profile: Profile::Admin(AdminProfile {
                name: name.to_string(),
            }),
            created_at: Utc::now(),
        };
        let stored = self.store.insert_account(account)?;
        info!(account_id = %stored.id, "administrator seeded");
        Ok(stored)
    }

    pub fn sign_in(&self, credentials: &Credentials) -> Result<SignIn, PortalError> {
        let session = self
            .identity
            .sign_in(&credentials.email, &credentials.password)?;
        let principal = &session.principal;
        let account = self.synced_account(&principal.account_id, principal.email_verified)?;
        let gate = AccessGate::for_account(&account);
        info!(account_id = %account.id, ?gate, "signed in");

        Ok(SignIn {
            token: session.token,
            account,
            gate,
        })
    }

    pub fn sign_out(&self, token: &SessionToken) -> Result<(), PortalError> {
        self.identity.sign_out(token).map_err(session_error)
    }

    pub fn confirm_email(&self, code: &str) -> Result<Account, PortalError> {
        let principal = self.identity.confirm_email(code)?;
        let account = self.synced_account(&principal.account_id, principal.email_verified)?;
        info!(account_id = %account.id, "email verified");
        Ok(account)
    }

    /// Resolve a bearer token into the acting account.
    pub fn actor(&self, token: &SessionToken) -> Result<Actor, PortalError> {
        let principal = self.identity.authenticate(token).map_err(session_error)?;
        let account = self
            .synced_account(&principal.account_id, principal.email_verified)
            .map_err(|err| match err {
                PortalError::NotFound(_) => PortalError::Unauthenticated,
                other => other,
            })?;
        Ok(Actor::new(account))
    }

    pub fn session(&self, token: &SessionToken) -> Result<SessionView, PortalError> {
        let actor = self.actor(token)?;
        let gate = actor.gate();
        Ok(SessionView {
            account: actor.account().clone(),
            gate,
        })
    }

    pub fn approve(&self, actor: &Actor, target: &AccountId) -> Result<Account, PortalError> {
        self.set_status(actor, target, AccountStatus::Active)
    }

    pub fn reject(&self, actor: &Actor, target: &AccountId) -> Result<Account, PortalError> {
        self.set_status(actor, target, AccountStatus::Rejected)
    }

    pub fn suspend(&self, actor: &Actor, target: &AccountId) -> Result<Account, PortalError> {
        self.set_status(actor, target, AccountStatus::Suspended)
    }

    fn set_status(
        &self,
        actor: &Actor,
        target: &AccountId,
        status: AccountStatus,
    ) -> Result<Account, PortalError> {
        actor.require(Role::Admin)?;

        let current = self
            .store
            .fetch_account(target)?
            .ok_or(PortalError::NotFound("account"))?;
        if current.role() == Role::Admin {
            return Err(PortalError::Forbidden(
                "administrator accounts cannot change status".to_string(),
            ));
        }

        let account = self
            .store
            .modify_account(target, &mut |account: &mut Account| {
                account.status = status
            })
            .map_err(missing_account)?;
        info!(
            admin = %actor.id(),
            account_id = %account.id,
            status = status.label(),
            "account status changed"
        );
        Ok(account)
    }

    pub fn list_accounts(
        &self,
        actor: &Actor,
        filter: &AccountFilter,
    ) -> Result<Vec<Account>, PortalError> {
        actor.require(Role::Admin)?;
        Ok(self.store.find_accounts(filter)?)
    }

    pub fn update_student_profile(
        &self,
        actor: &Actor,
        update: StudentProfileUpdate,
    ) -> Result<Account, PortalError> {
        actor.require(Role::Student)?;

        let account = self
            .store
            .modify_account(actor.id(), &mut |account: &mut Account| {
                if let Profile::Student(profile) = &mut account.profile {
                    apply_profile_update(profile, &update);
                }
            })
            .map_err(missing_account)?;
        Ok(account)
    }

    fn synced_account(
        &self,
        id: &AccountId,
        email_verified: bool,
    ) -> Result<Account, PortalError> {
        let account = self
            .store
            .fetch_account(id)?
            .ok_or(PortalError::NotFound("account"))?;
        if email_verified && !account.email_verified {
            return self
                .store
                .modify_account(id, &mut |account: &mut Account| {
                    account.email_verified = true
                })
                .map_err(missing_account);
        }
        Ok(account)
    }
}

fn session_error(err: IdentityError) -> PortalError {
    match err {
        IdentityError::InvalidSession => PortalError::Unauthenticated,
        other => PortalError::Identity(other),
    }
}

fn missing_account(err: RepositoryError) -> PortalError {
    match err {
        RepositoryError::NotFound => PortalError::NotFound("account"),
        other => PortalError::Repository(other),
    }
}

/// Only the fields present in the update change.
fn apply_profile_update(profile: &mut StudentProfile, update: &StudentProfileUpdate) {
    if let Some(skills) = &update.skills {
        profile.skills = normalize_list(skills.clone());
    }
    if let Some(years) = update.experience_years {
        profile.experience_years = years;
    }
    if let Some(transcript) = &update.transcript {
        let transcript = transcript.trim();
        profile.transcript = (!transcript.is_empty()).then(|| transcript.to_string());
    }
    if let Some(certificates) = &update.certificates {
        profile.certificates = normalize_list(certificates.clone());
    }
}

fn normalize_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

pub(crate) fn validate_registration(
    registration: &Registration,
    min_password_length: usize,
) -> Result<(), ValidationFailure> {
    let email = registration.email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid_email {
        return Err(ValidationFailure::InvalidEmail(email.to_string()));
    }

    if registration.password != registration.confirm_password {
        return Err(ValidationFailure::PasswordMismatch);
    }
    if registration.password.chars().count() < min_password_length {
        return Err(ValidationFailure::PasswordTooShort {
            min: min_password_length,
        });
    }

    if registration.profile.display_name().trim().is_empty() {
        return Err(ValidationFailure::MissingField("name"));
    }
    match &registration.profile {
        Profile::Institute(profile) if profile.institution_name.trim().is_empty() => {
            Err(ValidationFailure::MissingField("institution name"))
        }
        Profile::Company(profile) if profile.company_name.trim().is_empty() => {
            Err(ValidationFailure::MissingField("company name"))
        }
        _ => Ok(()),
    }
}
