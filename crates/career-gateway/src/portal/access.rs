//! Server-side authorization: which screen an account may reach and which
//! operations it may perform.

use serde::Serialize;

use super::accounts::domain::{Account, AccountId, AccountStatus, Role};
use super::error::PortalError;

/// Where an authenticated account lands, mirroring the portal's view selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", content = "role", rename_all = "snake_case")]
pub enum AccessGate {
    VerificationRequired,
    PendingApproval,
    Rejected,
    Suspended,
    Dashboard(Role),
}

impl AccessGate {
    pub fn for_account(account: &Account) -> Self {
        let role = account.role();
        if role == Role::Admin {
            return AccessGate::Dashboard(Role::Admin);
        }
        if !account.email_verified {
            return AccessGate::VerificationRequired;
        }
        match account.status {
            AccountStatus::Pending if role.requires_approval() => AccessGate::PendingApproval,
            AccountStatus::Rejected => AccessGate::Rejected,
            AccountStatus::Suspended => AccessGate::Suspended,
            AccountStatus::Active | AccountStatus::Pending => AccessGate::Dashboard(role),
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AccessGate::VerificationRequired => {
                "verify your email address to access your account"
            }
            AccessGate::PendingApproval => "account is awaiting administrator approval",
            AccessGate::Rejected => "account application was not approved",
            AccessGate::Suspended => "account is suspended",
            AccessGate::Dashboard(_) => "access granted",
        }
    }
}

/// The account behind a verified session, as seen by the services.
#[derive(Debug, Clone)]
pub struct Actor {
    account: Account,
}

impl Actor {
    pub fn new(account: Account) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn id(&self) -> &AccountId {
        &self.account.id
    }

    pub fn role(&self) -> Role {
        self.account.role()
    }

    pub fn gate(&self) -> AccessGate {
        AccessGate::for_account(&self.account)
    }

    /// The actor must hold `role` and have cleared every access gate.
    pub fn require(&self, role: Role) -> Result<(), PortalError> {
        match self.gate() {
            AccessGate::Dashboard(actual) if actual == role => Ok(()),
            AccessGate::Dashboard(actual) => Err(PortalError::Forbidden(format!(
                "{} accounts cannot perform {} operations",
                actual.label(),
                role.label()
            ))),
            gate => Err(PortalError::Forbidden(gate.message().to_string())),
        }
    }

    /// Any account that cleared its gates, whatever the role.
    pub fn require_cleared(&self) -> Result<(), PortalError> {
        match self.gate() {
            AccessGate::Dashboard(_) => Ok(()),
            gate => Err(PortalError::Forbidden(gate.message().to_string())),
        }
    }
}
