use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier shared by the identity principal and its account record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Institute,
    Student,
    Company,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Institute => "institute",
            Role::Student => "student",
            Role::Company => "company",
        }
    }

    /// Institutes and companies wait for an administrator before they can act.
    pub const fn requires_approval(self) -> bool {
        matches!(self, Role::Institute | Role::Company)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Pending,
    Rejected,
    Suspended,
}

impl AccountStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
            AccountStatus::Rejected => "rejected",
            AccountStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstituteProfile {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub institution_name: String,
    #[serde(default)]
    pub institution_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub company_name: String,
    #[serde(default)]
    pub industry: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub name: String,
}

/// Role specific profile; the variant is the account's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Profile {
    Admin(AdminProfile),
    Institute(InstituteProfile),
    Student(StudentProfile),
    Company(CompanyProfile),
}

impl Profile {
    pub const fn role(&self) -> Role {
        match self {
            Profile::Admin(_) => Role::Admin,
            Profile::Institute(_) => Role::Institute,
            Profile::Student(_) => Role::Student,
            Profile::Company(_) => Role::Company,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Profile::Admin(profile) => &profile.name,
            Profile::Institute(profile) => &profile.name,
            Profile::Student(profile) => &profile.name,
            Profile::Company(profile) => &profile.name,
        }
    }

    pub fn as_student(&self) -> Option<&StudentProfile> {
        match self {
            Profile::Student(profile) => Some(profile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub email_verified: bool,
    pub status: AccountStatus,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

/// Registration form as submitted by a prospective user.
#[derive(Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub profile: Profile,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("role", &self.profile.role())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Partial update of the student's documents and declared experience.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StudentProfileUpdate {
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience_years: Option<u8>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub certificates: Option<Vec<String>>,
}

/// Equality filter over the account collection; `None` matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AccountFilter {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        self.role.map_or(true, |role| account.role() == role)
            && self.status.map_or(true, |status| account.status == status)
    }
}
