use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portal::accounts::domain::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstitutionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(pub String);

/// Identifier wrapper for course applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

display_id!(InstitutionId, CourseId, ApplicationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub id: InstitutionId,
    pub name: String,
    pub kind: String,
    /// Contact address; the institute account with this email manages the institution.
    pub email: String,
    pub location: String,
    pub status: InstitutionStatus,
    pub created_at: DateTime<Utc>,
}

/// Admin form for creating or replacing an institution's details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstitutionDraft {
    pub name: String,
    #[serde(default)]
    pub kind: String,
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: Option<InstitutionStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub institution_id: InstitutionId,
    pub name: String,
    pub faculty: String,
    pub duration: String,
    pub requirements: String,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourseDraft {
    pub name: String,
    #[serde(default)]
    pub faculty: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub requirements: String,
}

/// Status tracked for a course application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Admitted,
    Rejected,
    Waiting,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Admitted => "admitted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Waiting => "waiting",
        }
    }

    /// Statuses an institute may assign when deciding an application.
    pub const fn is_decision(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: AccountId,
    pub course_id: CourseId,
    pub institution_id: InstitutionId,
    pub course_name: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Waitlist order: earliest submission first, identifier as tie-break.
    pub fn queue_key(&self) -> (DateTime<Utc>, &ApplicationId) {
        (self.created_at, &self.id)
    }
}

/// Equality filter over the applications collection; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationFilter {
    #[serde(default)]
    pub student_id: Option<AccountId>,
    #[serde(default)]
    pub institution_id: Option<InstitutionId>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn student(student_id: &AccountId) -> Self {
        Self {
            student_id: Some(student_id.clone()),
            ..Self::default()
        }
    }

    pub fn institution(institution_id: &InstitutionId) -> Self {
        Self {
            institution_id: Some(institution_id.clone()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_course(mut self, course_id: &CourseId) -> Self {
        self.course_id = Some(course_id.clone());
        self
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.student_id
            .as_ref()
            .map_or(true, |id| &application.student_id == id)
            && self
                .institution_id
                .as_ref()
                .map_or(true, |id| &application.institution_id == id)
            && self
                .course_id
                .as_ref()
                .map_or(true, |id| &application.course_id == id)
            && self.status.map_or(true, |status| application.status == status)
    }
}

/// Student facing summary; `competing_admissions` is non-empty when the
/// student must pick one of several admissions.
#[derive(Debug, Clone, Serialize)]
pub struct StudentAdmissions {
    pub applications: Vec<Application>,
    pub competing_admissions: Vec<Application>,
}

/// Institute facing application row with the applicant's contact details.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantRow {
    pub application: Application,
    pub student_name: String,
    pub student_email: String,
}

/// What a completed multi-admission resolution changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    pub kept: ApplicationId,
    pub released: Vec<ApplicationId>,
    pub promoted: Vec<ApplicationId>,
}
