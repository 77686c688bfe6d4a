use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::matching::MatchScore;
use crate::portal::accounts::domain::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobApplicationId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Closed,
}

/// What a company asks of candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifications {
    #[serde(default)]
    pub minimum_qualification: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub experience_years: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub company_id: AccountId,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: String,
    pub qualifications: Qualifications,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub qualifications: Qualifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobApplicationStatus {
    Pending,
    Shortlisted,
    Declined,
}

impl JobApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobApplicationStatus::Pending => "pending",
            JobApplicationStatus::Shortlisted => "shortlisted",
            JobApplicationStatus::Declined => "declined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: JobApplicationId,
    pub student_id: AccountId,
    pub job_id: JobId,
    pub company_id: AccountId,
    pub status: JobApplicationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub company_id: Option<AccountId>,
    pub status: Option<JobStatus>,
}

impl JobFilter {
    pub fn matches(&self, job: &JobPosting) -> bool {
        self.company_id
            .as_ref()
            .map_or(true, |id| &job.company_id == id)
            && self.status.map_or(true, |status| job.status == status)
    }
}

/// A job application as the hiring company sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantMatch {
    pub application: JobApplication,
    pub student_name: String,
    pub student_email: String,
    #[serde(rename = "match")]
    pub score: MatchScore,
}
