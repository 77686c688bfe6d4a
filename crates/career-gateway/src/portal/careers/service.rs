use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    ApplicantMatch, JobApplication, JobApplicationId, JobApplicationStatus, JobDraft, JobFilter,
    JobId, JobPosting, JobStatus,
};
use super::matching::score_candidate;
use super::repository::CareersRepository;
use crate::portal::access::Actor;
use crate::portal::accounts::domain::{Profile, Role, StudentProfile};
use crate::portal::accounts::repository::AccountRepository;
use crate::portal::error::{PortalError, ValidationFailure};
use crate::portal::next_record_id;
use crate::portal::repository::RepositoryError;

/// Job postings and the applications students send to them.
pub struct CareersService<S> {
    store: Arc<S>,
}

impl<S> CareersService<S>
where
    S: CareersRepository + AccountRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn post_job(&self, actor: &Actor, draft: JobDraft) -> Result<JobPosting, PortalError> {
        actor.require(Role::Company)?;
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ValidationFailure::MissingField("job title").into());
        }
        let company_name = match &actor.account().profile {
            Profile::Company(profile) => profile.company_name.clone(),
            other => other.display_name().to_string(),
        };

        let mut qualifications = draft.qualifications;
        qualifications.required_skills = qualifications
            .required_skills
            .into_iter()
            .map(|skill| skill.trim().to_string())
            .filter(|skill| !skill.is_empty())
            .collect();

        let job = JobPosting {
            id: JobId(next_record_id("job")),
            company_id: actor.id().clone(),
            company_name,
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            location: draft.location.trim().to_string(),
            job_type: draft.job_type.trim().to_string(),
            qualifications,
            status: JobStatus::Active,
            created_at: Utc::now(),
        };
        let stored = self.store.insert_job(job)?;
        info!(job_id = %stored.id, company_id = %actor.id(), "job posted");
        Ok(stored)
    }

    /// Open postings, newest first.
    pub fn active_jobs(&self, actor: &Actor) -> Result<Vec<JobPosting>, PortalError> {
        actor.require_cleared()?;
        let filter = JobFilter {
            status: Some(JobStatus::Active),
            ..JobFilter::default()
        };
        Ok(self.store.find_jobs(&filter)?)
    }

    /// Take one of the acting company's postings off the board.
    pub fn close_job(&self, actor: &Actor, job_id: &JobId) -> Result<JobPosting, PortalError> {
        actor.require(Role::Company)?;
        self.owned_job(actor, job_id)?;
        let closed = self
            .store
            .set_job_status(job_id, JobStatus::Closed)
            .map_err(|err| match err {
                RepositoryError::NotFound => PortalError::NotFound("job"),
                other => other.into(),
            })?;
        info!(job_id = %closed.id, company_id = %actor.id(), "job closed");
        Ok(closed)
    }

    pub fn company_jobs(&self, actor: &Actor) -> Result<Vec<JobPosting>, PortalError> {
        actor.require(Role::Company)?;
        let filter = JobFilter {
            company_id: Some(actor.id().clone()),
            ..JobFilter::default()
        };
        Ok(self.store.find_jobs(&filter)?)
    }

    pub fn apply_for_job(
        &self,
        actor: &Actor,
        job_id: &JobId,
    ) -> Result<JobApplication, PortalError> {
        actor.require(Role::Student)?;
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or(PortalError::NotFound("job"))?;
        if job.status != JobStatus::Active {
            return Err(ValidationFailure::JobClosed(job.id.0.clone()).into());
        }

        let application = JobApplication {
            id: JobApplicationId(next_record_id("japp")),
            student_id: actor.id().clone(),
            job_id: job.id.clone(),
            company_id: job.company_id.clone(),
            status: JobApplicationStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        };
        match self.store.insert_job_application(application) {
            Ok(stored) => {
                info!(job_id = %job.id, student_id = %actor.id(), "job application submitted");
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => {
                warn!(job_id = %job.id, student_id = %actor.id(), "duplicate job application");
                Err(PortalError::Conflict(format!(
                    "already applied to job {}",
                    job.id
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn student_job_applications(
        &self,
        actor: &Actor,
    ) -> Result<Vec<JobApplication>, PortalError> {
        actor.require(Role::Student)?;
        Ok(self.store.applications_by_student(actor.id())?)
    }

    /// Applicants for one of the company's jobs, best match first.
    pub fn job_applicants(
        &self,
        actor: &Actor,
        job_id: &JobId,
    ) -> Result<Vec<ApplicantMatch>, PortalError> {
        actor.require(Role::Company)?;
        let job = self.owned_job(actor, job_id)?;

        let mut applicants = Vec::new();
        for application in self.store.applications_for_job(&job.id)? {
            let Some(account) = self.store.fetch_account(&application.student_id)? else {
                warn!(application_id = %application.id, "applicant account missing");
                continue;
            };
            let empty = StudentProfile {
                name: account.profile.display_name().to_string(),
                phone: String::new(),
                address: String::new(),
                skills: Vec::new(),
                experience_years: 0,
                transcript: None,
                certificates: Vec::new(),
            };
            let profile = account.profile.as_student().unwrap_or(&empty);
            applicants.push(ApplicantMatch {
                score: score_candidate(profile, &job.qualifications),
                student_name: profile.name.clone(),
                student_email: account.email.clone(),
                application,
            });
        }

        applicants.sort_by(|left, right| {
            right
                .score
                .score
                .cmp(&left.score.score)
                .then_with(|| left.application.created_at.cmp(&right.application.created_at))
        });
        Ok(applicants)
    }

    pub fn set_job_application_status(
        &self,
        actor: &Actor,
        id: &JobApplicationId,
        status: JobApplicationStatus,
    ) -> Result<JobApplication, PortalError> {
        actor.require(Role::Company)?;
        if status == JobApplicationStatus::Pending {
            return Err(ValidationFailure::UnsupportedStatus(status.label()).into());
        }

        let mut application = self
            .store
            .fetch_job_application(id)?
            .ok_or(PortalError::NotFound("job application"))?;
        if &application.company_id != actor.id() {
            return Err(PortalError::Forbidden(
                "job application belongs to another company".to_string(),
            ));
        }

        application.status = status;
        application.updated_at = Some(Utc::now());
        self.store.update_job_application(application.clone())?;
        info!(application_id = %id, status = status.label(), "job application status changed");
        Ok(application)
    }

    fn owned_job(&self, actor: &Actor, job_id: &JobId) -> Result<JobPosting, PortalError> {
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or(PortalError::NotFound("job"))?;
        if &job.company_id != actor.id() {
            return Err(PortalError::Forbidden(
                "job belongs to another company".to_string(),
            ));
        }
        Ok(job)
    }
}
