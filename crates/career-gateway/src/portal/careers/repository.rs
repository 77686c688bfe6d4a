use super::domain::{JobApplication, JobApplicationId, JobFilter, JobId, JobPosting, JobStatus};
use crate::portal::accounts::domain::AccountId;
use crate::portal::repository::RepositoryError;

/// Storage abstraction for job postings and job applications.
pub trait CareersRepository: Send + Sync {
    fn insert_job(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
    fn set_job_status(&self, id: &JobId, status: JobStatus) -> Result<JobPosting, RepositoryError>;
    /// Matching postings, newest first.
    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<JobPosting>, RepositoryError>;

    /// Fails with `Conflict` when the student already applied to the job.
    fn insert_job_application(
        &self,
        application: JobApplication,
    ) -> Result<JobApplication, RepositoryError>;
    fn update_job_application(&self, application: JobApplication) -> Result<(), RepositoryError>;
    fn fetch_job_application(
        &self,
        id: &JobApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError>;
    /// Applications for a job, oldest first.
    fn applications_for_job(&self, job: &JobId) -> Result<Vec<JobApplication>, RepositoryError>;
    fn applications_by_student(
        &self,
        student: &AccountId,
    ) -> Result<Vec<JobApplication>, RepositoryError>;
}
