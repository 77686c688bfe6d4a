//! In-memory record store backing the service and the test-suite.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::accounts::domain::{Account, AccountFilter, AccountId};
use super::admissions::domain::{
    Application, ApplicationFilter, ApplicationId, Course, CourseId, CourseStatus, Institution,
    InstitutionId,
};
use super::careers::domain::{
    JobApplication, JobApplicationId, JobFilter, JobId, JobPosting, JobStatus,
};
use super::repository::{
    AccountRepository, AdmissionBatch, AdmissionPrecondition, AdmissionWrite,
    AdmissionsRepository, CareersRepository, RepositoryError,
};

#[derive(Default)]
struct Collections {
    accounts: HashMap<AccountId, Account>,
    institutions: HashMap<InstitutionId, Institution>,
    courses: HashMap<CourseId, Course>,
    applications: HashMap<ApplicationId, Application>,
    jobs: HashMap<JobId, JobPosting>,
    job_applications: HashMap<JobApplicationId, JobApplication>,
}

/// All portal collections behind a single lock, so an admissions batch is
/// checked and applied without interleaving writers.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        self.collections
            .lock()
            .map_err(|_| RepositoryError::Unavailable("record store poisoned".to_string()))
    }
}

fn sorted_by<T, K: Ord>(mut values: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    values.sort_by_key(key);
    values
}

impl AccountRepository for MemoryStore {
    fn insert_account(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut collections = self.lock()?;
        if collections.accounts.contains_key(&account.id) {
            return Err(RepositoryError::Conflict);
        }
        collections
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(account)
    }

    fn modify_account(
        &self,
        id: &AccountId,
        change: &mut dyn FnMut(&mut Account),
    ) -> Result<Account, RepositoryError> {
        let mut collections = self.lock()?;
        let account = collections
            .accounts
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        change(account);
        Ok(account.clone())
    }

    fn fetch_account(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.lock()?.accounts.get(id).cloned())
    }

    fn find_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, RepositoryError> {
        let collections = self.lock()?;
        let matching = collections
            .accounts
            .values()
            .filter(|account| filter.matches(account))
            .cloned()
            .collect();
        Ok(sorted_by(matching, |account: &Account| {
            (account.created_at, account.id.clone())
        }))
    }
}

impl AdmissionsRepository for MemoryStore {
    fn insert_institution(&self, institution: Institution) -> Result<Institution, RepositoryError> {
        let mut collections = self.lock()?;
        if collections.institutions.contains_key(&institution.id) {
            return Err(RepositoryError::Conflict);
        }
        collections
            .institutions
            .insert(institution.id.clone(), institution.clone());
        Ok(institution)
    }

    fn update_institution(&self, institution: Institution) -> Result<(), RepositoryError> {
        let mut collections = self.lock()?;
        match collections.institutions.get_mut(&institution.id) {
            Some(slot) => {
                *slot = institution;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_institution(&self, id: &InstitutionId) -> Result<(), RepositoryError> {
        self.lock()?
            .institutions
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch_institution(
        &self,
        id: &InstitutionId,
    ) -> Result<Option<Institution>, RepositoryError> {
        Ok(self.lock()?.institutions.get(id).cloned())
    }

    fn institutions(&self) -> Result<Vec<Institution>, RepositoryError> {
        let all = self.lock()?.institutions.values().cloned().collect();
        Ok(sorted_by(all, |institution: &Institution| {
            (institution.created_at, institution.id.clone())
        }))
    }

    fn institution_by_email(&self, email: &str) -> Result<Option<Institution>, RepositoryError> {
        let email = email.trim();
        let collections = self.lock()?;
        Ok(collections
            .institutions
            .values()
            .find(|institution| institution.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn insert_course(&self, course: Course) -> Result<Course, RepositoryError> {
        let mut collections = self.lock()?;
        if collections.courses.contains_key(&course.id) {
            return Err(RepositoryError::Conflict);
        }
        collections.courses.insert(course.id.clone(), course.clone());
        Ok(course)
    }

    fn set_course_status(
        &self,
        id: &CourseId,
        status: CourseStatus,
    ) -> Result<Course, RepositoryError> {
        let mut collections = self.lock()?;
        let course = collections
            .courses
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        course.status = status;
        Ok(course.clone())
    }

    fn fetch_course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        Ok(self.lock()?.courses.get(id).cloned())
    }

    fn courses_for(&self, institution: &InstitutionId) -> Result<Vec<Course>, RepositoryError> {
        let collections = self.lock()?;
        let courses = collections
            .courses
            .values()
            .filter(|course| &course.institution_id == institution)
            .cloned()
            .collect();
        Ok(sorted_by(courses, |course: &Course| {
            (course.created_at, course.id.clone())
        }))
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let collections = self.lock()?;
        let matching = collections
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect();
        Ok(sorted_by(matching, |application: &Application| {
            (application.created_at, application.id.clone())
        }))
    }

    fn commit(&self, batch: AdmissionBatch) -> Result<(), RepositoryError> {
        let mut collections = self.lock()?;

        for precondition in &batch.preconditions {
            check_precondition(&collections.applications, precondition)?;
        }
        for write in &batch.writes {
            let known = match write {
                AdmissionWrite::Insert(application) => {
                    !collections.applications.contains_key(&application.id)
                }
                AdmissionWrite::Delete(id) | AdmissionWrite::SetStatus { id, .. } => {
                    collections.applications.contains_key(id)
                }
            };
            if !known {
                return Err(RepositoryError::PreconditionFailed(format!(
                    "write target changed: {write:?}"
                )));
            }
        }

        for write in batch.writes {
            match write {
                AdmissionWrite::Insert(application) => {
                    collections
                        .applications
                        .insert(application.id.clone(), application);
                }
                AdmissionWrite::Delete(id) => {
                    collections.applications.remove(&id);
                }
                AdmissionWrite::SetStatus { id, status, at } => {
                    if let Some(application) = collections.applications.get_mut(&id) {
                        application.status = status;
                        application.updated_at = Some(at);
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_precondition(
    applications: &HashMap<ApplicationId, Application>,
    precondition: &AdmissionPrecondition,
) -> Result<(), RepositoryError> {
    match precondition {
        AdmissionPrecondition::ApplicationsBelow {
            student_id,
            institution_id,
            limit,
        } => {
            let held = applications
                .values()
                .filter(|application| {
                    &application.student_id == student_id
                        && &application.institution_id == institution_id
                })
                .count();
            if held >= *limit {
                return Err(RepositoryError::PreconditionFailed(format!(
                    "{student_id} holds {held} applications at {institution_id}"
                )));
            }
        }
        AdmissionPrecondition::ApplicationStatusIs { id, status } => {
            match applications.get(id) {
                Some(application) if application.status == *status => {}
                Some(application) => {
                    return Err(RepositoryError::PreconditionFailed(format!(
                        "{id} is {} instead of {}",
                        application.status.label(),
                        status.label()
                    )));
                }
                None => {
                    return Err(RepositoryError::PreconditionFailed(format!(
                        "{id} no longer exists"
                    )));
                }
            }
        }
    }
    Ok(())
}

impl CareersRepository for MemoryStore {
    fn insert_job(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut collections = self.lock()?;
        if collections.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        collections.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(self.lock()?.jobs.get(id).cloned())
    }

    fn set_job_status(&self, id: &JobId, status: JobStatus) -> Result<JobPosting, RepositoryError> {
        let mut collections = self.lock()?;
        let job = collections.jobs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.status = status;
        Ok(job.clone())
    }

    fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<JobPosting>, RepositoryError> {
        let collections = self.lock()?;
        let mut jobs: Vec<JobPosting> = collections
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(jobs)
    }

    fn insert_job_application(
        &self,
        application: JobApplication,
    ) -> Result<JobApplication, RepositoryError> {
        let mut collections = self.lock()?;
        let duplicate = collections.job_applications.values().any(|existing| {
            existing.id == application.id
                || (existing.job_id == application.job_id
                    && existing.student_id == application.student_id)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        collections
            .job_applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update_job_application(&self, application: JobApplication) -> Result<(), RepositoryError> {
        let mut collections = self.lock()?;
        match collections.job_applications.get_mut(&application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_job_application(
        &self,
        id: &JobApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(self.lock()?.job_applications.get(id).cloned())
    }

    fn applications_for_job(&self, job: &JobId) -> Result<Vec<JobApplication>, RepositoryError> {
        let collections = self.lock()?;
        let matching = collections
            .job_applications
            .values()
            .filter(|application| &application.job_id == job)
            .cloned()
            .collect();
        Ok(sorted_by(matching, |application: &JobApplication| {
            (application.created_at, application.id.clone())
        }))
    }

    fn applications_by_student(
        &self,
        student: &AccountId,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        let collections = self.lock()?;
        let matching = collections
            .job_applications
            .values()
            .filter(|application| &application.student_id == student)
            .cloned()
            .collect();
        Ok(sorted_by(matching, |application: &JobApplication| {
            (application.created_at, application.id.clone())
        }))
    }
}
