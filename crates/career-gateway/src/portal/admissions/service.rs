use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    ApplicantRow, Application, ApplicationFilter, ApplicationId, ApplicationStatus, Course,
    CourseDraft, CourseId, CourseStatus, Institution, InstitutionDraft, InstitutionId,
    InstitutionStatus, ResolutionOutcome, StudentAdmissions,
};
use super::repository::{
    AdmissionBatch, AdmissionPrecondition, AdmissionWrite, AdmissionsRepository,
};
use super::resolution::plan_resolution;
use crate::config::PortalSettings;
use crate::portal::access::Actor;
use crate::portal::accounts::domain::Role;
use crate::portal::accounts::repository::AccountRepository;
use crate::portal::error::{PortalError, ValidationFailure};
use crate::portal::next_record_id;
use crate::portal::repository::RepositoryError;

/// Institutions, courses and the course application rules.
pub struct AdmissionsService<S> {
    store: Arc<S>,
    application_cap: usize,
}

impl<S> AdmissionsService<S>
where
    S: AdmissionsRepository + AccountRepository + 'static,
{
    pub fn new(store: Arc<S>, settings: &PortalSettings) -> Self {
        Self {
            store,
            application_cap: settings.application_cap,
        }
    }

    pub fn application_cap(&self) -> usize {
        self.application_cap
    }

    pub fn create_institution(
        &self,
        actor: &Actor,
        draft: InstitutionDraft,
    ) -> Result<Institution, PortalError> {
        actor.require(Role::Admin)?;
        let (name, email) = validate_institution(&draft)?;
        if self.store.institution_by_email(&email)?.is_some() {
            return Err(PortalError::Conflict(format!(
                "an institution already uses {email}"
            )));
        }

        let institution = Institution {
            id: InstitutionId(next_record_id("inst")),
            name,
            kind: draft.kind.trim().to_string(),
            email,
            location: draft.location.trim().to_string(),
            status: draft.status.unwrap_or(InstitutionStatus::Active),
            created_at: Utc::now(),
        };
        let stored = self.store.insert_institution(institution)?;
        info!(institution_id = %stored.id, admin = %actor.id(), "institution created");
        Ok(stored)
    }

    pub fn update_institution(
        &self,
        actor: &Actor,
        id: &InstitutionId,
        draft: InstitutionDraft,
    ) -> Result<Institution, PortalError> {
        actor.require(Role::Admin)?;
        let (name, email) = validate_institution(&draft)?;
        let mut institution = self
            .store
            .fetch_institution(id)?
            .ok_or(PortalError::NotFound("institution"))?;

        if email != institution.email {
            if let Some(other) = self.store.institution_by_email(&email)? {
                if &other.id != id {
                    return Err(PortalError::Conflict(format!(
                        "an institution already uses {email}"
                    )));
                }
            }
        }

        institution.name = name;
        institution.kind = draft.kind.trim().to_string();
        institution.email = email;
        institution.location = draft.location.trim().to_string();
        if let Some(status) = draft.status {
            institution.status = status;
        }
        self.store.update_institution(institution.clone())?;
        info!(institution_id = %id, admin = %actor.id(), "institution updated");
        Ok(institution)
    }

    pub fn delete_institution(&self, actor: &Actor, id: &InstitutionId) -> Result<(), PortalError> {
        actor.require(Role::Admin)?;
        self.store.delete_institution(id).map_err(|err| match err {
            RepositoryError::NotFound => PortalError::NotFound("institution"),
            other => other.into(),
        })?;
        info!(institution_id = %id, admin = %actor.id(), "institution deleted");
        Ok(())
    }

    pub fn list_institutions(&self, actor: &Actor) -> Result<Vec<Institution>, PortalError> {
        actor.require_cleared()?;
        Ok(self.store.institutions()?)
    }

    /// Add a course to the institution managed by the acting institute.
    pub fn create_course(&self, actor: &Actor, draft: CourseDraft) -> Result<Course, PortalError> {
        actor.require(Role::Institute)?;
        let institution = self.managed_institution(actor)?;

        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationFailure::MissingField("course name").into());
        }

        let course = Course {
            id: CourseId(next_record_id("course")),
            institution_id: institution.id.clone(),
            name: name.to_string(),
            faculty: draft.faculty.trim().to_string(),
            duration: draft.duration.trim().to_string(),
            requirements: draft.requirements.trim().to_string(),
            status: CourseStatus::Active,
            created_at: Utc::now(),
        };
        let stored = self.store.insert_course(course)?;
        info!(course_id = %stored.id, institution_id = %institution.id, "course created");
        Ok(stored)
    }

    /// Stop a course of the acting institute's institution from taking
    /// applications. Existing applications are untouched.
    pub fn close_course(&self, actor: &Actor, course_id: &CourseId) -> Result<Course, PortalError> {
        actor.require(Role::Institute)?;
        let institution = self.managed_institution(actor)?;
        let course = self
            .store
            .fetch_course(course_id)?
            .ok_or(PortalError::NotFound("course"))?;
        if course.institution_id != institution.id {
            return Err(PortalError::Forbidden(
                "course belongs to another institution".to_string(),
            ));
        }

        let closed = self
            .store
            .set_course_status(course_id, CourseStatus::Closed)
            .map_err(|err| match err {
                RepositoryError::NotFound => PortalError::NotFound("course"),
                other => other.into(),
            })?;
        info!(course_id = %closed.id, institution_id = %institution.id, "course closed");
        Ok(closed)
    }

    pub fn list_courses(
        &self,
        actor: &Actor,
        institution: &InstitutionId,
    ) -> Result<Vec<Course>, PortalError> {
        actor.require_cleared()?;
        if self.store.fetch_institution(institution)?.is_none() {
            return Err(PortalError::NotFound("institution"));
        }
        Ok(self.store.courses_for(institution)?)
    }

    /// Apply to a course. At most `application_cap` applications may exist per
    /// student and institution; the count is re-checked inside the commit.
    pub fn submit_application(
        &self,
        actor: &Actor,
        course_id: &CourseId,
    ) -> Result<Application, PortalError> {
        actor.require(Role::Student)?;
        let course = self
            .store
            .fetch_course(course_id)?
            .ok_or(PortalError::NotFound("course"))?;
        if course.status == CourseStatus::Closed {
            return Err(ValidationFailure::CourseClosed(course.id.0.clone()).into());
        }
        let institution = self
            .store
            .fetch_institution(&course.institution_id)?
            .ok_or(PortalError::NotFound("institution"))?;
        if institution.status == InstitutionStatus::Inactive {
            return Err(ValidationFailure::InstitutionInactive(institution.id.0.clone()).into());
        }

        let application = Application {
            id: ApplicationId(next_record_id("app")),
            student_id: actor.id().clone(),
            course_id: course.id.clone(),
            institution_id: course.institution_id.clone(),
            course_name: course.name.clone(),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        };

        let batch = AdmissionBatch::new()
            .require(AdmissionPrecondition::ApplicationsBelow {
                student_id: application.student_id.clone(),
                institution_id: application.institution_id.clone(),
                limit: self.application_cap,
            })
            .write(AdmissionWrite::Insert(application.clone()));

        match self.store.commit(batch) {
            Ok(()) => {
                info!(
                    application_id = %application.id,
                    student_id = %application.student_id,
                    course_id = %application.course_id,
                    "application submitted"
                );
                Ok(application)
            }
            Err(RepositoryError::PreconditionFailed(_)) => {
                warn!(
                    student_id = %application.student_id,
                    institution_id = %application.institution_id,
                    limit = self.application_cap,
                    "application cap reached"
                );
                Err(PortalError::CapacityExceeded {
                    limit: self.application_cap,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Decide an application of the acting institute's institution.
    pub fn set_application_status(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, PortalError> {
        actor.require(Role::Institute)?;
        if !status.is_decision() {
            return Err(ValidationFailure::UnsupportedStatus(status.label()).into());
        }

        let mut application = self
            .store
            .fetch_application(id)?
            .ok_or(PortalError::NotFound("application"))?;
        let institution = self.managed_institution(actor)?;
        if application.institution_id != institution.id {
            warn!(
                application_id = %id,
                actor = %actor.id(),
                "status change outside own institution"
            );
            return Err(PortalError::Forbidden(
                "application belongs to another institution".to_string(),
            ));
        }

        let at = Utc::now();
        let batch = AdmissionBatch::new()
            .require(AdmissionPrecondition::ApplicationStatusIs {
                id: id.clone(),
                status: application.status,
            })
            .write(AdmissionWrite::SetStatus {
                id: id.clone(),
                status,
                at,
            });
        self.store.commit(batch).map_err(stale_snapshot)?;

        info!(
            application_id = %id,
            from = application.status.label(),
            to = status.label(),
            "application status changed"
        );
        application.status = status;
        application.updated_at = Some(at);
        Ok(application)
    }

    /// The acting student's applications, flagging competing admissions.
    pub fn student_applications(&self, actor: &Actor) -> Result<StudentAdmissions, PortalError> {
        actor.require(Role::Student)?;
        let applications = self
            .store
            .find_applications(&ApplicationFilter::student(actor.id()))?;
        let admitted: Vec<Application> = applications
            .iter()
            .filter(|application| application.status == ApplicationStatus::Admitted)
            .cloned()
            .collect();
        let competing_admissions = if admitted.len() > 1 {
            admitted
        } else {
            Vec::new()
        };

        Ok(StudentAdmissions {
            applications,
            competing_admissions,
        })
    }

    pub fn institution_applications(
        &self,
        actor: &Actor,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicantRow>, PortalError> {
        actor.require(Role::Institute)?;
        let institution = self.managed_institution(actor)?;
        let mut filter = ApplicationFilter::institution(&institution.id);
        filter.status = status;

        self.store
            .find_applications(&filter)?
            .into_iter()
            .map(|application| -> Result<ApplicantRow, PortalError> {
                let student = self.store.fetch_account(&application.student_id)?;
                let (student_name, student_email) = match student {
                    Some(account) => (account.profile.display_name().to_string(), account.email),
                    None => ("unknown".to_string(), String::new()),
                };
                Ok(ApplicantRow {
                    application,
                    student_name,
                    student_email,
                })
            })
            .collect()
    }

    /// Keep `chosen`, release every other admission of the student and hand
    /// each released seat to the earliest waiting applicant.
    pub fn resolve_multiple_admissions(
        &self,
        actor: &Actor,
        chosen: &ApplicationId,
    ) -> Result<ResolutionOutcome, PortalError> {
        actor.require(Role::Student)?;
        let application = self
            .store
            .fetch_application(chosen)?
            .ok_or(PortalError::NotFound("application"))?;
        if &application.student_id != actor.id() {
            return Err(PortalError::Forbidden(
                "application belongs to another student".to_string(),
            ));
        }

        let mine = self
            .store
            .find_applications(&ApplicationFilter::student(actor.id()))?;
        let mut waiting = Vec::new();
        for released in mine.iter().filter(|candidate| {
            candidate.status == ApplicationStatus::Admitted && &candidate.id != chosen
        }) {
            let filter = ApplicationFilter::institution(&released.institution_id)
                .with_course(&released.course_id)
                .with_status(ApplicationStatus::Waiting);
            waiting.extend(self.store.find_applications(&filter)?);
        }

        let plan = plan_resolution(chosen, &mine, &waiting, Utc::now())?;
        self.store.commit(plan.batch).map_err(stale_snapshot)?;

        info!(
            student_id = %actor.id(),
            kept = %plan.outcome.kept,
            released = plan.outcome.released.len(),
            promoted = plan.outcome.promoted.len(),
            "multiple admissions resolved"
        );
        Ok(plan.outcome)
    }

    /// The institution whose contact email is the institute account's email.
    fn managed_institution(&self, actor: &Actor) -> Result<Institution, PortalError> {
        self.store
            .institution_by_email(&actor.account().email)?
            .ok_or(PortalError::NotFound("institution"))
    }
}

fn stale_snapshot(err: RepositoryError) -> PortalError {
    match err {
        RepositoryError::PreconditionFailed(reason) => {
            warn!(%reason, "admissions batch rejected");
            PortalError::Conflict("applications changed concurrently, reload and retry".to_string())
        }
        other => other.into(),
    }
}

fn validate_institution(draft: &InstitutionDraft) -> Result<(String, String), ValidationFailure> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationFailure::MissingField("institution name"));
    }
    let email = draft.email.trim().to_ascii_lowercase();
    if !email.contains('@') {
        return Err(ValidationFailure::InvalidEmail(email));
    }
    Ok((name.to_string(), email))
}
