use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, Course, CourseId,
    CourseStatus, Institution, InstitutionId,
};
use crate::portal::accounts::domain::AccountId;
use crate::portal::repository::RepositoryError;

/// Storage abstraction for institutions, courses and course applications.
pub trait AdmissionsRepository: Send + Sync {
    fn insert_institution(&self, institution: Institution) -> Result<Institution, RepositoryError>;
    fn update_institution(&self, institution: Institution) -> Result<(), RepositoryError>;
    fn delete_institution(&self, id: &InstitutionId) -> Result<(), RepositoryError>;
    fn fetch_institution(&self, id: &InstitutionId)
        -> Result<Option<Institution>, RepositoryError>;
    /// All institutions, oldest first.
    fn institutions(&self) -> Result<Vec<Institution>, RepositoryError>;
    fn institution_by_email(&self, email: &str) -> Result<Option<Institution>, RepositoryError>;

    fn insert_course(&self, course: Course) -> Result<Course, RepositoryError>;
    fn set_course_status(
        &self,
        id: &CourseId,
        status: CourseStatus,
    ) -> Result<Course, RepositoryError>;
    fn fetch_course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError>;
    fn courses_for(&self, institution: &InstitutionId) -> Result<Vec<Course>, RepositoryError>;

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Matching applications ordered by creation time, then identifier.
    fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;

    /// Apply every write of `batch` if and only if all of its preconditions
    /// hold; otherwise nothing is written and `PreconditionFailed` is returned.
    fn commit(&self, batch: AdmissionBatch) -> Result<(), RepositoryError>;
}

/// Condition evaluated against the stored applications at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionPrecondition {
    /// Fewer than `limit` applications exist for the student at the institution.
    ApplicationsBelow {
        student_id: AccountId,
        institution_id: InstitutionId,
        limit: usize,
    },
    /// The application exists and currently holds `status`.
    ApplicationStatusIs {
        id: ApplicationId,
        status: ApplicationStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionWrite {
    Insert(Application),
    Delete(ApplicationId),
    SetStatus {
        id: ApplicationId,
        status: ApplicationStatus,
        at: DateTime<Utc>,
    },
}

/// Conditional multi-document write over the applications collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionBatch {
    pub preconditions: Vec<AdmissionPrecondition>,
    pub writes: Vec<AdmissionWrite>,
}

impl AdmissionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, precondition: AdmissionPrecondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn write(mut self, write: AdmissionWrite) -> Self {
        self.writes.push(write);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
