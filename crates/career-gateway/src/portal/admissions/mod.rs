//! Institutions, courses and the course application rule engine.

pub mod domain;
pub mod repository;
pub mod resolution;
pub mod service;

pub use domain::{
    ApplicantRow, Application, ApplicationFilter, ApplicationId, ApplicationStatus, Course,
    CourseDraft, CourseId, CourseStatus, Institution, InstitutionDraft, InstitutionId,
    InstitutionStatus, ResolutionOutcome, StudentAdmissions,
};
pub use repository::{
    AdmissionBatch, AdmissionPrecondition, AdmissionWrite, AdmissionsRepository,
};
pub use resolution::{plan_resolution, ResolutionPlan};
pub use service::AdmissionsService;
