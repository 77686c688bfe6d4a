//! Job postings, job applications and candidate matching.

pub mod domain;
pub mod matching;
pub mod repository;
pub mod service;

pub use domain::{
    ApplicantMatch, JobApplication, JobApplicationId, JobApplicationStatus, JobDraft, JobFilter,
    JobId, JobPosting, JobStatus, Qualifications,
};
pub use matching::{score_candidate, MatchScore};
pub use repository::CareersRepository;
pub use service::CareersService;
