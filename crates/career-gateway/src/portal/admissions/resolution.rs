//! Multi-admission resolution planning.
//!
//! A student holding several admissions keeps one of them. Every other
//! admission is released, and each released seat goes to the earliest
//! waiting applicant for the same course at the same institution. The plan is
//! computed from a snapshot and carried out as a single conditional batch, so
//! a snapshot that went stale before the commit writes nothing.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::domain::{Application, ApplicationId, ApplicationStatus, ResolutionOutcome};
use super::repository::{AdmissionBatch, AdmissionPrecondition, AdmissionWrite};
use crate::portal::error::ValidationFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
    pub outcome: ResolutionOutcome,
    pub batch: AdmissionBatch,
}

/// Build the resolution for `chosen`.
///
/// `student_applications` are the student's own applications; `waiting` are
/// waitlisted applications of other students for the released courses.
pub fn plan_resolution(
    chosen: &ApplicationId,
    student_applications: &[Application],
    waiting: &[Application],
    at: DateTime<Utc>,
) -> Result<ResolutionPlan, ValidationFailure> {
    let kept = student_applications
        .iter()
        .find(|application| &application.id == chosen)
        .filter(|application| application.status == ApplicationStatus::Admitted)
        .ok_or_else(|| ValidationFailure::NotAdmitted(chosen.0.clone()))?;

    let mut released: Vec<&Application> = student_applications
        .iter()
        .filter(|application| {
            application.status == ApplicationStatus::Admitted && application.id != kept.id
        })
        .collect();
    if released.is_empty() {
        return Err(ValidationFailure::NoCompetingAdmissions);
    }
    released.sort_by(|left, right| left.queue_key().cmp(&right.queue_key()));

    let mut batch = AdmissionBatch::new().require(AdmissionPrecondition::ApplicationStatusIs {
        id: kept.id.clone(),
        status: ApplicationStatus::Admitted,
    });
    let mut promoted: Vec<ApplicationId> = Vec::new();
    let mut taken: HashSet<&ApplicationId> = HashSet::new();

    for seat in &released {
        batch = batch
            .require(AdmissionPrecondition::ApplicationStatusIs {
                id: seat.id.clone(),
                status: ApplicationStatus::Admitted,
            })
            .write(AdmissionWrite::Delete(seat.id.clone()));

        let next = waiting
            .iter()
            .filter(|candidate| {
                candidate.status == ApplicationStatus::Waiting
                    && candidate.student_id != kept.student_id
                    && candidate.institution_id == seat.institution_id
                    && candidate.course_id == seat.course_id
                    && !taken.contains(&candidate.id)
            })
            .min_by(|left, right| left.queue_key().cmp(&right.queue_key()));

        if let Some(candidate) = next {
            taken.insert(&candidate.id);
            promoted.push(candidate.id.clone());
            batch = batch
                .require(AdmissionPrecondition::ApplicationStatusIs {
                    id: candidate.id.clone(),
                    status: ApplicationStatus::Waiting,
                })
                .write(AdmissionWrite::SetStatus {
                    id: candidate.id.clone(),
                    status: ApplicationStatus::Admitted,
                    at,
                });
        }
    }

    Ok(ResolutionPlan {
        outcome: ResolutionOutcome {
            kept: kept.id.clone(),
            released: released.iter().map(|seat| seat.id.clone()).collect(),
            promoted,
        },
        batch,
    })
}
