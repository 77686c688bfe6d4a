use super::common::*;

use crate::portal::careers::domain::{JobApplicationStatus, JobDraft, JobStatus, Qualifications};
use crate::portal::{PortalError, ValidationFailure};

fn analyst_job() -> JobDraft {
    JobDraft {
        title: "Data Analyst".to_string(),
        description: "Reporting for the mine operations team".to_string(),
        location: "Maseru".to_string(),
        job_type: "full-time".to_string(),
        qualifications: Qualifications {
            minimum_qualification: "BSc Statistics".to_string(),
            required_skills: vec!["SQL".to_string(), "Python".to_string()],
            experience_years: 2,
        },
    }
}

#[test]
fn companies_post_and_students_browse_active_jobs() {
    let harness = Harness::new();
    let admin = harness.admin();
    let company = harness.company(&admin, "hr@acme.test");
    let student = harness.student("thabo@students.test", "Thabo");

    let first = harness
        .portal
        .careers
        .post_job(&harness.actor(&company), analyst_job())
        .expect("posted");
    assert_eq!(first.company_name, "Acme Mining");

    let mut second_draft = analyst_job();
    second_draft.title = "Geologist".to_string();
    let second = harness
        .portal
        .careers
        .post_job(&harness.actor(&company), second_draft)
        .expect("posted");

    let listed = harness
        .portal
        .careers
        .active_jobs(&harness.actor(&student))
        .expect("listing");
    let ids: Vec<_> = listed.iter().map(|job| job.id.clone()).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn students_cannot_post_jobs_and_pending_companies_are_blocked() {
    let harness = Harness::new();
    let student = harness.student("thabo@students.test", "Thabo");
    let (_, pending_company) = harness.onboard("hr@pending.test", company_profile("Pending"));

    for token in [&student, &pending_company] {
        assert!(matches!(
            harness
                .portal
                .careers
                .post_job(&harness.actor(token), analyst_job()),
            Err(PortalError::Forbidden(_))
        ));
    }
}

#[test]
fn duplicate_job_applications_conflict() {
    let harness = Harness::new();
    let admin = harness.admin();
    let company = harness.company(&admin, "hr@acme.test");
    let student = harness.student("thabo@students.test", "Thabo");
    let job = harness
        .portal
        .careers
        .post_job(&harness.actor(&company), analyst_job())
        .expect("posted");

    harness
        .portal
        .careers
        .apply_for_job(&harness.actor(&student), &job.id)
        .expect("applied");
    assert!(matches!(
        harness
            .portal
            .careers
            .apply_for_job(&harness.actor(&student), &job.id),
        Err(PortalError::Conflict(_))
    ));
    assert_eq!(
        harness
            .portal
            .careers
            .student_job_applications(&harness.actor(&student))
            .expect("listing")
            .len(),
        1
    );
}

#[test]
fn applicants_are_ranked_by_match_score() {
    let harness = Harness::new();
    let admin = harness.admin();
    let company = harness.company(&admin, "hr@acme.test");
    let (_, weak) = harness.onboard("weak@students.test", student_profile("Weak", &["Excel"], 0));
    let (_, strong) = harness.onboard(
        "strong@students.test",
        student_profile("Strong", &["sql", "python"], 3),
    );
    let job = harness
        .portal
        .careers
        .post_job(&harness.actor(&company), analyst_job())
        .expect("posted");

    for token in [&weak, &strong] {
        harness
            .portal
            .careers
            .apply_for_job(&harness.actor(token), &job.id)
            .expect("applied");
    }

    let applicants = harness
        .portal
        .careers
        .job_applicants(&harness.actor(&company), &job.id)
        .expect("applicants");
    assert_eq!(applicants.len(), 2);
    assert_eq!(applicants[0].student_name, "Strong");
    assert_eq!(applicants[0].score.score, 100);
    assert_eq!(applicants[1].student_name, "Weak");
    assert_eq!(applicants[1].score.score, 0);
    assert_eq!(
        applicants[1].score.missing_skills,
        vec!["SQL".to_string(), "Python".to_string()]
    );
}

#[test]
fn only_the_owning_company_reviews_applicants() {
    let harness = Harness::new();
    let admin = harness.admin();
    let owner = harness.company(&admin, "hr@acme.test");
    let rival = harness.company(&admin, "hr@rival.test");
    let student = harness.student("thabo@students.test", "Thabo");
    let job = harness
        .portal
        .careers
        .post_job(&harness.actor(&owner), analyst_job())
        .expect("posted");
    let application = harness
        .portal
        .careers
        .apply_for_job(&harness.actor(&student), &job.id)
        .expect("applied");

    assert!(matches!(
        harness
            .portal
            .careers
            .job_applicants(&harness.actor(&rival), &job.id),
        Err(PortalError::Forbidden(_))
    ));
    assert!(matches!(
        harness.portal.careers.set_job_application_status(
            &harness.actor(&rival),
            &application.id,
            JobApplicationStatus::Shortlisted
        ),
        Err(PortalError::Forbidden(_))
    ));
    assert!(matches!(
        harness.portal.careers.set_job_application_status(
            &harness.actor(&owner),
            &application.id,
            JobApplicationStatus::Pending
        ),
        Err(PortalError::Validation(ValidationFailure::UnsupportedStatus("pending")))
    ));

    let shortlisted = harness
        .portal
        .careers
        .set_job_application_status(
            &harness.actor(&owner),
            &application.id,
            JobApplicationStatus::Shortlisted,
        )
        .expect("shortlisted");
    assert_eq!(shortlisted.status, JobApplicationStatus::Shortlisted);
    assert!(shortlisted.updated_at.is_some());
}

#[test]
fn closed_jobs_leave_the_board_and_refuse_applications() {
    let harness = Harness::new();
    let admin = harness.admin();
    let company = harness.company(&admin, "hr@acme.test");
    let rival = harness.company(&admin, "hr@rival.test");
    let student = harness.student("thabo@students.test", "Thabo");
    let job = harness
        .portal
        .careers
        .post_job(&harness.actor(&company), analyst_job())
        .expect("posted");

    let err = harness
        .portal
        .careers
        .close_job(&harness.actor(&rival), &job.id)
        .expect_err("foreign job");
    assert!(matches!(err, PortalError::Forbidden(_)));

    let closed = harness
        .portal
        .careers
        .close_job(&harness.actor(&company), &job.id)
        .expect("closed");
    assert_eq!(closed.status, JobStatus::Closed);

    assert!(harness
        .portal
        .careers
        .active_jobs(&harness.actor(&student))
        .expect("listing")
        .is_empty());
    let err = harness
        .portal
        .careers
        .apply_for_job(&harness.actor(&student), &job.id)
        .expect_err("closed job");
    assert!(matches!(
        err,
        PortalError::Validation(ValidationFailure::JobClosed(_))
    ));

    let own = harness
        .portal
        .careers
        .company_jobs(&harness.actor(&company))
        .expect("company listing");
    assert_eq!(own.len(), 1);
}

#[test]
fn applying_to_unknown_jobs_is_not_found() {
    let harness = Harness::new();
    let student = harness.student("thabo@students.test", "Thabo");
    let err = harness
        .portal
        .careers
        .apply_for_job(
            &harness.actor(&student),
            &crate::portal::careers::domain::JobId("job-missing".to_string()),
        )
        .expect_err("unknown job");
    assert!(matches!(err, PortalError::NotFound("job")));
}
