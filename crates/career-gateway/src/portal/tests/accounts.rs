use super::common::*;

use crate::portal::accounts::domain::{
    AccountFilter, AccountStatus, AdminProfile, Profile, Role, StudentProfileUpdate,
};
use crate::portal::accounts::identity::IdentityError;
use crate::portal::repository::AccountRepository;
use crate::portal::{AccessGate, PortalError, ValidationFailure};

#[test]
fn students_are_active_while_institutes_and_companies_wait_for_approval() {
    let harness = Harness::new();
    let student = harness
        .portal
        .accounts
        .register(registration("thabo@students.test", student_profile("Thabo", &[], 0)))
        .expect("student registers");
    let company = harness
        .portal
        .accounts
        .register(registration("hr@acme.test", company_profile("Acme")))
        .expect("company registers");

    assert_eq!(student.status, AccountStatus::Active);
    assert_eq!(company.status, AccountStatus::Pending);
    assert!(!company.email_verified);
    assert_eq!(harness.identity.outbox().len(), 2);
}

#[test]
fn registration_validation_runs_before_the_identity_provider() {
    let harness = Harness::new();

    let mut mismatch = registration("a@b.test", student_profile("A", &[], 0));
    mismatch.confirm_password = "different".to_string();
    assert!(matches!(
        harness.portal.accounts.register(mismatch),
        Err(PortalError::Validation(ValidationFailure::PasswordMismatch))
    ));

    let mut short = registration("a@b.test", student_profile("A", &[], 0));
    short.password = "abc".to_string();
    short.confirm_password = "abc".to_string();
    assert!(matches!(
        harness.portal.accounts.register(short),
        Err(PortalError::Validation(ValidationFailure::PasswordTooShort { min: 6 }))
    ));

    assert!(matches!(
        harness
            .portal
            .accounts
            .register(registration("not-an-email", student_profile("A", &[], 0))),
        Err(PortalError::Validation(ValidationFailure::InvalidEmail(_)))
    ));
    assert!(harness.identity.outbox().is_empty());
}

#[test]
fn duplicate_emails_are_rejected_by_the_identity_provider() {
    let harness = Harness::new();
    harness
        .portal
        .accounts
        .register(registration("dup@students.test", student_profile("One", &[], 0)))
        .expect("first registration");

    let err = harness
        .portal
        .accounts
        .register(registration("DUP@students.test", student_profile("Two", &[], 0)))
        .expect_err("duplicate");
    assert!(matches!(err, PortalError::Identity(IdentityError::EmailTaken)));
}

#[test]
fn admins_cannot_self_register() {
    let harness = Harness::new();
    let err = harness
        .portal
        .accounts
        .register(registration(
            "boss@gateway.test",
            Profile::Admin(AdminProfile {
                name: "Boss".to_string(),
            }),
        ))
        .expect_err("admin self registration");
    assert!(matches!(err, PortalError::Forbidden(_)));
}

#[test]
fn unverified_sign_in_lands_on_verification_gate() {
    let harness = Harness::new();
    harness
        .portal
        .accounts
        .register(registration("new@students.test", student_profile("New", &[], 0)))
        .expect("registers");

    let signed_in = harness
        .portal
        .accounts
        .sign_in(&credentials("new@students.test"))
        .expect("sign in");
    assert_eq!(signed_in.gate, AccessGate::VerificationRequired);

    let actor = harness.actor(&signed_in.token);
    assert!(matches!(
        actor.require(Role::Student),
        Err(PortalError::Forbidden(_))
    ));
}

#[test]
fn rejected_company_signs_in_but_stays_off_the_dashboard() {
    let harness = Harness::new();
    let admin = harness.admin();
    let (company, _) = harness.onboard("hr@acme.test", company_profile("Acme"));

    let rejected = harness
        .portal
        .accounts
        .reject(&harness.actor(&admin), &company.id)
        .expect("rejected");
    assert_eq!(rejected.status, AccountStatus::Rejected);

    let signed_in = harness
        .portal
        .accounts
        .sign_in(&credentials("hr@acme.test"))
        .expect("sign in still succeeds");
    assert_eq!(signed_in.gate, AccessGate::Rejected);
    assert!(harness
        .portal
        .careers
        .company_jobs(&harness.actor(&signed_in.token))
        .is_err());
}

#[test]
fn approval_requires_an_administrator() {
    let harness = Harness::new();
    let student = harness.student("thabo@students.test", "Thabo");
    let (company, _) = harness.onboard("hr@acme.test", company_profile("Acme"));

    let err = harness
        .portal
        .accounts
        .approve(&harness.actor(&student), &company.id)
        .expect_err("students cannot approve");
    assert!(matches!(err, PortalError::Forbidden(_)));

    let stored = harness
        .portal
        .accounts
        .list_accounts(
            &harness.actor(&harness.admin()),
            &AccountFilter {
                role: Some(Role::Company),
                status: None,
            },
        )
        .expect("listing");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, AccountStatus::Pending);
}

#[test]
fn approve_then_suspend_moves_the_gate() {
    let harness = Harness::new();
    let admin = harness.admin();
    let (institute, token) = harness.onboard("registrar@nul.test", institute_profile("Registrar"));
    assert_eq!(harness.actor(&token).gate(), AccessGate::PendingApproval);

    harness
        .portal
        .accounts
        .approve(&harness.actor(&admin), &institute.id)
        .expect("approved");
    assert_eq!(
        harness.actor(&token).gate(),
        AccessGate::Dashboard(Role::Institute)
    );

    harness
        .portal
        .accounts
        .suspend(&harness.actor(&admin), &institute.id)
        .expect("suspended");
    assert_eq!(harness.actor(&token).gate(), AccessGate::Suspended);
}

#[test]
fn administrators_cannot_be_targeted() {
    let harness = Harness::new();
    let admin = harness.admin();
    let actor = harness.actor(&admin);
    let err = harness
        .portal
        .accounts
        .suspend(&actor, actor.id())
        .expect_err("admin target");
    assert!(matches!(err, PortalError::Forbidden(_)));
}

#[test]
fn student_profile_update_normalizes_lists() {
    let harness = Harness::new();
    let token = harness.student("thabo@students.test", "Thabo");

    let updated = harness
        .portal
        .accounts
        .update_student_profile(
            &harness.actor(&token),
            StudentProfileUpdate {
                skills: Some(vec![" Rust ".to_string(), String::new(), "SQL".to_string()]),
                experience_years: Some(2),
                transcript: Some("  ".to_string()),
                certificates: None,
            },
        )
        .expect("profile updated");

    let profile = updated.profile.as_student().expect("student profile");
    assert_eq!(profile.skills, vec!["Rust".to_string(), "SQL".to_string()]);
    assert_eq!(profile.experience_years, 2);
    assert_eq!(profile.transcript, None);
}

#[test]
fn profile_update_after_suspension_keeps_the_suspension() {
    let harness = Harness::new();
    let admin = harness.actor(&harness.admin());
    let student = harness.actor(&harness.student("thabo@students.test", "Thabo"));

    harness
        .portal
        .accounts
        .suspend(&admin, student.id())
        .expect("suspended");
    let updated = harness
        .portal
        .accounts
        .update_student_profile(
            &student,
            StudentProfileUpdate {
                skills: Some(vec!["Rust".to_string()]),
                ..StudentProfileUpdate::default()
            },
        )
        .expect("profile updated");
    assert_eq!(updated.status, AccountStatus::Suspended);

    let stored = harness
        .store
        .fetch_account(student.id())
        .expect("store reachable")
        .expect("account stored");
    assert_eq!(stored.status, AccountStatus::Suspended);
    let profile = stored.profile.as_student().expect("student profile");
    assert_eq!(profile.skills, vec!["Rust".to_string()]);
}

#[test]
fn status_change_keeps_a_concurrent_profile_update() {
    let harness = Harness::new();
    let admin = harness.actor(&harness.admin());
    let student = harness.actor(&harness.student("thabo@students.test", "Thabo"));

    harness
        .portal
        .accounts
        .update_student_profile(
            &student,
            StudentProfileUpdate {
                experience_years: Some(4),
                ..StudentProfileUpdate::default()
            },
        )
        .expect("profile updated");
    let suspended = harness
        .portal
        .accounts
        .suspend(&admin, student.id())
        .expect("suspended");

    let profile = suspended.profile.as_student().expect("student profile");
    assert_eq!(profile.experience_years, 4);
}

#[test]
fn verification_codes_are_spent_on_confirmation() {
    let harness = Harness::new();
    harness
        .portal
        .accounts
        .register(registration("thabo@students.test", student_profile("Thabo", &[], 0)))
        .expect("registers");
    let code = harness
        .identity
        .latest_code_for("thabo@students.test")
        .expect("code sent");

    let verified = harness.portal.accounts.confirm_email(&code).expect("verifies");
    assert!(verified.email_verified);
    assert!(harness.identity.outbox().is_empty());
    assert!(matches!(
        harness.portal.accounts.confirm_email(&code),
        Err(PortalError::Identity(IdentityError::UnknownVerificationCode))
    ));
}

#[test]
fn signed_out_tokens_are_unauthenticated() {
    let harness = Harness::new();
    let token = harness.student("thabo@students.test", "Thabo");
    harness.portal.accounts.sign_out(&token).expect("signed out");

    assert!(matches!(
        harness.portal.accounts.session(&token),
        Err(PortalError::Unauthenticated)
    ));
}
