use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::PortalSettings;
use crate::portal::accounts::domain::{
    Account, AccountFilter, AccountId, CompanyProfile, Credentials, InstituteProfile, Profile,
    Registration, StudentProfile,
};
use crate::portal::accounts::identity::SessionToken;
use crate::portal::admissions::domain::{
    Application, ApplicationFilter, ApplicationId, Course, CourseDraft, CourseId, CourseStatus,
    Institution, InstitutionDraft, InstitutionId,
};
use crate::portal::careers::domain::{
    JobApplication, JobApplicationId, JobFilter, JobId, JobPosting, JobStatus,
};
use crate::portal::repository::{
    AccountRepository, AdmissionBatch, AdmissionsRepository, CareersRepository, RepositoryError,
};
use crate::portal::{Actor, InMemoryIdentityProvider, MemoryStore, Portal};

pub(super) type TestPortal = Portal<MemoryStore, InMemoryIdentityProvider>;

pub(super) const PASSWORD: &str = "s3cret-pass";

pub(super) struct Harness {
    pub(super) portal: Arc<TestPortal>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) identity: Arc<InMemoryIdentityProvider>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with_settings(PortalSettings::default())
    }

    pub(super) fn with_settings(settings: PortalSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::default());
        let portal = Arc::new(Portal::new(store.clone(), identity.clone(), &settings));
        Self {
            portal,
            store,
            identity,
        }
    }

    pub(super) fn actor(&self, token: &SessionToken) -> Actor {
        self.portal.accounts.actor(token).expect("valid session")
    }

    pub(super) fn sign_in(&self, email: &str) -> SessionToken {
        self.portal
            .accounts
            .sign_in(&credentials(email))
            .expect("sign in")
            .token
    }

    /// Register, verify the email and sign in.
    pub(super) fn onboard(&self, email: &str, profile: Profile) -> (Account, SessionToken) {
        let account = self
            .portal
            .accounts
            .register(registration(email, profile))
            .expect("registers");
        let code = self.identity.latest_code_for(email).expect("code sent");
        self.portal.accounts.confirm_email(&code).expect("verifies");
        (account, self.sign_in(email))
    }

    pub(super) fn admin(&self) -> SessionToken {
        self.portal
            .accounts
            .seed_admin("root@gateway.test", PASSWORD, "Root")
            .expect("admin seeded");
        self.sign_in("root@gateway.test")
    }

    pub(super) fn student(&self, email: &str, name: &str) -> SessionToken {
        self.onboard(email, student_profile(name, &[], 0)).1
    }

    /// An approved institute account managing a freshly created institution.
    pub(super) fn institute(
        &self,
        admin: &SessionToken,
        email: &str,
    ) -> (SessionToken, Institution) {
        let (account, token) = self.onboard(email, institute_profile("Registrar"));
        let admin = self.actor(admin);
        self.portal
            .accounts
            .approve(&admin, &account.id)
            .expect("approved");
        let institution = self
            .portal
            .admissions
            .create_institution(&admin, institution_draft(email))
            .expect("institution created");
        (token, institution)
    }

    pub(super) fn company(&self, admin: &SessionToken, email: &str) -> SessionToken {
        let (account, token) = self.onboard(email, company_profile("Acme Mining"));
        self.portal
            .accounts
            .approve(&self.actor(admin), &account.id)
            .expect("approved");
        token
    }

    pub(super) fn course(&self, institute: &SessionToken, name: &str) -> Course {
        self.portal
            .admissions
            .create_course(
                &self.actor(institute),
                CourseDraft {
                    name: name.to_string(),
                    faculty: "Science".to_string(),
                    duration: "3 years".to_string(),
                    requirements: "Matric".to_string(),
                },
            )
            .expect("course created")
    }

    pub(super) fn apply(&self, student: &SessionToken, course: &Course) -> Application {
        self.portal
            .admissions
            .submit_application(&self.actor(student), &course.id)
            .expect("application submitted")
    }
}

pub(super) fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: PASSWORD.to_string(),
    }
}

pub(super) fn registration(email: &str, profile: Profile) -> Registration {
    Registration {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        profile,
    }
}

pub(super) fn student_profile(name: &str, skills: &[&str], years: u8) -> Profile {
    Profile::Student(StudentProfile {
        name: name.to_string(),
        phone: "+266 5000 0000".to_string(),
        address: "Maseru".to_string(),
        skills: skills.iter().map(|skill| skill.to_string()).collect(),
        experience_years: years,
        transcript: None,
        certificates: Vec::new(),
    })
}

pub(super) fn institute_profile(name: &str) -> Profile {
    Profile::Institute(InstituteProfile {
        name: name.to_string(),
        phone: String::new(),
        address: String::new(),
        institution_name: "Highlands College".to_string(),
        institution_type: "college".to_string(),
    })
}

pub(super) fn company_profile(company_name: &str) -> Profile {
    Profile::Company(CompanyProfile {
        name: "Hiring Manager".to_string(),
        phone: String::new(),
        address: String::new(),
        company_name: company_name.to_string(),
        industry: "Mining".to_string(),
    })
}

pub(super) fn institution_draft(email: &str) -> InstitutionDraft {
    InstitutionDraft {
        name: format!("Institution of {email}"),
        kind: "university".to_string(),
        email: email.to_string(),
        location: "Maseru".to_string(),
        status: None,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose every operation fails as if the backend were offline.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl AccountRepository for UnavailableStore {
    fn insert_account(&self, _account: Account) -> Result<Account, RepositoryError> {
        offline()
    }

    fn modify_account(
        &self,
        _id: &AccountId,
        _change: &mut dyn FnMut(&mut Account),
    ) -> Result<Account, RepositoryError> {
        offline()
    }

    fn fetch_account(&self, _id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        offline()
    }

    fn find_accounts(&self, _filter: &AccountFilter) -> Result<Vec<Account>, RepositoryError> {
        offline()
    }
}

impl AdmissionsRepository for UnavailableStore {
    fn insert_institution(
        &self,
        _institution: Institution,
    ) -> Result<Institution, RepositoryError> {
        offline()
    }

    fn update_institution(&self, _institution: Institution) -> Result<(), RepositoryError> {
        offline()
    }

    fn delete_institution(&self, _id: &InstitutionId) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_institution(
        &self,
        _id: &InstitutionId,
    ) -> Result<Option<Institution>, RepositoryError> {
        offline()
    }

    fn institutions(&self) -> Result<Vec<Institution>, RepositoryError> {
        offline()
    }

    fn institution_by_email(&self, _email: &str) -> Result<Option<Institution>, RepositoryError> {
        offline()
    }

    fn insert_course(&self, _course: Course) -> Result<Course, RepositoryError> {
        offline()
    }

    fn set_course_status(
        &self,
        _id: &CourseId,
        _status: CourseStatus,
    ) -> Result<Course, RepositoryError> {
        offline()
    }

    fn fetch_course(&self, _id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        offline()
    }

    fn courses_for(&self, _institution: &InstitutionId) -> Result<Vec<Course>, RepositoryError> {
        offline()
    }

    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn find_applications(
        &self,
        _filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn commit(&self, _batch: AdmissionBatch) -> Result<(), RepositoryError> {
        offline()
    }
}

impl CareersRepository for UnavailableStore {
    fn insert_job(&self, _job: JobPosting) -> Result<JobPosting, RepositoryError> {
        offline()
    }

    fn fetch_job(&self, _id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        offline()
    }

    fn set_job_status(
        &self,
        _id: &JobId,
        _status: JobStatus,
    ) -> Result<JobPosting, RepositoryError> {
        offline()
    }

    fn find_jobs(&self, _filter: &JobFilter) -> Result<Vec<JobPosting>, RepositoryError> {
        offline()
    }

    fn insert_job_application(
        &self,
        _application: JobApplication,
    ) -> Result<JobApplication, RepositoryError> {
        offline()
    }

    fn update_job_application(&self, _application: JobApplication) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_job_application(
        &self,
        _id: &JobApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        offline()
    }

    fn applications_for_job(&self, _job: &JobId) -> Result<Vec<JobApplication>, RepositoryError> {
        offline()
    }

    fn applications_by_student(
        &self,
        _student: &AccountId,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        offline()
    }
}
