use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::access::Actor;
use super::accounts::domain::{
    AccountFilter, AccountId, Credentials, Registration, StudentProfileUpdate,
};
use super::accounts::identity::{IdentityProvider, SessionToken};
use super::admissions::domain::{
    ApplicationId, ApplicationStatus, CourseDraft, CourseId, InstitutionDraft, InstitutionId,
};
use super::careers::domain::{JobApplicationId, JobApplicationStatus, JobDraft, JobId};
use super::error::PortalError;
use super::repository::PortalStore;
use super::Portal;

type SharedPortal<S, I> = Arc<Portal<S, I>>;

/// Router exposing the portal operations under `/api/v1`.
pub fn portal_router<S, I>(portal: SharedPortal<S, I>) -> Router
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/auth/register", post(register_handler::<S, I>))
        .route("/api/v1/auth/login", post(login_handler::<S, I>))
        .route("/api/v1/auth/logout", post(logout_handler::<S, I>))
        .route("/api/v1/auth/verify", post(verify_handler::<S, I>))
        .route("/api/v1/session", get(session_handler::<S, I>))
        .route(
            "/api/v1/students/me/profile",
            put(update_profile_handler::<S, I>),
        )
        .route("/api/v1/admin/accounts", get(list_accounts_handler::<S, I>))
        .route(
            "/api/v1/admin/accounts/:account_id/:decision",
            post(account_decision_handler::<S, I>),
        )
        .route(
            "/api/v1/institutions",
            get(list_institutions_handler::<S, I>).post(create_institution_handler::<S, I>),
        )
        .route(
            "/api/v1/institutions/:institution_id",
            put(update_institution_handler::<S, I>).delete(delete_institution_handler::<S, I>),
        )
        .route(
            "/api/v1/institutions/:institution_id/courses",
            get(list_courses_handler::<S, I>),
        )
        .route("/api/v1/courses", post(create_course_handler::<S, I>))
        .route(
            "/api/v1/courses/:course_id/close",
            post(close_course_handler::<S, I>),
        )
        .route("/api/v1/applications", post(submit_application_handler::<S, I>))
        .route(
            "/api/v1/applications/mine",
            get(student_applications_handler::<S, I>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(application_status_handler::<S, I>),
        )
        .route(
            "/api/v1/applications/:application_id/select",
            post(select_admission_handler::<S, I>),
        )
        .route(
            "/api/v1/institution/applications",
            get(institution_applications_handler::<S, I>),
        )
        .route(
            "/api/v1/jobs",
            get(active_jobs_handler::<S, I>).post(post_job_handler::<S, I>),
        )
        .route("/api/v1/jobs/mine", get(company_jobs_handler::<S, I>))
        .route("/api/v1/jobs/:job_id/close", post(close_job_handler::<S, I>))
        .route(
            "/api/v1/jobs/:job_id/applications",
            post(apply_for_job_handler::<S, I>),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants",
            get(job_applicants_handler::<S, I>),
        )
        .route(
            "/api/v1/job-applications/mine",
            get(student_job_applications_handler::<S, I>),
        )
        .route(
            "/api/v1/job-applications/:application_id/status",
            put(job_application_status_handler::<S, I>),
        )
        .with_state(portal)
}

/// The acting account, resolved from the `Authorization: Bearer` header.
pub struct Authenticated {
    pub actor: Actor,
    pub token: SessionToken,
}

#[async_trait]
impl<S, I> FromRequestParts<SharedPortal<S, I>> for Authenticated
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        portal: &SharedPortal<S, I>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| SessionToken(value.trim().to_string()))
            .ok_or_else(|| PortalError::Unauthenticated.into_response())?;

        let actor = portal
            .accounts
            .actor(&token)
            .map_err(IntoResponse::into_response)?;
        Ok(Self { actor, token })
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, PortalError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitApplicationRequest {
    course_id: CourseId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationStatusRequest {
    status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobApplicationStatusRequest {
    status: JobApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusQuery {
    #[serde(default)]
    status: Option<ApplicationStatus>,
}

pub(crate) async fn register_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    Json(registration): Json<Registration>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::CREATED, portal.accounts.register(registration))
}

pub(crate) async fn login_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::OK, portal.accounts.sign_in(&credentials))
}

pub(crate) async fn logout_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    match portal.accounts.sign_out(&auth.token) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn verify_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    Json(request): Json<VerifyRequest>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::OK, portal.accounts.confirm_email(&request.code))
}

pub(crate) async fn session_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::OK, portal.accounts.session(&auth.token))
}

pub(crate) async fn update_profile_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Json(update): Json<StudentProfileUpdate>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::OK,
        portal.accounts.update_student_profile(&auth.actor, update),
    )
}

pub(crate) async fn list_accounts_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Query(filter): Query<AccountFilter>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::OK, portal.accounts.list_accounts(&auth.actor, &filter))
}

pub(crate) async fn account_decision_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path((account_id, decision)): Path<(String, String)>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let target = AccountId(account_id);
    let result = match decision.as_str() {
        "approve" => portal.accounts.approve(&auth.actor, &target),
        "reject" => portal.accounts.reject(&auth.actor, &target),
        "suspend" => portal.accounts.suspend(&auth.actor, &target),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_institutions_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::OK, portal.admissions.list_institutions(&auth.actor))
}

pub(crate) async fn create_institution_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Json(draft): Json<InstitutionDraft>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::CREATED,
        portal.admissions.create_institution(&auth.actor, draft),
    )
}

pub(crate) async fn update_institution_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(institution_id): Path<String>,
    Json(draft): Json<InstitutionDraft>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = InstitutionId(institution_id);
    respond(
        StatusCode::OK,
        portal.admissions.update_institution(&auth.actor, &id, draft),
    )
}

pub(crate) async fn delete_institution_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(institution_id): Path<String>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = InstitutionId(institution_id);
    match portal.admissions.delete_institution(&auth.actor, &id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_courses_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(institution_id): Path<String>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = InstitutionId(institution_id);
    respond(StatusCode::OK, portal.admissions.list_courses(&auth.actor, &id))
}

pub(crate) async fn create_course_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Json(draft): Json<CourseDraft>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::CREATED,
        portal.admissions.create_course(&auth.actor, draft),
    )
}

pub(crate) async fn close_course_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(course_id): Path<String>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = CourseId(course_id);
    respond(
        StatusCode::OK,
        portal.admissions.close_course(&auth.actor, &id),
    )
}

pub(crate) async fn submit_application_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Json(request): Json<SubmitApplicationRequest>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::CREATED,
        portal
            .admissions
            .submit_application(&auth.actor, &request.course_id),
    )
}

pub(crate) async fn student_applications_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::OK,
        portal.admissions.student_applications(&auth.actor),
    )
}

pub(crate) async fn institution_applications_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Query(query): Query<StatusQuery>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::OK,
        portal
            .admissions
            .institution_applications(&auth.actor, query.status),
    )
}

pub(crate) async fn application_status_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(application_id): Path<String>,
    Json(request): Json<ApplicationStatusRequest>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ApplicationId(application_id);
    respond(
        StatusCode::OK,
        portal
            .admissions
            .set_application_status(&auth.actor, &id, request.status),
    )
}

pub(crate) async fn select_admission_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(application_id): Path<String>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ApplicationId(application_id);
    respond(
        StatusCode::OK,
        portal
            .admissions
            .resolve_multiple_admissions(&auth.actor, &id),
    )
}

pub(crate) async fn active_jobs_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::OK, portal.careers.active_jobs(&auth.actor))
}

pub(crate) async fn post_job_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Json(draft): Json<JobDraft>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::CREATED, portal.careers.post_job(&auth.actor, draft))
}

pub(crate) async fn company_jobs_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(StatusCode::OK, portal.careers.company_jobs(&auth.actor))
}

pub(crate) async fn close_job_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(job_id): Path<String>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    respond(StatusCode::OK, portal.careers.close_job(&auth.actor, &id))
}

pub(crate) async fn apply_for_job_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(job_id): Path<String>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    respond(
        StatusCode::CREATED,
        portal.careers.apply_for_job(&auth.actor, &id),
    )
}

pub(crate) async fn job_applicants_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(job_id): Path<String>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    respond(StatusCode::OK, portal.careers.job_applicants(&auth.actor, &id))
}

pub(crate) async fn student_job_applications_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::OK,
        portal.careers.student_job_applications(&auth.actor),
    )
}

pub(crate) async fn job_application_status_handler<S, I>(
    State(portal): State<SharedPortal<S, I>>,
    auth: Authenticated,
    Path(application_id): Path<String>,
    Json(request): Json<JobApplicationStatusRequest>,
) -> Response
where
    S: PortalStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobApplicationId(application_id);
    respond(
        StatusCode::OK,
        portal
            .careers
            .set_job_application_status(&auth.actor, &id, request.status),
    )
}
