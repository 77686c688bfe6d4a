use crate::infra::{build_portal, parse_cap, InMemoryPortal};
use career_gateway::config::{AdminSeed, PortalSettings, DEFAULT_APPLICATION_CAP};
use career_gateway::error::AppError;
use career_gateway::portal::accounts::domain::{
    AccountStatus, CompanyProfile, Credentials, InstituteProfile, Profile, Registration,
    StudentProfile,
};
use career_gateway::portal::accounts::identity::SessionToken;
use career_gateway::portal::admissions::domain::{
    Application, ApplicationStatus, Course, CourseDraft, InstitutionDraft,
};
use career_gateway::portal::careers::domain::{JobDraft, Qualifications};
use career_gateway::portal::{Actor, PortalError};
use clap::Args;
use std::sync::Arc;

const DEMO_PASSWORD: &str = "demo-password";
const ADMIN_EMAIL: &str = "admin@gateway.demo";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Maximum applications per student and institution
    #[arg(long, value_parser = parse_cap, default_value_t = DEFAULT_APPLICATION_CAP)]
    pub(crate) application_cap: usize,
    /// Skip the job matching portion of the demo
    #[arg(long)]
    pub(crate) skip_jobs: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let settings = PortalSettings {
        application_cap: args.application_cap,
        bootstrap_admin: Some(AdminSeed {
            email: ADMIN_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
        }),
        ..PortalSettings::default()
    };
    let demo = Demo {
        portal: build_portal(&settings)?,
    };

    println!("Career gateway demo");
    let admin = demo.sign_in(ADMIN_EMAIL)?;

    let (registrar_a, courses_a) =
        demo.institute(&admin, "registrar@highlands.demo", &["BSc IT", "BSc Stats", "BA Law"])?;
    let (registrar_b, courses_b) =
        demo.institute(&admin, "registrar@lowlands.demo", &["BEng Civil"])?;

    let student = demo.student("thabo@students.demo", "Thabo", &["SQL", "Excel"], 1)?;
    let waiting = demo.student("lerato@students.demo", "Lerato", &["Python"], 3)?;

    println!("\nApplications (cap {} per institution)", args.application_cap);
    let mut submitted = Vec::new();
    for course in &courses_a {
        match demo
            .portal
            .admissions
            .submit_application(&student, &course.id)
        {
            Ok(application) => {
                println!("- Thabo -> {}: {}", course.name, application.status.label());
                submitted.push(application);
            }
            Err(err) => println!("- Thabo -> {}: refused ({err})", course.name),
        }
    }
    let first_choice = submitted
        .first()
        .cloned()
        .ok_or(PortalError::NotFound("application"))?;
    let elsewhere = demo
        .portal
        .admissions
        .submit_application(&student, &courses_b[0].id)?;
    println!("- Thabo -> {}: {}", courses_b[0].name, elsewhere.status.label());
    let queued = demo
        .portal
        .admissions
        .submit_application(&waiting, &courses_a[0].id)?;
    println!("- Lerato -> {}: {}", courses_a[0].name, queued.status.label());

    println!("\nInstitution decisions");
    demo.decide(&registrar_a, &first_choice, ApplicationStatus::Admitted)?;
    demo.decide(&registrar_a, &queued, ApplicationStatus::Waiting)?;
    demo.decide(&registrar_b, &elsewhere, ApplicationStatus::Admitted)?;

    let competing = demo.portal.admissions.student_applications(&student)?;
    println!(
        "\nThabo holds {} competing admissions",
        competing.competing_admissions.len()
    );

    let outcome = demo
        .portal
        .admissions
        .resolve_multiple_admissions(&student, &elsewhere.id)?;
    println!("Thabo keeps {} ({})", outcome.kept, courses_b[0].name);
    for released in &outcome.released {
        println!("- released {released}");
    }
    for promoted in &outcome.promoted {
        println!("- promoted from waitlist {promoted}");
    }
    let promoted = demo.portal.admissions.student_applications(&waiting)?;
    for application in &promoted.applications {
        println!(
            "Lerato's application for {} is now {}",
            application.course_name,
            application.status.label()
        );
    }

    if !args.skip_jobs {
        demo.job_matching(&admin, &[&student, &waiting])?;
    }

    Ok(())
}

struct Demo {
    portal: Arc<InMemoryPortal>,
}

impl Demo {
    fn sign_in(&self, email: &str) -> Result<Actor, PortalError> {
        let signed_in = self.portal.accounts.sign_in(&Credentials {
            email: email.to_string(),
            password: DEMO_PASSWORD.to_string(),
        })?;
        self.actor(&signed_in.token)
    }

    fn actor(&self, token: &SessionToken) -> Result<Actor, PortalError> {
        self.portal.accounts.actor(token)
    }

    /// Register, confirm the mailed code and approve when the role needs it.
    fn onboard(
        &self,
        admin: Option<&Actor>,
        email: &str,
        profile: Profile,
    ) -> Result<Actor, PortalError> {
        let account = self.portal.accounts.register(Registration {
            email: email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            confirm_password: DEMO_PASSWORD.to_string(),
            profile,
        })?;
        let code = self
            .portal
            .accounts
            .identity()
            .latest_code_for(email)
            .ok_or(PortalError::NotFound("verification code"))?;
        self.portal.accounts.confirm_email(&code)?;
        if let (AccountStatus::Pending, Some(admin)) = (account.status, admin) {
            self.portal.accounts.approve(admin, &account.id)?;
            println!("Approved {} account {email}", account.role().label());
        }
        self.sign_in(email)
    }

    fn student(
        &self,
        email: &str,
        name: &str,
        skills: &[&str],
        experience_years: u8,
    ) -> Result<Actor, PortalError> {
        let profile = Profile::Student(StudentProfile {
            name: name.to_string(),
            phone: String::new(),
            address: String::new(),
            skills: skills.iter().map(|skill| skill.to_string()).collect(),
            experience_years,
            transcript: None,
            certificates: Vec::new(),
        });
        self.onboard(None, email, profile)
    }

    fn institute(
        &self,
        admin: &Actor,
        email: &str,
        courses: &[&str],
    ) -> Result<(Actor, Vec<Course>), PortalError> {
        let profile = Profile::Institute(InstituteProfile {
            name: "Registrar".to_string(),
            phone: String::new(),
            address: String::new(),
            institution_name: email.to_string(),
            institution_type: "university".to_string(),
        });
        let registrar = self.onboard(Some(admin), email, profile)?;
        let institution = self.portal.admissions.create_institution(
            admin,
            InstitutionDraft {
                name: email.to_string(),
                kind: "university".to_string(),
                email: email.to_string(),
                location: "Maseru".to_string(),
                status: None,
            },
        )?;
        println!("Institution {} opened", institution.id);

        let courses = courses
            .iter()
            .map(|name| {
                self.portal.admissions.create_course(
                    &registrar,
                    CourseDraft {
                        name: name.to_string(),
                        faculty: "General".to_string(),
                        duration: "4 years".to_string(),
                        requirements: String::new(),
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((registrar, courses))
    }

    fn decide(
        &self,
        registrar: &Actor,
        application: &Application,
        status: ApplicationStatus,
    ) -> Result<(), PortalError> {
        let updated = self
            .portal
            .admissions
            .set_application_status(registrar, &application.id, status)?;
        println!(
            "- {} for {}: {}",
            updated.id,
            updated.course_name,
            updated.status.label()
        );
        Ok(())
    }

    fn job_matching(&self, admin: &Actor, students: &[&Actor]) -> Result<(), PortalError> {
        let company = self.onboard(
            Some(admin),
            "hr@maluti-mining.demo",
            Profile::Company(CompanyProfile {
                name: "Hiring Manager".to_string(),
                phone: String::new(),
                address: String::new(),
                company_name: "Maluti Mining".to_string(),
                industry: "Mining".to_string(),
            }),
        )?;
        let job = self.portal.careers.post_job(
            &company,
            JobDraft {
                title: "Data Analyst".to_string(),
                description: "Production reporting".to_string(),
                location: "Maseru".to_string(),
                job_type: "full-time".to_string(),
                qualifications: Qualifications {
                    minimum_qualification: "BSc".to_string(),
                    required_skills: vec!["SQL".to_string(), "Python".to_string()],
                    experience_years: 2,
                },
            },
        )?;
        for student in students {
            self.portal.careers.apply_for_job(student, &job.id)?;
        }

        println!("\nApplicants for {} ranked by match", job.title);
        for applicant in self.portal.careers.job_applicants(&company, &job.id)? {
            println!(
                "- {:<8} {:>3}%  matched [{}]  missing [{}]  experience {}",
                applicant.student_name,
                applicant.score.score,
                applicant.score.matched_skills.join(", "),
                applicant.score.missing_skills.join(", "),
                if applicant.score.experience_met { "met" } else { "short" }
            );
        }
        Ok(())
    }
}
