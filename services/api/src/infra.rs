use career_gateway::config::PortalSettings;
use career_gateway::error::AppError;
use career_gateway::portal::{InMemoryIdentityProvider, MemoryStore, Portal};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InMemoryPortal = Portal<MemoryStore, InMemoryIdentityProvider>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Portal backed by the in-process store, with the configured administrator seeded.
pub(crate) fn build_portal(settings: &PortalSettings) -> Result<Arc<InMemoryPortal>, AppError> {
    let portal = Portal::new(
        Arc::new(MemoryStore::new()),
        Arc::new(InMemoryIdentityProvider::default()),
        settings,
    );

    if let Some(seed) = &settings.bootstrap_admin {
        portal
            .accounts
            .seed_admin(&seed.email, &seed.password, "Administrator")?;
    }

    Ok(Arc::new(portal))
}

pub(crate) fn parse_cap(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(cap) if cap > 0 => Ok(cap),
        _ => Err(format!("'{raw}' is not a positive application cap")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use career_gateway::config::AdminSeed;
    use career_gateway::portal::accounts::domain::{Credentials, Role};
    use career_gateway::portal::AccessGate;

    #[test]
    fn configured_admin_can_sign_in() {
        let settings = PortalSettings {
            bootstrap_admin: Some(AdminSeed {
                email: "root@gateway.test".to_string(),
                password: "admin-pass".to_string(),
            }),
            ..PortalSettings::default()
        };
        let portal = build_portal(&settings).expect("portal builds");

        let signed_in = portal
            .accounts
            .sign_in(&Credentials {
                email: "root@gateway.test".to_string(),
                password: "admin-pass".to_string(),
            })
            .expect("admin signs in");
        assert_eq!(signed_in.gate, AccessGate::Dashboard(Role::Admin));
    }

    #[test]
    fn cap_must_be_positive() {
        assert_eq!(parse_cap("3"), Ok(3));
        assert!(parse_cap("0").is_err());
        assert!(parse_cap("two").is_err());
    }
}
