use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalSettings::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

pub const DEFAULT_APPLICATION_CAP: usize = 2;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Business rule dials for the portal services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSettings {
    /// Maximum number of course applications per student and institution.
    pub application_cap: usize,
    pub min_password_length: usize,
    /// Administrator seeded at start-up; admins cannot self-register.
    pub bootstrap_admin: Option<AdminSeed>,
}

impl PortalSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let application_cap = match env::var("PORTAL_APPLICATION_CAP") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|cap| *cap > 0)
                .ok_or(ConfigError::InvalidApplicationCap)?,
            Err(_) => DEFAULT_APPLICATION_CAP,
        };

        let min_password_length = match env::var("PORTAL_MIN_PASSWORD_LENGTH") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidPasswordLength)?,
            Err(_) => DEFAULT_MIN_PASSWORD_LENGTH,
        };

        let bootstrap_admin = match (
            env::var("PORTAL_ADMIN_EMAIL"),
            env::var("PORTAL_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(AdminSeed { email, password }),
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => return Err(ConfigError::IncompleteAdminSeed),
            (Err(_), Err(_)) => None,
        };

        Ok(Self {
            application_cap,
            min_password_length,
            bootstrap_admin,
        })
    }
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            application_cap: DEFAULT_APPLICATION_CAP,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            bootstrap_admin: None,
        }
    }
}

/// Credentials for the administrator created at start-up.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidApplicationCap,
    InvalidPasswordLength,
    IncompleteAdminSeed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidApplicationCap => {
                write!(f, "PORTAL_APPLICATION_CAP must be a positive integer")
            }
            ConfigError::InvalidPasswordLength => {
                write!(f, "PORTAL_MIN_PASSWORD_LENGTH must be a non-negative integer")
            }
            ConfigError::IncompleteAdminSeed => write!(
                f,
                "PORTAL_ADMIN_EMAIL and PORTAL_ADMIN_PASSWORD must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidApplicationCap
            | ConfigError::InvalidPasswordLength
            | ConfigError::IncompleteAdminSeed => None,
        }
    }
}
