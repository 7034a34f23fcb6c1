use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::workflows::evidence::Visibility;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_UPLOAD_PATH: &str = "/api/documents/upload";

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
    pub verification: VerificationConfig,
    pub evidence: EvidenceConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let base_url =
            env::var("VERIFICATION_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&base_url)?;
        let upload_path = env::var("VERIFICATION_UPLOAD_PATH")
            .unwrap_or_else(|_| DEFAULT_UPLOAD_PATH.to_string());
        let api_token = env::var("VERIFICATION_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let catalog_path = env::var("EVIDENCE_CATALOG_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let default_visibility = match env::var("EVIDENCE_DEFAULT_VISIBILITY") {
            Ok(raw) => raw
                .parse::<Visibility>()
                .map_err(|_| ConfigError::InvalidVisibility { value: raw })?,
            Err(_) => Visibility::default(),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            verification: VerificationConfig {
                base_url,
                upload_path,
                api_token,
            },
            evidence: EvidenceConfig {
                catalog_path,
                default_visibility,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Where the remote verification service lives and how to authenticate with it.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub base_url: String,
    pub upload_path: String,
    pub api_token: Option<String>,
}

impl VerificationConfig {
    pub fn upload_url(&self) -> String {
        let path = self.upload_path.trim();
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Checklist source and the initial sharing scope for new sessions.
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
    pub catalog_path: Option<PathBuf>,
    pub default_visibility: Visibility,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBaseUrl { value: String },
    InvalidVisibility { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBaseUrl { value } => write!(
                f,
                "VERIFICATION_BASE_URL must be an http(s) URL, got '{}'",
                value
            ),
            ConfigError::InvalidVisibility { value } => write!(
                f,
                "EVIDENCE_DEFAULT_VISIBILITY must be private, shared-with-reviewer or public, got '{}'",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
