//! Application Configuration
//!
//! Holds the credentials and ambient identifiers the hosting environment
//! supplies once per deployed instance: a literal access token or a service
//! account key, plus the default project and location every block falls back
//! to when a path parameter is not passed explicitly.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Per-instance application configuration.
///
/// Field names follow the platform contract (camelCase) so a config file
/// written for any other connector of the same app works here unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Pre-generated OAuth2 bearer token. Used as-is, never refreshed.
    pub access_token: Option<String>,
    /// Service account key document (JSON string) used to mint tokens.
    pub service_account_key: Option<String>,
    /// Default project substituted into `{project}`-style placeholders.
    pub project_id: Option<String>,
    /// Default location substituted into `{location}` placeholders.
    pub location: Option<String>,
    /// Per-service base URL overrides, e.g. `compute` ->
    /// `https://compute.restricted.googleapis.com/compute/v1` for Private
    /// Google Access deployments. Also how the test suite points blocks at a
    /// mock server.
    pub endpoint_overrides: HashMap<String, String>,
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcpflow").join("config.yaml"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Effective access token (config > environment)
    pub fn effective_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var("GCPFLOW_ACCESS_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }

    /// Effective service account key (config > environment)
    pub fn effective_service_account_key(&self) -> Option<String> {
        self.service_account_key
            .clone()
            .or_else(|| std::env::var("GCPFLOW_SERVICE_ACCOUNT_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    /// Effective project (config > environment)
    pub fn effective_project(&self) -> Option<String> {
        self.project_id
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(default_project_from_env)
    }

    /// Base URL for a service, honoring any configured override.
    pub fn base_url_for<'a>(&'a self, service: &str, default: &'a str) -> &'a str {
        self.endpoint_overrides
            .get(service)
            .map(String::as_str)
            .unwrap_or(default)
    }
}

/// Read the default project from the environment.
/// Security: Validates project ID format before returning
pub fn default_project_from_env() -> Option<String> {
    for var in ["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }
    None
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    let mut chars = project.chars();

    // Must start with a letter
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {},
        _ => return false,
    }

    // Must not end with a hyphen
    if project.ends_with('-') {
        return false;
    }

    // All chars must be lowercase, digit, or hyphen
    project.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_id() {
        assert!(validate_project_id("my-project-123"));
        assert!(validate_project_id("abcdef"));
        assert!(!validate_project_id("short"));
        assert!(!validate_project_id("1starts-with-digit"));
        assert!(!validate_project_id("ends-with-hyphen-"));
        assert!(!validate_project_id("Has-Uppercase"));
    }

    #[test]
    fn test_config_parses_camel_case_keys() {
        let yaml = r#"
accessToken: tok1
projectId: my-project-123
endpointOverrides:
  compute: http://localhost:9000
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.access_token.as_deref(), Some("tok1"));
        assert_eq!(config.project_id.as_deref(), Some("my-project-123"));
        assert_eq!(
            config.base_url_for("compute", "https://compute.googleapis.com/compute/v1"),
            "http://localhost:9000"
        );
        assert_eq!(
            config.base_url_for("container", "https://container.googleapis.com/v1"),
            "https://container.googleapis.com/v1"
        );
    }

    #[test]
    fn test_empty_credentials_are_treated_as_absent() {
        let config = AppConfig {
            access_token: Some(String::new()),
            ..Default::default()
        };
        // Guard against env leakage from the host shell.
        if std::env::var("GCPFLOW_ACCESS_TOKEN").is_err() {
            assert!(config.effective_access_token().is_none());
        }
    }
}
