//! Service settings, read from `SILO_*` environment variables

use silo_audit::{AuditProfile, CitationAuditor};
use silo_core::{SiloError, TenantRegistry, DEFAULT_MAX_REVISIONS};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: String,
    /// Tenant registry YAML; the bundled reference tenants when unset
    pub tenants_path: Option<PathBuf>,
    pub max_revisions: u32,
    pub run_timeout: Duration,
    /// Audit profile YAML; `strict` when unset
    pub audit_profile_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            tenants_path: None,
            max_revisions: DEFAULT_MAX_REVISIONS,
            run_timeout: Duration::from_millis(DEFAULT_RUN_TIMEOUT_MS),
            audit_profile_path: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SiloError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SiloError> {
        let defaults = Self::default();

        let max_revisions = match lookup("SILO_MAX_REVISIONS") {
            Some(raw) => parse_number::<u32>("SILO_MAX_REVISIONS", &raw)?,
            None => defaults.max_revisions,
        };
        let run_timeout = match lookup("SILO_RUN_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_number::<u64>("SILO_RUN_TIMEOUT_MS", &raw)?),
            None => defaults.run_timeout,
        };

        Ok(Self {
            addr: lookup("SILO_ADDR").unwrap_or(defaults.addr),
            tenants_path: lookup("SILO_TENANTS").map(PathBuf::from),
            max_revisions,
            run_timeout,
            audit_profile_path: lookup("SILO_AUDIT_PROFILE").map(PathBuf::from),
        })
    }

    pub fn load_registry(&self) -> Result<TenantRegistry, SiloError> {
        match &self.tenants_path {
            Some(path) => TenantRegistry::from_path(path),
            None => silo_stages::reference_registry(),
        }
    }

    pub fn load_auditor(&self) -> Result<CitationAuditor, SiloError> {
        let Some(path) = &self.audit_profile_path else {
            return Ok(CitationAuditor::strict());
        };
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SiloError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let profile =
            AuditProfile::from_yaml(&yaml).map_err(|e| SiloError::ConfigError(e.to_string()))?;
        Ok(CitationAuditor::new(profile))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SiloError> {
    raw.trim()
        .parse()
        .map_err(|_| SiloError::ConfigError(format!("{key} must be a non-negative integer, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.addr, "0.0.0.0:8787");
        assert_eq!(settings.max_revisions, 2);
        assert_eq!(settings.run_timeout, Duration::from_secs(30));
        assert!(settings.tenants_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("SILO_ADDR", "127.0.0.1:9000"),
            ("SILO_MAX_REVISIONS", "0"),
            ("SILO_RUN_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(settings.addr, "127.0.0.1:9000");
        assert_eq!(settings.max_revisions, 0);
        assert_eq!(settings.run_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let err = Settings::from_lookup(lookup(&[("SILO_MAX_REVISIONS", "-1")])).unwrap_err();
        assert!(err.to_string().starts_with("CONFIG/SILO_MAX_REVISIONS"));
    }

    #[test]
    fn test_bundled_registry_and_strict_auditor() {
        let settings = Settings::default();
        assert!(settings.load_registry().unwrap().contains("hedge_fund_a"));
        assert_eq!(settings.load_auditor().unwrap().profile().name, "strict@1.0");
    }

    #[test]
    fn test_missing_profile_file() {
        let settings = Settings {
            audit_profile_path: Some(PathBuf::from("/nonexistent/profile.yaml")),
            ..Settings::default()
        };
        assert!(matches!(settings.load_auditor(), Err(SiloError::ConfigError(_))));
    }
}
