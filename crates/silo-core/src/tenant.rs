//! Tenant Silo: immutable registry plus a task-local "current tenant" binding
//!
//! Every downstream call (storage, model selection, key access) reads the
//! bound tenant through [`current_tenant`] instead of taking it as a
//! parameter. The binding lives in tokio task-local storage: it is visible to
//! everything awaited inside [`TenantScope::run`], invisible to other tasks
//! (including tasks spawned from inside the scope), and restored when the
//! scope exits for any reason.

use crate::error::SiloError;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

tokio::task_local! {
    static ACTIVE_TENANT: Arc<TenantConfig>;
}

/// Opaque reference to a tenant's key material (ex: a KMS key alias).
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretHandle(String);

impl SecretHandle {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHandle(***)")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantConfig {
    pub tenant_id: String,
    pub credential: SecretHandle,
    #[serde(default)]
    pub allowed_models: BTreeSet<String>,
}

impl TenantConfig {
    pub fn new<I, S>(tenant_id: impl Into<String>, credential: SecretHandle, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tenant_id: tenant_id.into(),
            credential,
            allowed_models: models.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows_model(&self, model: &str) -> bool {
        self.allowed_models.contains(model)
    }

    /// First allowed model in identifier order
    pub fn default_model(&self) -> Option<&str> {
        self.allowed_models.iter().next().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    tenants: Vec<TenantConfig>,
}

/// Tenant configurations keyed by `tenant_id`, frozen at load time.
///
/// Cloning is cheap; re-provisioning means building a new registry.
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    configs: Arc<HashMap<String, Arc<TenantConfig>>>,
}

impl TenantRegistry {
    pub fn from_configs<I>(configs: I) -> Result<Self, SiloError>
    where
        I: IntoIterator<Item = TenantConfig>,
    {
        let mut map = HashMap::new();
        for config in configs {
            if config.tenant_id.trim().is_empty() {
                return Err(SiloError::ConfigError("tenant_id must not be empty".into()));
            }
            if map.contains_key(&config.tenant_id) {
                return Err(SiloError::ConfigError(format!(
                    "duplicate tenant_id: {}",
                    config.tenant_id
                )));
            }
            map.insert(config.tenant_id.clone(), Arc::new(config));
        }
        Ok(Self {
            configs: Arc::new(map),
        })
    }

    /// Load from YAML of the form `tenants: [{tenant_id, credential, allowed_models}]`
    pub fn from_yaml(yaml: &str) -> Result<Self, SiloError> {
        let file: RegistryFile =
            serde_yaml::from_str(yaml).map_err(|e| SiloError::ConfigError(e.to_string()))?;
        Self::from_configs(file.tenants)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SiloError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SiloError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&yaml)
    }

    pub fn contains(&self, tenant_id: &str) -> bool {
        self.configs.contains_key(tenant_id)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn tenant_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Prepare a scope bound to `tenant_id`.
    ///
    /// Fails with `UnauthorizedTenant` for unknown ids and with
    /// `TenantConflict` when a different tenant is already bound in this
    /// task. Neither failure touches the current binding.
    pub fn activate(&self, tenant_id: &str) -> Result<TenantScope, SiloError> {
        let config = self
            .configs
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| SiloError::UnauthorizedTenant(tenant_id.to_string()))?;

        ensure_no_conflict(&config)?;
        Ok(TenantScope { config })
    }
}

/// A task holds at most one tenant; re-binding the same tenant is allowed.
fn ensure_no_conflict(requested: &TenantConfig) -> Result<(), SiloError> {
    match current_tenant() {
        Some(active) if active.tenant_id != requested.tenant_id => Err(SiloError::TenantConflict {
            active: active.tenant_id.clone(),
            requested: requested.tenant_id.clone(),
        }),
        _ => Ok(()),
    }
}

/// Handle returned by [`TenantRegistry::activate`].
#[must_use = "a tenant scope binds nothing until `run` or `run_sync` is called"]
#[derive(Debug)]
pub struct TenantScope {
    config: Arc<TenantConfig>,
}

impl TenantScope {
    pub fn tenant(&self) -> &TenantConfig {
        &self.config
    }

    /// Drive `work` with this tenant bound; the previous binding comes back
    /// when `work` completes, panics, or is dropped mid-flight.
    ///
    /// Conflicts are checked again at bind time, since a scope may be run
    /// inside a different tenant than the one active at `activate`. On
    /// `TenantConflict` the work is never started.
    pub async fn run<F: Future>(self, work: F) -> Result<F::Output, SiloError> {
        ensure_no_conflict(&self.config)?;
        let tenant_id = self.config.tenant_id.clone();
        let output = ACTIVE_TENANT
            .scope(self.config, async move {
                let _trace = ScopeTrace::enter(tenant_id);
                work.await
            })
            .await;
        Ok(output)
    }

    pub fn run_sync<R>(self, work: impl FnOnce() -> R) -> Result<R, SiloError> {
        ensure_no_conflict(&self.config)?;
        let tenant_id = self.config.tenant_id.clone();
        Ok(ACTIVE_TENANT.sync_scope(self.config, move || {
            let _trace = ScopeTrace::enter(tenant_id);
            work()
        }))
    }
}

/// Tenant bound to the current task, if any
pub fn current_tenant() -> Option<Arc<TenantConfig>> {
    ACTIVE_TENANT.try_with(Arc::clone).ok()
}

struct ScopeTrace {
    tenant_id: String,
}

impl ScopeTrace {
    fn enter(tenant_id: String) -> Self {
        tracing::info!(tenant = %tenant_id, "entering tenant silo");
        Self { tenant_id }
    }
}

impl Drop for ScopeTrace {
    fn drop(&mut self) {
        tracing::info!(tenant = %self.tenant_id, "exiting tenant silo");
    }
}
