use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::engine::Engine;
use crate::limits::*;
use crate::model::Ms;
use crate::sweeper;

/// Background task settings shared by every tenant.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub compact_threshold: u64,
    pub sweep_interval: Duration,
    pub pending_ttl_ms: Ms,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            compact_threshold: 1000,
            sweep_interval: Duration::from_secs(60),
            pending_ttl_ms: 15 * 60_000,
        }
    }
}

/// One engine per tenant (the connection's database name), each with its own
/// WAL file, sweeper and compactor.
pub struct TenantManager {
    engines: DashMap<String, Arc<Engine>>,
    data_dir: PathBuf,
    sweeps: SweepConfig,
}

impl TenantManager {
    pub fn new(data_dir: PathBuf, sweeps: SweepConfig) -> Self {
        Self {
            engines: DashMap::new(),
            data_dir,
            sweeps,
        }
    }

    /// File stem for a tenant: alphanumerics, `_` and `-` only.
    fn file_stem(tenant: &str) -> std::io::Result<String> {
        if tenant.len() > MAX_TENANT_NAME_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "tenant name too long",
            ));
        }
        let stem: String = tenant
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if stem.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty tenant name",
            ));
        }
        Ok(stem)
    }

    /// Engine for `tenant`, replaying its WAL on first use.
    pub fn get_or_create(&self, tenant: &str) -> std::io::Result<Arc<Engine>> {
        if let Some(engine) = self.engines.get(tenant) {
            return Ok(engine.value().clone());
        }
        let stem = Self::file_stem(tenant)?;
        if self.engines.len() >= MAX_TENANTS {
            return Err(std::io::Error::other("too many tenants"));
        }

        // entry() keeps two first connections from opening the same WAL twice
        let entry = self.engines.entry(tenant.to_string());
        if let dashmap::mapref::entry::Entry::Occupied(e) = &entry {
            return Ok(e.get().clone());
        }
        let engine = Arc::new(Engine::new(self.data_dir.join(format!("{stem}.wal")))?);

        let SweepConfig {
            compact_threshold,
            sweep_interval,
            pending_ttl_ms,
        } = self.sweeps;
        tokio::spawn(sweeper::run_sweeper(
            engine.clone(),
            sweep_interval,
            pending_ttl_ms,
        ));
        tokio::spawn(sweeper::run_compactor(engine.clone(), compact_threshold));

        entry.or_insert(engine.clone());
        metrics::gauge!(crate::observability::TENANTS_ACTIVE).set(self.engines.len() as f64);
        tracing::info!("tenant {tenant} loaded");
        Ok(engine)
    }
}
