use super::failover::FailoverKv;
use super::memory::InProcessKv;
use super::remote::RestKv;
use crate::config::StorageConfig;
use std::sync::Arc;

/// Build the storage handle for `config`.
///
/// The in-process store always exists: it serves directly for `memory` and
/// stands by as the demotion target for `remote`. The session capacity bound
/// applies to the in-process store only.
pub async fn create_backend(config: &StorageConfig) -> anyhow::Result<Arc<FailoverKv>> {
    let local = Arc::new(InProcessKv::new(
        Some(config.max_sessions),
        config.sweep_interval(),
    ));

    let kv = match config.backend.as_str() {
        "memory" | "none" => FailoverKv::local_only(local),
        "remote" | "redis" => {
            let url = config
                .url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("storage.url is required for the remote backend"))?;
            let remote = RestKv::new(url, config.token.as_deref())?;
            FailoverKv::connect(Arc::new(remote), local, config.retry_policy()).await
        }
        other => {
            anyhow::bail!("Unknown storage backend '{other}'. Supported: remote, memory");
        }
    };

    tracing::info!(
        backend = kv.active_backend(),
        demoted = kv.is_demoted(),
        "storage ready"
    );
    Ok(Arc::new(kv))
}
