use std::sync::{Arc, Mutex};

use divbridge_core::adapters::AdapterRegistry;
use divbridge_core::builders::BuilderRegistry;
use divbridge_core::cache::RenderCache;
use divbridge_core::config_store::ConfigRegistry;
use divbridge_core::error::ConfigStoreError;
use divbridge_core::plugins;
use divbridge_core::render::Renderer;

use crate::error::AppError;
use crate::metrics::Metrics;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub renderer: Renderer,
    pub configs: Arc<Mutex<ConfigRegistry>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire the registries from settings: builtins plus plugins from disk,
    /// default adapters, a sized cache and the config registry.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigStoreError> {
        let mut builders = BuilderRegistry::with_builtins();

        let load = plugins::load_dir(&settings.plugin_dir);
        for (path, reason) in &load.rejected {
            tracing::warn!(path = %path.display(), reason = %reason, "plugin skipped");
        }
        for plugin in load.plugins {
            let name = plugin.name.clone();
            if let Err(e) = builders.register_plugin(plugin) {
                tracing::warn!(plugin = %name, error = %e, "plugin not registered");
            }
        }

        let cache = RenderCache::new(settings.cache_capacity, settings.cache_ttl);
        let configs = ConfigRegistry::open(&settings.config_dir)?;

        tracing::info!(
            functions = builders.len(),
            cache_capacity = settings.cache_capacity,
            "registries ready"
        );

        Ok(Self {
            renderer: Renderer::new(
                Arc::new(builders),
                Arc::new(AdapterRegistry::with_defaults()),
                Arc::new(cache),
            ),
            configs: Arc::new(Mutex::new(configs)),
            metrics: Arc::new(Metrics::default()),
        })
    }

    /// Run a config registry operation on the blocking pool.
    ///
    /// The registry does synchronous file I/O under its lock, so it never
    /// runs on a runtime worker. A poisoned lock is recovered.
    pub async fn with_configs<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut ConfigRegistry) -> Result<T, ConfigStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let configs = Arc::clone(&self.configs);
        tokio::task::spawn_blocking(move || {
            let mut guard = match configs.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            op(&mut *guard)
        })
        .await
        .map_err(|e| AppError::Internal(format!("config task failed: {e}")))?
        .map_err(AppError::from)
    }
}
