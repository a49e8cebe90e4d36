use anyhow::Context as _;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Source of raw per-module configuration sections, keyed by module name.
pub trait ConfigProvider: Send + Sync {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

/// What a module sees during its phases: its own config section, the public
/// link prefix and the runtime cancellation token.
#[derive(Clone)]
pub struct ModuleCtx {
    config_provider: Option<Arc<dyn ConfigProvider>>,
    cancel: CancellationToken,
    module_name: Option<Arc<str>>,
    base_url: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            inner: ModuleCtx {
                config_provider: None,
                cancel,
                module_name: None,
                base_url: None,
            },
        }
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    /// Public address prefix used when modules render absolute links.
    /// Blank values mean root-relative links.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        self.inner.base_url = base_url
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .map(Arc::<str>::from);
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    /// Scope to one module; the registry does this before every phase call.
    pub fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Fires when the runtime begins shutting down.
    pub fn shutdown_signal(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Typed config of the current module.
    ///
    /// A missing section (or an unscoped context) yields `T::default()`; a section
    /// that does not deserialize is an error naming the module.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> anyhow::Result<T> {
        let Some(name) = self.module_name.as_deref() else {
            return Ok(T::default());
        };
        let raw = self
            .config_provider
            .as_ref()
            .and_then(|p| p.get_module_config(name));
        match raw {
            None => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone())
                .with_context(|| format!("invalid configuration for module '{name}'")),
        }
    }
}
