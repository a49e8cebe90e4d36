use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use modkit::{Module, ModuleCtx, RestfulModule};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::api::rest::handlers::RestState;
use crate::api::rest::{links, routes, sorting};
use crate::config::HabitsConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::{seed, InMemoryStore};

/// Habits and tags over in-memory storage.
#[derive(Default)]
pub struct HabitsModule {
    config: Mutex<HabitsConfig>,
    service: Mutex<Option<Arc<Service>>>,
}

impl HabitsModule {
    /// Domain service, available after `init`.
    pub fn service(&self) -> Option<Arc<Service>> {
        self.service.lock().clone()
    }

    async fn build_service(config: &HabitsConfig) -> anyhow::Result<Arc<Service>> {
        let store = Arc::new(InMemoryStore::new());
        if config.seed {
            seed::seed(store.as_ref()).await?;
        }
        Ok(Arc::new(Service::new(
            store.clone(),
            store,
            ServiceConfig::default(),
        )))
    }
}

#[async_trait]
impl Module for HabitsModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg = ctx.module_config::<HabitsConfig>()?;
        if cfg.max_page_size == 0 {
            anyhow::bail!("habits.max_page_size must be at least 1");
        }

        let service = Self::build_service(&cfg).await?;
        info!(
            default_page_size = cfg.default_page_size,
            max_page_size = cfg.max_page_size,
            seeded = cfg.seed,
            "habits module initialized"
        );
        *self.config.lock() = cfg;
        *self.service.lock() = Some(service);
        Ok(())
    }
}

impl RestfulModule for HabitsModule {
    fn register_rest(&self, ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
        let service = self
            .service()
            .ok_or_else(|| anyhow::anyhow!("habits service is not initialized"))?;
        let sorts = sorting::sort_registry()?;
        let routes_table = links::route_table(ctx.base_url());
        debug!(
            sort_definitions = sorts.len(),
            named_routes = routes_table.len(),
            base_url = ?ctx.base_url(),
            "habits REST state ready"
        );

        let state = Arc::new(RestState {
            service,
            sorts,
            routes: routes_table,
        });
        let limits = self.config.lock().page_limits();
        routes::register_routes(router, state, limits)
    }
}
