#[cfg(test)]
mod module_tests {
    use axum::{body::Body, http::Request, routing::get, Router};
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::{
        context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder},
        contracts::{Module, RestHostModule, RestfulModule, StatefulModule},
        registry::{ModuleEntry, ModuleRegistry, RegistryError},
    };

    type CallTracker = Arc<Mutex<Vec<String>>>;

    struct TestModule {
        name: &'static str,
        calls: CallTracker,
    }

    impl TestModule {
        fn new(name: &'static str, calls: CallTracker) -> Arc<Self> {
            Arc::new(Self { name, calls })
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
            assert_eq!(ctx.current_module(), Some(self.name));
            self.calls.lock().unwrap().push(format!("init:{}", self.name));
            Ok(())
        }
    }

    impl RestfulModule for TestModule {
        fn register_rest(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            self.calls.lock().unwrap().push(format!("rest:{}", self.name));
            Ok(router.route(&format!("/{}", self.name), get(|| async { "test" })))
        }
    }

    struct TestRestHost {
        calls: CallTracker,
    }

    #[async_trait::async_trait]
    impl Module for TestRestHost {
        async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("init:host".into());
            Ok(())
        }
    }

    impl RestHostModule for TestRestHost {
        fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            self.calls.lock().unwrap().push("prepare".into());
            Ok(router.route("/health", get(|| async { "ok" })))
        }

        fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            self.calls.lock().unwrap().push("finalize".into());
            Ok(router)
        }
    }

    #[async_trait::async_trait]
    impl StatefulModule for TestRestHost {
        async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("start".into());
            Ok(())
        }

        async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("stop".into());
            Ok(())
        }
    }

    fn ctx() -> ModuleCtx {
        ModuleCtxBuilder::new(CancellationToken::new()).build()
    }

    #[tokio::test]
    async fn phases_run_in_order_and_routes_are_mounted() {
        let calls = CallTracker::default();
        let registry = ModuleRegistry::builder()
            .with_rest_host("host", Arc::new(TestRestHost { calls: calls.clone() }))
            .with_rest("alpha", TestModule::new("alpha", calls.clone()))
            .with_rest("beta", TestModule::new("beta", calls.clone()))
            .build()
            .expect("registry should build");

        let ctx = ctx();
        registry.run_init_phase(&ctx).await.unwrap();
        let router = registry.run_rest_phase(&ctx, Router::new()).unwrap();
        let cancel = CancellationToken::new();
        registry.run_start_phase(cancel.clone()).await.unwrap();
        registry.run_stop_phase(cancel).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            [
                "init:host", "init:alpha", "init:beta", "prepare", "rest:alpha", "rest:beta",
                "finalize", "start", "stop"
            ]
        );

        let resp = router
            .oneshot(Request::builder().uri("/beta").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn rest_module_without_host_fails() {
        let registry = ModuleRegistry::builder()
            .with_rest("alpha", TestModule::new("alpha", CallTracker::default()))
            .build()
            .unwrap();
        let result = registry.run_rest_phase(&ctx(), Router::new());
        assert!(matches!(result, Err(RegistryError::RestRequiresHost)));
    }

    #[test]
    fn core_only_registry_needs_no_host() {
        let registry = ModuleRegistry::builder()
            .register(ModuleEntry::new(
                "core_only",
                TestModule::new("core_only", CallTracker::default()),
            ))
            .build()
            .unwrap();
        assert!(registry.run_rest_phase(&ctx(), Router::new()).is_ok());
        assert!(registry.get_module("core_only").is_some());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let calls = CallTracker::default();
        let err = ModuleRegistry::builder()
            .with_rest("alpha", TestModule::new("alpha", calls.clone()))
            .with_rest("alpha", TestModule::new("alpha", calls))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateModule("alpha")));
    }

    #[test]
    fn multiple_rest_hosts_are_rejected() {
        let calls = CallTracker::default();
        let err = ModuleRegistry::builder()
            .with_rest_host("h1", Arc::new(TestRestHost { calls: calls.clone() }))
            .with_rest_host("h2", Arc::new(TestRestHost { calls }))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MultipleRestHosts(_)));
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct PagingCfg {
        #[serde(default)]
        max_page_size: u64,
    }

    struct StaticConfig(serde_json::Value);

    impl ConfigProvider for StaticConfig {
        fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
            self.0.get(module_name)
        }
    }

    #[test]
    fn module_config_is_scoped_by_name() {
        let provider = Arc::new(StaticConfig(serde_json::json!({
            "habits": { "max_page_size": 50 },
            "broken": { "max_page_size": "lots" }
        })));
        let base = ModuleCtxBuilder::new(CancellationToken::new())
            .with_config_provider(provider)
            .with_base_url(Some("  "))
            .build();
        assert!(base.base_url().is_none());
        let prefixed = ModuleCtxBuilder::new(CancellationToken::new())
            .with_base_url(Some("https://api.example.com/"))
            .build();
        assert_eq!(prefixed.base_url(), Some("https://api.example.com"));

        let habits = base.clone().for_module("habits");
        assert_eq!(habits.module_config::<PagingCfg>().unwrap().max_page_size, 50);

        let broken = base.clone().for_module("broken");
        let err = broken.module_config::<PagingCfg>().unwrap_err();
        assert!(err.to_string().contains("'broken'"));

        let missing = base.for_module("missing");
        assert_eq!(missing.module_config::<PagingCfg>().unwrap(), PagingCfg::default());
    }

    #[test]
    fn shutdown_signal_follows_the_runtime_token() {
        let token = CancellationToken::new();
        let ctx = ModuleCtxBuilder::new(token.clone()).build().for_module("habits");
        let signal = ctx.shutdown_signal();
        assert!(!signal.is_cancelled());
        token.cancel();
        assert!(signal.is_cancelled());
    }
}
