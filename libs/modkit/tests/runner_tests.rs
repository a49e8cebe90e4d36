//! Runner tests: phase ordering, shutdown options and error propagation.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use modkit::{
    context::{ConfigProvider, ModuleCtx},
    contracts::{Module, StatefulModule},
    registry::{ModuleEntry, ModuleRegistry},
    runtime::{run, RunOptions, ShutdownOptions},
};

type CallTracker = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct MockConfigProvider {
    configs: std::collections::HashMap<String, serde_json::Value>,
}

impl MockConfigProvider {
    fn with_config(mut self, module_name: &str, config: serde_json::Value) -> Self {
        self.configs.insert(module_name.to_string(), config);
        self
    }
}

impl ConfigProvider for MockConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.configs.get(module_name)
    }
}

struct Worker {
    name: &'static str,
    calls: CallTracker,
    fail_init: bool,
    seen: Mutex<Option<(Option<String>, serde_json::Value)>>,
}

impl Worker {
    fn new(name: &'static str, calls: CallTracker) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls,
            fail_init: false,
            seen: Mutex::new(None),
        })
    }

    fn failing(name: &'static str, calls: CallTracker) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls,
            fail_init: true,
            seen: Mutex::new(None),
        })
    }

    fn record(&self, phase: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}.{phase}", self.name));
    }
}

#[async_trait::async_trait]
impl Module for Worker {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        self.record("init");
        if self.fail_init {
            anyhow::bail!("init failed for {}", self.name);
        }
        let cfg: serde_json::Value = ctx.module_config()?;
        *self.seen.lock().unwrap() = Some((ctx.base_url().map(str::to_owned), cfg));
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatefulModule for Worker {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.record("start");
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.record("stop");
        Ok(())
    }
}

fn stateful_entry(module: Arc<Worker>) -> ModuleEntry {
    let name = module.name;
    let mut entry = ModuleEntry::new(name, module.clone());
    entry.stateful = Some(module);
    entry
}

fn registry(modules: Vec<Arc<Worker>>) -> ModuleRegistry {
    modules
        .into_iter()
        .fold(ModuleRegistry::builder(), |b, m| b.register(stateful_entry(m)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn token_shutdown_runs_every_phase_and_stops_in_reverse() {
    let calls = CallTracker::default();
    let a = Worker::new("a", calls.clone());
    let b = Worker::new("b", calls.clone());
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(run(RunOptions {
        modules_cfg: Arc::new(MockConfigProvider::default()),
        registry: registry(vec![a, b]),
        base_url: None,
        shutdown: ShutdownOptions::Token(cancel.clone()),
    }));

    // Let the runner reach the wait point.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = timeout(Duration::from_secs(2), handle)
        .await
        .expect("runner should stop after cancel")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(
        *calls.lock().unwrap(),
        ["a.init", "b.init", "a.start", "b.start", "b.stop", "a.stop"]
    );
}

#[tokio::test]
async fn future_shutdown_completes_the_run() {
    let calls = CallTracker::default();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(run(RunOptions {
        modules_cfg: Arc::new(MockConfigProvider::default()),
        registry: registry(vec![Worker::new("w", calls.clone())]),
        base_url: None,
        shutdown: ShutdownOptions::Future(Box::pin(async move {
            let _ = rx.await;
        })),
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let result = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(calls.lock().unwrap().last().map(String::as_str), Some("w.stop"));
}

#[tokio::test]
async fn init_failure_aborts_before_start() {
    let calls = CallTracker::default();
    let cancel = CancellationToken::new();

    let result = timeout(
        Duration::from_secs(2),
        run(RunOptions {
            modules_cfg: Arc::new(MockConfigProvider::default()),
            registry: registry(vec![
                Worker::failing("bad", calls.clone()),
                Worker::new("never", calls.clone()),
            ]),
            base_url: None,
            shutdown: ShutdownOptions::Token(cancel),
        }),
    )
    .await
    .expect("init failure should not hang");

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("init failed for bad"));
    assert_eq!(*calls.lock().unwrap(), ["bad.init"]);
}

#[tokio::test]
async fn init_sees_scoped_config_and_base_url() {
    let calls = CallTracker::default();
    let worker = Worker::new("habits", calls);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let cfg = MockConfigProvider::default()
        .with_config("habits", serde_json::json!({ "max_page_size": 5 }))
        .with_config("other", serde_json::json!({ "ignored": true }));

    run(RunOptions {
        modules_cfg: Arc::new(cfg),
        registry: registry(vec![worker.clone()]),
        base_url: Some("https://api.example.com".into()),
        shutdown: ShutdownOptions::Token(cancel),
    })
    .await
    .unwrap();

    let seen = worker.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.0.as_deref(), Some("https://api.example.com"));
    assert_eq!(seen.1, serde_json::json!({ "max_page_size": 5 }));
}
