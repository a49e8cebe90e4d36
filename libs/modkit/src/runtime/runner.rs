//! Drives a [`ModuleRegistry`] through init → rest → start → wait → stop.
//!
//! One `ModuleCtx` is built up front and re-scoped per module for every phase.

use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

/// What ends the wait phase.
pub enum ShutdownOptions {
    /// Ctrl+C, or SIGTERM on unix.
    Signals,
    /// The caller cancels this token.
    Token(CancellationToken),
    /// Completion of this future.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    /// Raw config sections by module name.
    pub modules_cfg: Arc<dyn ConfigProvider>,
    pub registry: ModuleRegistry,
    /// Public address prefix for absolute links; `None` renders root-relative links.
    pub base_url: Option<String>,
    pub shutdown: ShutdownOptions,
}

/// Returns the token that ends the run, spawning whatever watches for the trigger.
fn arm_shutdown(shutdown: ShutdownOptions) -> CancellationToken {
    match shutdown {
        ShutdownOptions::Token(token) => {
            tracing::debug!("shutdown: controlled by caller token");
            token
        }
        ShutdownOptions::Signals => {
            let token = CancellationToken::new();
            let trigger = token.clone();
            tokio::spawn(async move {
                if let Err(e) = shutdown::wait_for_shutdown().await {
                    tracing::warn!(error = %e, "shutdown: signal listener failed; falling back to ctrl_c()");
                    let _ = tokio::signal::ctrl_c().await;
                }
                tracing::info!("shutdown: signal received");
                trigger.cancel();
            });
            token
        }
        ShutdownOptions::Future(waiter) => {
            let token = CancellationToken::new();
            let trigger = token.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                trigger.cancel();
            });
            token
        }
    }
}

pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        modules_cfg,
        registry,
        base_url,
        shutdown,
    } = opts;
    let cancel = arm_shutdown(shutdown);
    tracing::debug!(?registry, base_url = ?base_url, "modules registered");

    let ctx = ModuleCtxBuilder::new(cancel.clone())
        .with_config_provider(modules_cfg)
        .with_base_url(base_url.as_deref())
        .build();

    tracing::info!("Phase: init");
    registry.run_init_phase(&ctx).await?;

    // The host keeps the finalized router; nothing else needs it here.
    tracing::info!("Phase: rest");
    registry.run_rest_phase(&ctx, axum::Router::new())?;

    tracing::info!("Phase: start");
    registry.run_start_phase(cancel.clone()).await?;

    cancel.cancelled().await;

    tracing::info!("Phase: stop");
    registry.run_stop_phase(cancel).await?;
    Ok(())
}
