//! # ModKit - module wiring and HTTP boundary kit
//!
//! Two halves:
//!
//! - **Module runtime**: modules implement [`Module`] (plus [`RestfulModule`] /
//!   [`RestHostModule`] / [`StatefulModule`] as needed), are registered explicitly in a
//!   [`ModuleRegistry`] and driven through ordered phases: init → REST → start → stop.
//! - **API kit** ([`api`]): RFC 9457 problems, the collection query extractor, media-type
//!   negotiation, the named-route link resolver and `ApiError<D>` for handlers.
//!
//! ## Example
//!
//! ```rust,ignore
//! let registry = ModuleRegistry::builder()
//!     .with_rest_host("api_ingress", Arc::new(ApiIngress::default()))
//!     .with_rest("habits", Arc::new(HabitsModule::default()))
//!     .build()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod contracts;
pub use contracts::*;

pub mod registry;
pub use registry::{ModuleRegistry, RegistryError};

pub mod api;
pub use api::problem::{not_found, Problem, ProblemResponse, ValidationError};
pub use api::{ApiError, ApiResult, CollectionQuery, PageLimits, Representation, RouteTable};

pub mod runtime;
pub use runtime::{run, RunOptions, ShutdownOptions};

#[cfg(test)]
mod tests;
