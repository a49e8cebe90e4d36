//! HTTP boundary helpers shared by REST modules.

pub mod error;
pub mod links;
pub mod media;
pub mod problem;
pub mod query;

pub use error::{query_error_to_problem, ApiError, ApiResult};
pub use links::RouteTable;
pub use media::Representation;
pub use problem::{not_found, Problem, ProblemResponse};
pub use query::{CollectionQuery, PageLimits, ShapeQuery};
