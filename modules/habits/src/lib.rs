//! Habits and tags: the reference resource module of the DevHabit API.
//!
//! Collections are sortable, field-shaped, paginated (habits) and carry hypermedia links
//! when the client asks for the `application/vnd.devhabit.hateoas+json` representation.

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === MODULE DEFINITION ===
pub mod module;
pub use module::HabitsModule;

// === INTERNAL MODULES ===
// Exposed for integration tests; other modules should depend on `contract` only.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
