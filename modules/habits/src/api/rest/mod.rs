pub mod dto;
pub mod error;
pub mod handlers;
pub mod links;
pub mod routes;
pub mod sorting;
