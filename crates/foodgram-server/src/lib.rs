//! REST API server: routes, token authentication, DTOs, and OpenAPI documentation.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod pagination;
pub mod query;
pub mod routes;
pub mod state;
