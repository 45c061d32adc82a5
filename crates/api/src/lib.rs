//! Sauna monitor service library.
//!
//! Exposes config, state, the engine, error handling and routes so the
//! binary entrypoint and the integration tests build the same router.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
