//! cinedex Service - Catalog Lookups
//!
//! Cache-aside lookup services for movies, genres and persons, the registry
//! that dispatches to them by kind, and the process plumbing around them:
//! configuration, tracing setup and the shared client context.

pub mod config;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::CatalogConfig;
pub use services::{CatalogLookupService, ServiceRegistry};
pub use state::{AppContext, ProductionContext, ProductionRegistry};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig, TelemetryError};
