//! Lookup services, one per entity kind, and the registry holding them.

pub mod catalog;
pub mod registry;

pub use catalog::CatalogLookupService;
pub use registry::ServiceRegistry;
