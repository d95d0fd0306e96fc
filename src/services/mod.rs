//! External collaborators, specified as traits and implemented as JSON/HTTP
//! clients. The domain never talks to the network directly.

pub mod catalog;
pub mod orders;
pub mod shipping;

pub use catalog::{CatalogSource, HttpCatalog, InMemoryCatalog};
pub use orders::{HttpOrderGateway, OrderGateway};
pub use shipping::{HttpServiceability, ServiceabilityLookup};
