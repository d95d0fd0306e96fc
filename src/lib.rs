//! Hamper Composer
//!
//! Gift-hamper composition and checkout for a skincare storefront.
//!
//! ## Features
//! - Multi-basket composition with per-size capacity limits
//! - Overflow confirmation with explicit new-basket spawning
//! - Per-basket and grand totals including container pricing
//! - Pincode-serviceability gated checkout assembly
//! - HTTP clients for the catalog, serviceability and order endpoints

use thiserror::Error;

pub mod domain;
pub mod services;
pub mod session;

pub use domain::basket::{AddOutcome, BasketSelection, BasketSession, EngineError, HamperSize};
pub use domain::catalog::{CatalogFilter, CatalogProduct, Category, RawProduct, Subcategory};
pub use domain::order::{build_order_payload, CheckoutError, OrderPayload, ShippingInfo, ShippingQuote};
pub use domain::value_objects::{Money, Pincode};
pub use session::{CustomizeSession, SessionStore, UserContext};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] domain::basket::EngineError),

    #[error(transparent)]
    Checkout(#[from] domain::order::CheckoutError),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),
}

pub type Result<T> = std::result::Result<T, Error>;
