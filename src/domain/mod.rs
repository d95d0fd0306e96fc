//! Domain layer: value objects, catalog shapes, the basket composition
//! engine and the checkout assembler.

pub mod basket;
pub mod catalog;
pub mod events;
pub mod order;
pub mod value_objects;

pub use basket::{AddOutcome, BasketSelection, BasketSession, EngineError, HamperSize, OverflowState};
pub use catalog::{CatalogFilter, CatalogProduct, Category, RawProduct, Subcategory};
pub use order::{BasketLine, CheckoutError, OrderPayload, ShippingInfo, ShippingQuote};
pub use value_objects::{Money, Pincode};
