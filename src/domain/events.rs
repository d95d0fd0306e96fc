//! Session events raised by the basket engine

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ItemAdded { product_id: String, basket_number: u32, quantity: u32 },
    ItemRemoved { product_id: String, basket_number: u32 },
    BasketSpawned { basket_number: u32 },
    BasketCleared { basket_number: u32 },
    BasketSwitched { basket_number: u32 },
    SessionReset,
}
