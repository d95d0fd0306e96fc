//! Basket Composition Engine
//!
//! Owns the working set of selections for one gift-hamper customization
//! session: which products sit in which numbered basket, which basket is
//! active for new additions, and the overflow-confirmation state that gates
//! capacity. All operations are synchronous and single-owner; the session is
//! never shared or persisted before checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogProduct;
use crate::domain::events::SessionEvent;
use crate::domain::value_objects::Money;

/// Hamper size chosen at session start. Capacity bounds both the number of
/// distinct products and the aggregate quantity in a single basket; the
/// container price is charged once per basket on top of its items.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HamperSize {
    Small,
    Medium,
    Large,
}

impl HamperSize {
    pub fn capacity(&self) -> u32 {
        match self { Self::Small => 3, Self::Medium => 6, Self::Large => 9 }
    }

    pub fn container_price(&self) -> Money {
        let amount = match self {
            Self::Small => Decimal::new(199, 0),
            Self::Medium => Decimal::new(349, 0),
            Self::Large => Decimal::new(499, 0),
        };
        Money::inr(amount)
    }
}

/// One product placed into a numbered basket. Display fields are copied from
/// the catalog at selection time and never re-fetched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BasketSelection {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub price: Money,
    pub quantity: u32,
    pub basket_number: u32,
}

impl BasketSelection {
    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
}

/// Overflow confirmation machine. A pending decision holds the product the
/// user tried to add; no mutation happens until it resolves.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OverflowState {
    #[default]
    Idle,
    AwaitingDecision { pending: CatalogProduct },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AddOutcome {
    Added { basket_number: u32, quantity: u32 },
    OverflowPending,
}

#[derive(Clone, Debug)]
pub struct BasketSession {
    size: HamperSize,
    selections: Vec<BasketSelection>,
    active_basket: u32,
    highest_basket: u32,
    overflow: OverflowState,
    events: Vec<SessionEvent>,
}

impl BasketSession {
    pub fn new(size: HamperSize) -> Self {
        Self {
            size,
            selections: vec![],
            active_basket: 1,
            highest_basket: 1,
            overflow: OverflowState::Idle,
            events: vec![],
        }
    }

    pub fn size(&self) -> HamperSize { self.size }
    pub fn selections(&self) -> &[BasketSelection] { &self.selections }
    pub fn active_basket(&self) -> u32 { self.active_basket }
    pub fn overflow(&self) -> &OverflowState { &self.overflow }
    pub fn is_empty(&self) -> bool { self.selections.is_empty() }
    pub fn decision_pending(&self) -> bool { !matches!(self.overflow, OverflowState::Idle) }

    /// Add one unit of a product to the active basket, merging with an
    /// existing entry for the same product. A new distinct product needs a
    /// free distinct slot; another unit of a product already in the basket
    /// also needs the aggregate quantity to be under the bound. At capacity
    /// nothing mutates; the engine moves to `AwaitingDecision` and every
    /// other operation is refused until `confirm_new_basket` or
    /// `cancel_overflow` resolves it.
    pub fn add_product(&mut self, product: &CatalogProduct) -> Result<AddOutcome, EngineError> {
        self.ensure_idle()?;
        let cap = self.size.capacity();
        let mut distinct = 0u32;
        let mut quantity = 0u32;
        let mut exists = false;
        for s in self.selections.iter().filter(|s| s.basket_number == self.active_basket) {
            distinct += 1;
            quantity += s.quantity;
            exists |= s.product_id == product.id;
        }
        let full = if exists { distinct >= cap || quantity >= cap } else { distinct >= cap };
        if full {
            self.overflow = OverflowState::AwaitingDecision { pending: product.clone() };
            return Ok(AddOutcome::OverflowPending);
        }
        let quantity = self.insert_unit(product, self.active_basket);
        Ok(AddOutcome::Added { basket_number: self.active_basket, quantity })
    }

    /// Resolve a pending overflow by spawning a fresh basket. The new number
    /// is strictly greater than every number this session has ever used, the
    /// active pointer moves to it, and the held product lands there alone.
    pub fn confirm_new_basket(&mut self) -> Result<u32, EngineError> {
        let pending = match std::mem::take(&mut self.overflow) {
            OverflowState::AwaitingDecision { pending } => pending,
            OverflowState::Idle => return Err(EngineError::NoDecisionPending),
        };
        let number = self.highest_basket + 1;
        self.highest_basket = number;
        self.active_basket = number;
        self.raise(SessionEvent::BasketSpawned { basket_number: number });
        self.insert_unit(&pending, number);
        Ok(number)
    }

    /// Resolve a pending overflow by declining: the held product is dropped
    /// and the session is exactly as it was before the triggering add.
    pub fn cancel_overflow(&mut self) -> Result<(), EngineError> {
        match std::mem::take(&mut self.overflow) {
            OverflowState::AwaitingDecision { .. } => Ok(()),
            OverflowState::Idle => Err(EngineError::NoDecisionPending),
        }
    }

    /// Remove one unit, deleting the entry when its quantity reaches zero.
    /// Absent entries are a no-op, not an error.
    pub fn remove_product(&mut self, product_id: &str, basket_number: Option<u32>) -> Result<(), EngineError> {
        self.ensure_idle()?;
        let basket = basket_number.unwrap_or(self.active_basket);
        let Some(pos) = self.selections.iter().position(|s| s.basket_number == basket && s.product_id == product_id) else {
            return Ok(());
        };
        if self.selections[pos].quantity > 1 {
            self.selections[pos].quantity -= 1;
        } else {
            self.selections.remove(pos);
        }
        self.raise(SessionEvent::ItemRemoved { product_id: product_id.to_string(), basket_number: basket });
        Ok(())
    }

    pub fn clear_basket(&mut self, basket_number: u32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.selections.retain(|s| s.basket_number != basket_number);
        self.raise(SessionEvent::BasketCleared { basket_number });
        Ok(())
    }

    /// Empty every basket and start the session over from basket 1.
    pub fn reset_all(&mut self) -> Result<(), EngineError> {
        self.ensure_idle()?;
        self.selections.clear();
        self.active_basket = 1;
        self.highest_basket = 1;
        self.raise(SessionEvent::SessionReset);
        Ok(())
    }

    /// Point new additions at another basket. Pure pointer move; the target
    /// may be empty or newly spawned.
    pub fn switch_active_basket(&mut self, basket_number: u32) -> Result<(), EngineError> {
        self.ensure_idle()?;
        if basket_number == 0 { return Err(EngineError::InvalidBasketNumber); }
        self.active_basket = basket_number;
        self.highest_basket = self.highest_basket.max(basket_number);
        self.raise(SessionEvent::BasketSwitched { basket_number });
        Ok(())
    }

    pub fn basket_items(&self, basket_number: u32) -> Vec<&BasketSelection> {
        self.selections.iter().filter(|s| s.basket_number == basket_number).collect()
    }

    /// Item prices times quantities plus the container price, recomputed
    /// fresh from current state on every call.
    pub fn basket_total(&self, basket_number: u32) -> Money {
        let container = self.size.container_price();
        self.selections
            .iter()
            .filter(|s| s.basket_number == basket_number)
            .fold(container, |acc, s| acc.add(&s.line_total()).unwrap_or(acc))
    }

    /// Distinct basket numbers currently holding items, ascending.
    pub fn unique_baskets(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.selections.iter().map(|s| s.basket_number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    pub fn grand_total(&self) -> Money {
        self.unique_baskets()
            .into_iter()
            .fold(Money::zero(self.size.container_price().currency()), |acc, n| {
                acc.add(&self.basket_total(n)).unwrap_or(acc)
            })
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> { std::mem::take(&mut self.events) }

    fn ensure_idle(&self) -> Result<(), EngineError> {
        if self.decision_pending() { Err(EngineError::DecisionPending) } else { Ok(()) }
    }

    fn insert_unit(&mut self, product: &CatalogProduct, basket_number: u32) -> u32 {
        let quantity = if let Some(existing) = self
            .selections
            .iter_mut()
            .find(|s| s.basket_number == basket_number && s.product_id == product.id)
        {
            existing.quantity += 1;
            existing.quantity
        } else {
            self.selections.push(BasketSelection {
                product_id: product.id.clone(),
                name: product.name.clone(),
                image: product.image.clone(),
                price: product.price.clone(),
                quantity: 1,
                basket_number,
            });
            1
        };
        self.raise(SessionEvent::ItemAdded {
            product_id: product.id.clone(),
            basket_number,
            quantity,
        });
        quantity
    }

    fn raise(&mut self, event: SessionEvent) { self.events.push(event); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError { DecisionPending, NoDecisionPending, InvalidBasketNumber }
impl std::error::Error for EngineError {}
impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DecisionPending => write!(f, "An overflow decision is pending"),
            Self::NoDecisionPending => write!(f, "No overflow decision is pending"),
            Self::InvalidBasketNumber => write!(f, "Basket numbers start at 1"),
        }
    }
}
