//! Checkout Assembler
//!
//! Turns a finished basket session into the order-submission payload. All
//! guards run before anything is built; a failed guard never touches the
//! session, so the user can fix the problem and retry without re-composing.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::basket::{BasketSelection, BasketSession};
use crate::domain::value_objects::{Money, Pincode};
use crate::session::UserContext;

/// Outcome of the pincode-serviceability lookup. The upstream service
/// answers with a bare amount; zero or negative means deliveries are not
/// supported there. `Unresolved` is the state before any successful lookup,
/// and any non-6-digit pincode input or failed lookup resets to it rather
/// than keeping a stale quote. A serviceable quote records the pincode it
/// was resolved for, so checkout can refuse a cost quoted for some other
/// destination.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShippingQuote {
    #[default]
    Unresolved,
    NotServiceable,
    Serviceable { pincode: Pincode, cost: Money },
}

impl ShippingQuote {
    pub fn from_amount(pincode: &Pincode, amount: Option<Money>) -> Self {
        match amount {
            Some(cost) if cost.is_positive() => Self::Serviceable { pincode: pincode.clone(), cost },
            _ => Self::NotServiceable,
        }
    }

    pub fn is_serviceable(&self) -> bool { matches!(self, Self::Serviceable { .. }) }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct ShippingInfo {
    #[validate(length(min = 1, message = "Recipient name is required"))]
    pub recipient_name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(custom = "validate_pincode")]
    pub pincode: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
}

fn validate_pincode(value: &str) -> Result<(), ValidationError> {
    Pincode::parse(value).map_err(|_| ValidationError::new("pincode"))?;
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.len() != 10 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new("phone"));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize)]
pub struct BasketLine {
    pub basket_number: u32,
    pub items: Vec<BasketSelection>,
    pub total: Money,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderPayload {
    pub user: UserContext,
    pub items: Vec<BasketSelection>,
    pub total_amount: Money,
    pub shipping_info: ShippingInfo,
    pub order_type: OrderType,
    pub baskets: Vec<BasketLine>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    GiftBasket,
    Regular,
}

/// Build the submission payload from a session snapshot. Grand total is the
/// sum of per-basket totals plus the resolved shipping cost.
pub fn build_order_payload(
    session: &BasketSession,
    user: Option<&UserContext>,
    shipping_info: &ShippingInfo,
    quote: &ShippingQuote,
) -> Result<OrderPayload, CheckoutError> {
    let user = user.ok_or(CheckoutError::NotAuthenticated)?;
    if session.decision_pending() {
        return Err(CheckoutError::DecisionPending);
    }
    if session.is_empty() {
        return Err(CheckoutError::EmptySelection);
    }
    shipping_info
        .validate()
        .map_err(|e| CheckoutError::InvalidShippingInfo(e.to_string()))?;
    let destination = Pincode::parse(&shipping_info.pincode)
        .map_err(|e| CheckoutError::InvalidShippingInfo(e.to_string()))?;
    let shipping_cost = match quote {
        ShippingQuote::Serviceable { pincode, cost } => {
            // A quote only covers the pincode it was resolved for.
            if *pincode != destination {
                return Err(CheckoutError::PincodeMismatch);
            }
            cost.clone()
        }
        ShippingQuote::NotServiceable => return Err(CheckoutError::NotServiceable),
        ShippingQuote::Unresolved => return Err(CheckoutError::ShippingUnresolved),
    };

    let baskets: Vec<BasketLine> = session
        .unique_baskets()
        .into_iter()
        .map(|n| BasketLine {
            basket_number: n,
            items: session.basket_items(n).into_iter().cloned().collect(),
            total: session.basket_total(n),
        })
        .collect();
    let total_amount = session
        .grand_total()
        .add(&shipping_cost)
        .map_err(|_| CheckoutError::ShippingUnresolved)?;

    Ok(OrderPayload {
        user: user.clone(),
        items: session.selections().to_vec(),
        total_amount,
        shipping_info: shipping_info.clone(),
        order_type: OrderType::GiftBasket,
        baskets,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    NotAuthenticated,
    EmptySelection,
    DecisionPending,
    NotServiceable,
    ShippingUnresolved,
    PincodeMismatch,
    InvalidShippingInfo(String),
}
impl std::error::Error for CheckoutError {}
impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "Please log in to place an order"),
            Self::EmptySelection => write!(f, "Your baskets are empty"),
            Self::DecisionPending => write!(f, "Resolve the pending basket decision first"),
            Self::NotServiceable => write!(f, "We do not currently deliver to this pincode"),
            Self::ShippingUnresolved => write!(f, "Check delivery availability for your pincode first"),
            Self::PincodeMismatch => write!(f, "Delivery availability was checked for a different pincode"),
            Self::InvalidShippingInfo(detail) => write!(f, "Invalid shipping details: {detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::basket::HamperSize;
    use crate::domain::catalog::CatalogProduct;
    use rust_decimal::Decimal;

    fn user() -> UserContext {
        UserContext { user_id: "U1".into(), name: "Asha".into(), email: "asha@example.com".into() }
    }

    fn shipping_info() -> ShippingInfo {
        ShippingInfo {
            recipient_name: "Asha".into(), address_line1: "12 MG Road".into(), address_line2: None,
            city: "Bengaluru".into(), state: "Karnataka".into(), pincode: "560001".into(),
            phone: "9876543210".into(),
        }
    }

    fn quote_for(pincode: &str, amount: i64) -> ShippingQuote {
        ShippingQuote::Serviceable {
            pincode: Pincode::parse(pincode).unwrap(),
            cost: Money::inr(Decimal::new(amount, 0)),
        }
    }

    fn session_with_items() -> BasketSession {
        let mut session = BasketSession::new(HamperSize::Small);
        let p = CatalogProduct {
            id: "P1".into(), name: "Rose Serum".into(), price: Money::inr(Decimal::new(499, 0)),
            image: String::new(), category_id: None, subcategory_id: None, featured: false,
        };
        session.add_product(&p).unwrap();
        session
    }

    #[test]
    fn test_payload_totals_and_shape() {
        let session = session_with_items();
        let quote = quote_for("560001", 80);
        let payload = build_order_payload(&session, Some(&user()), &shipping_info(), &quote).unwrap();
        assert_eq!(payload.order_type, OrderType::GiftBasket);
        assert_eq!(payload.baskets.len(), 1);
        assert_eq!(payload.baskets[0].basket_number, 1);
        // 499 item + 199 container + 80 shipping
        assert_eq!(payload.total_amount.amount(), Decimal::new(778, 0));
    }

    #[test]
    fn test_empty_selection_rejected_before_anything_else_external() {
        let session = BasketSession::new(HamperSize::Small);
        let quote = quote_for("560001", 80);
        let err = build_order_payload(&session, Some(&user()), &shipping_info(), &quote).unwrap_err();
        assert_eq!(err, CheckoutError::EmptySelection);
    }

    #[test]
    fn test_unserviceable_blocks_submission() {
        let session = session_with_items();
        let err = build_order_payload(&session, Some(&user()), &shipping_info(), &ShippingQuote::NotServiceable)
            .unwrap_err();
        assert_eq!(err, CheckoutError::NotServiceable);
        // Session untouched by the failed attempt.
        assert_eq!(session.selections().len(), 1);
    }

    #[test]
    fn test_unresolved_quote_blocks_submission() {
        let session = session_with_items();
        let err = build_order_payload(&session, Some(&user()), &shipping_info(), &ShippingQuote::Unresolved)
            .unwrap_err();
        assert_eq!(err, CheckoutError::ShippingUnresolved);
    }

    #[test]
    fn test_unauthenticated_rejected() {
        let session = session_with_items();
        let quote = quote_for("560001", 80);
        let err = build_order_payload(&session, None, &shipping_info(), &quote).unwrap_err();
        assert_eq!(err, CheckoutError::NotAuthenticated);
    }

    #[test]
    fn test_bad_pincode_rejected_by_validation() {
        let session = session_with_items();
        let quote = quote_for("560001", 80);
        let mut info = shipping_info();
        info.pincode = "5600".into();
        let err = build_order_payload(&session, Some(&user()), &info, &quote).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidShippingInfo(_)));
    }

    #[test]
    fn test_quote_sentinel_rule() {
        let pin = Pincode::parse("560001").unwrap();
        assert_eq!(ShippingQuote::from_amount(&pin, None), ShippingQuote::NotServiceable);
        assert_eq!(ShippingQuote::from_amount(&pin, Some(Money::inr(Decimal::ZERO))), ShippingQuote::NotServiceable);
        assert_eq!(
            ShippingQuote::from_amount(&pin, Some(Money::inr(Decimal::new(-1, 0)))),
            ShippingQuote::NotServiceable
        );
        assert!(ShippingQuote::from_amount(&pin, Some(Money::inr(Decimal::new(60, 0)))).is_serviceable());
    }

    #[test]
    fn test_quote_bound_to_destination_pincode() {
        let session = session_with_items();
        // The quote was resolved for another destination; a fresh check is
        // required before this pincode can ship.
        let quote = quote_for("110001", 40);
        let err = build_order_payload(&session, Some(&user()), &shipping_info(), &quote).unwrap_err();
        assert_eq!(err, CheckoutError::PincodeMismatch);
        let matching = quote_for("560001", 40);
        assert!(build_order_payload(&session, Some(&user()), &shipping_info(), &matching).is_ok());
    }

    #[test]
    fn test_phone_must_be_ten_digits() {
        let session = session_with_items();
        let quote = quote_for("560001", 80);
        let mut info = shipping_info();
        info.phone = "98ab543210".into();
        let err = build_order_payload(&session, Some(&user()), &info, &quote).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidShippingInfo(_)));
        info.phone = "98765432101".into();
        let err = build_order_payload(&session, Some(&user()), &info, &quote).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidShippingInfo(_)));
    }
}
