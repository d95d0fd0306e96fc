//! End-to-end composition and checkout flow, exercised through the public
//! crate surface the way the service handlers drive it.

use rust_decimal::Decimal;

use hamper_composer::domain::events::SessionEvent;
use hamper_composer::services::{CatalogSource, InMemoryCatalog};
use hamper_composer::{
    build_order_payload, AddOutcome, BasketSession, CatalogFilter, CatalogProduct, CheckoutError,
    HamperSize, Money, Pincode, SessionStore, ShippingInfo, ShippingQuote, UserContext,
};

fn product(id: &str, name: &str, price: i64) -> CatalogProduct {
    CatalogProduct {
        id: id.into(),
        name: name.into(),
        price: Money::inr(Decimal::new(price, 0)),
        image: format!("{id}.jpg"),
        category_id: Some("serums".into()),
        subcategory_id: None,
        featured: false,
    }
}

fn shipping_info() -> ShippingInfo {
    ShippingInfo {
        recipient_name: "Meera".into(),
        address_line1: "44 Residency Road".into(),
        address_line2: Some("Flat 3B".into()),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        pincode: "560025".into(),
        phone: "9812345678".into(),
    }
}

fn quote(amount: i64) -> ShippingQuote {
    ShippingQuote::Serviceable {
        pincode: Pincode::parse("560025").unwrap(),
        cost: Money::inr(Decimal::new(amount, 0)),
    }
}

fn user() -> UserContext {
    UserContext { user_id: "U9".into(), name: "Meera".into(), email: "meera@example.com".into() }
}

#[test]
fn full_customization_walkthrough() {
    // Capacity 3. A twice merges into one entry, then B and C fill the
    // distinct slots.
    let mut session = BasketSession::new(HamperSize::Small);
    let a = product("A", "Rose Serum", 100);
    session.add_product(&a).unwrap();
    assert_eq!(session.add_product(&a).unwrap(), AddOutcome::Added { basket_number: 1, quantity: 2 });
    session.add_product(&product("B", "Clay Mask", 50)).unwrap();
    assert_eq!(
        session.add_product(&product("C", "Night Cream", 75)).unwrap(),
        AddOutcome::Added { basket_number: 1, quantity: 1 }
    );

    // D overflows; confirming spawns basket 2 holding just D.
    assert_eq!(session.add_product(&product("D", "Lip Balm", 25)).unwrap(), AddOutcome::OverflowPending);
    let spawned = session.confirm_new_basket().unwrap();
    assert_eq!(spawned, 2);
    assert_eq!(session.active_basket(), 2);
    assert_eq!(session.unique_baskets(), vec![1, 2]);

    // Basket 1: 2x100 + 50 + 75 + 199 container; basket 2: 25 + 199.
    assert_eq!(session.basket_total(1).amount(), Decimal::new(524, 0));
    assert_eq!(session.basket_total(2).amount(), Decimal::new(224, 0));
    assert_eq!(session.grand_total().amount(), Decimal::new(748, 0));

    let events = session.take_events();
    assert!(events.contains(&SessionEvent::BasketSpawned { basket_number: 2 }));

    // Checkout with a serviceable quote.
    let quote = quote(60);
    let payload = build_order_payload(&session, Some(&user()), &shipping_info(), &quote).unwrap();
    assert_eq!(payload.baskets.len(), 2);
    assert_eq!(payload.items.len(), 4);
    assert_eq!(payload.total_amount.amount(), Decimal::new(808, 0));
}

#[test]
fn unserviceable_pincode_blocks_checkout_and_preserves_session() {
    let mut session = BasketSession::new(HamperSize::Small);
    session.add_product(&product("A", "Rose Serum", 100)).unwrap();
    let before = session.selections().to_vec();

    let err = build_order_payload(&session, Some(&user()), &shipping_info(), &ShippingQuote::NotServiceable)
        .unwrap_err();
    assert_eq!(err, CheckoutError::NotServiceable);
    assert_eq!(session.selections(), &before[..]);

    // A later serviceable quote goes through against the same session.
    let quote = quote(40);
    assert!(build_order_payload(&session, Some(&user()), &shipping_info(), &quote).is_ok());
}

#[test]
fn pending_overflow_blocks_checkout() {
    let mut session = BasketSession::new(HamperSize::Small);
    for id in ["A", "B", "C"] {
        session.add_product(&product(id, id, 100)).unwrap();
    }
    session.add_product(&product("D", "D", 100)).unwrap();

    let quote = quote(40);
    let err = build_order_payload(&session, Some(&user()), &shipping_info(), &quote).unwrap_err();
    assert_eq!(err, CheckoutError::DecisionPending);

    session.confirm_new_basket().unwrap();
    assert!(build_order_payload(&session, Some(&user()), &shipping_info(), &quote).is_ok());
}

#[test]
fn quote_for_another_pincode_does_not_carry_over() {
    let mut session = BasketSession::new(HamperSize::Small);
    session.add_product(&product("A", "Rose Serum", 100)).unwrap();

    // Serviceability was confirmed for one destination, but the shipping
    // form names another; the stale cost must not be reused.
    let elsewhere = ShippingQuote::Serviceable {
        pincode: Pincode::parse("110001").unwrap(),
        cost: Money::inr(Decimal::new(40, 0)),
    };
    let err = build_order_payload(&session, Some(&user()), &shipping_info(), &elsewhere).unwrap_err();
    assert_eq!(err, CheckoutError::PincodeMismatch);

    // Re-checking for the actual destination unblocks checkout.
    assert!(build_order_payload(&session, Some(&user()), &shipping_info(), &quote(40)).is_ok());
}

#[test]
fn session_store_keeps_composition_across_auth_redirect() {
    // An unauthenticated checkout attempt fails, but the session it points
    // at is untouched; attaching the user afterwards is enough to retry.
    let mut store = SessionStore::new();
    let id = store.create(HamperSize::Small, None);
    let session = store.get_mut(id).unwrap();
    session.basket.add_product(&product("A", "Rose Serum", 100)).unwrap();

    let quote = quote(40);
    let err = build_order_payload(&session.basket, session.user.as_ref(), &shipping_info(), &quote)
        .unwrap_err();
    assert_eq!(err, CheckoutError::NotAuthenticated);

    session.user = Some(user());
    assert!(build_order_payload(&session.basket, session.user.as_ref(), &shipping_info(), &quote).is_ok());
    assert_eq!(session.basket.selections().len(), 1);
}

#[tokio::test]
async fn catalog_filter_feeds_selection() {
    let mut featured = product("F", "Featured Kit", 250);
    featured.featured = true;
    let mut other_cat = product("O", "Other", 10);
    other_cat.category_id = Some("masks".into());

    let catalog = InMemoryCatalog {
        products: vec![product("A", "Rose Serum", 100), featured.clone(), other_cat],
        ..Default::default()
    };
    let products = catalog.products().await.unwrap();

    let filter = CatalogFilter { category_id: Some("serums".into()), featured_only: true, ..Default::default() };
    let grid = filter.apply(&products);
    assert_eq!(grid.len(), 1);

    let mut session = BasketSession::new(HamperSize::Medium);
    session.add_product(grid[0]).unwrap();
    assert_eq!(session.selections()[0].product_id, "F");
    assert_eq!(session.selections()[0].price, featured.price);
}
