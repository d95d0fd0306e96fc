//! Hamper Composer - gift-hamper composition and checkout service

use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, routing::{delete, get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use hamper_composer::domain::basket::{AddOutcome, BasketSelection, HamperSize, OverflowState};
use hamper_composer::domain::catalog::{CatalogFilter, CatalogProduct};
use hamper_composer::domain::order::{build_order_payload, ShippingInfo, ShippingQuote};
use hamper_composer::domain::value_objects::{Money, Pincode};
use hamper_composer::services::{CatalogSource, HttpCatalog, HttpOrderGateway, HttpServiceability, OrderGateway, ServiceabilityLookup};
use hamper_composer::session::{SessionStore, UserContext};
use hamper_composer::Error;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<SessionStore>>,
    pub catalog: Arc<dyn CatalogSource>,
    pub shipping: Arc<dyn ServiceabilityLookup>,
    pub orders: Arc<dyn OrderGateway>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let catalog_url = std::env::var("CATALOG_URL").unwrap_or_else(|_| "http://localhost:5000/api".into());
    let shipping_url = std::env::var("SHIPPING_URL").unwrap_or_else(|_| catalog_url.clone());
    let orders_url = std::env::var("ORDERS_URL").unwrap_or_else(|_| catalog_url.clone());
    let currency = std::env::var("CURRENCY").unwrap_or_else(|_| "INR".into());
    let client = reqwest::Client::new();

    let state = AppState {
        store: Arc::new(RwLock::new(SessionStore::new())),
        catalog: Arc::new(HttpCatalog::new(client.clone(), &catalog_url, &currency)),
        shipping: Arc::new(HttpServiceability::new(client.clone(), &shipping_url, &currency)),
        orders: Arc::new(HttpOrderGateway::new(client, &orders_url)),
    };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "hamper-composer"})) }))
        .route("/api/v1/catalog/products", get(list_products))
        .route("/api/v1/catalog/categories", get(list_categories))
        .route("/api/v1/catalog/subcategories", get(list_subcategories))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/:id", get(session_summary).delete(drop_session))
        .route("/api/v1/sessions/:id/items", post(add_item))
        .route("/api/v1/sessions/:id/items/:product_id", delete(remove_item))
        .route("/api/v1/sessions/:id/confirm-basket", post(confirm_basket))
        .route("/api/v1/sessions/:id/cancel-overflow", post(cancel_overflow))
        .route("/api/v1/sessions/:id/switch", post(switch_basket))
        .route("/api/v1/sessions/:id/clear", post(clear_basket))
        .route("/api/v1/sessions/:id/reset", post(reset_session))
        .route("/api/v1/sessions/:id/pincode", post(check_pincode))
        .route("/api/v1/sessions/:id/checkout", post(checkout))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("hamper-composer listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

type ApiError = (StatusCode, String);

fn api_error(e: Error) -> ApiError {
    let status = match &e {
        Error::Engine(_) => StatusCode::CONFLICT,
        Error::Checkout(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::SessionNotFound => StatusCode::NOT_FOUND,
        Error::Upstream(_) | Error::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

async fn list_products(State(s): State<AppState>, Query(filter): Query<CatalogFilter>) -> Result<Json<Vec<CatalogProduct>>, ApiError> {
    let products = s.catalog.products().await.map_err(api_error)?;
    Ok(Json(filter.apply(&products).into_iter().cloned().collect()))
}

async fn list_categories(State(s): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    s.catalog.categories().await.map(Json).map_err(api_error)
}

async fn list_subcategories(State(s): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    s.catalog.subcategories().await.map(Json).map_err(api_error)
}

#[derive(Debug, Deserialize)] pub struct CreateSessionRequest { pub size: HamperSize, pub user: Option<UserContext> }
#[derive(Debug, Serialize)] pub struct CreateSessionResponse { pub session_id: Uuid }

async fn create_session(State(s): State<AppState>, Json(r): Json<CreateSessionRequest>) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = s.store.write().await.create(r.size, r.user);
    tracing::info!(%session_id, size = ?r.size, "session created");
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

#[derive(Debug, Serialize)]
pub struct BasketView { pub basket_number: u32, pub items: Vec<BasketSelection>, pub total: Money }

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub size: HamperSize,
    pub active_basket: u32,
    pub pending_product: Option<CatalogProduct>,
    pub baskets: Vec<BasketView>,
    pub grand_total: Money,
    pub shipping_quote: ShippingQuote,
}

async fn session_summary(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SessionSummary>, ApiError> {
    let store = s.store.read().await;
    let session = store.get(id).ok_or_else(|| api_error(Error::SessionNotFound))?;
    let basket = &session.basket;
    let pending_product = match basket.overflow() {
        OverflowState::AwaitingDecision { pending } => Some(pending.clone()),
        OverflowState::Idle => None,
    };
    let baskets = basket.unique_baskets().into_iter().map(|n| BasketView {
        basket_number: n,
        items: basket.basket_items(n).into_iter().cloned().collect(),
        total: basket.basket_total(n),
    }).collect();
    Ok(Json(SessionSummary {
        session_id: id, size: basket.size(), active_basket: basket.active_basket(),
        pending_product, baskets, grand_total: basket.grand_total(),
        shipping_quote: session.shipping_quote.clone(),
    }))
}

async fn drop_session(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    s.store.write().await.remove(id).ok_or_else(|| api_error(Error::SessionNotFound))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn with_basket<T>(
    s: &AppState,
    id: Uuid,
    op: impl FnOnce(&mut hamper_composer::BasketSession) -> Result<T, Error>,
) -> Result<T, ApiError> {
    let mut store = s.store.write().await;
    let session = store.get_mut(id).ok_or_else(|| api_error(Error::SessionNotFound))?;
    let out = op(&mut session.basket).map_err(api_error)?;
    for event in session.basket.take_events() {
        tracing::debug!(session_id = %id, ?event, "session event");
    }
    Ok(out)
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddItemResponse {
    Added { basket_number: u32, quantity: u32 },
    OverflowPending,
}

async fn add_item(State(s): State<AppState>, Path(id): Path<Uuid>, Json(product): Json<CatalogProduct>) -> Result<Json<AddItemResponse>, ApiError> {
    let outcome = with_basket(&s, id, |b| b.add_product(&product).map_err(Into::into)).await?;
    Ok(Json(match outcome {
        AddOutcome::Added { basket_number, quantity } => AddItemResponse::Added { basket_number, quantity },
        AddOutcome::OverflowPending => AddItemResponse::OverflowPending,
    }))
}

#[derive(Debug, Deserialize)] pub struct RemoveParams { pub basket: Option<u32> }

async fn remove_item(State(s): State<AppState>, Path((id, product_id)): Path<(Uuid, String)>, Query(p): Query<RemoveParams>) -> Result<StatusCode, ApiError> {
    with_basket(&s, id, |b| b.remove_product(&product_id, p.basket).map_err(Into::into)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)] pub struct SpawnedBasket { pub basket_number: u32 }

async fn confirm_basket(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SpawnedBasket>, ApiError> {
    let basket_number = with_basket(&s, id, |b| b.confirm_new_basket().map_err(Into::into)).await?;
    Ok(Json(SpawnedBasket { basket_number }))
}

async fn cancel_overflow(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    with_basket(&s, id, |b| b.cancel_overflow().map_err(Into::into)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)] pub struct BasketNumberRequest { pub basket_number: u32 }

async fn switch_basket(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<BasketNumberRequest>) -> Result<StatusCode, ApiError> {
    with_basket(&s, id, |b| b.switch_active_basket(r.basket_number).map_err(Into::into)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_basket(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<BasketNumberRequest>) -> Result<StatusCode, ApiError> {
    with_basket(&s, id, |b| b.clear_basket(r.basket_number).map_err(Into::into)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_session(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    with_basket(&s, id, |b| b.reset_all().map_err(Into::into)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)] pub struct PincodeRequest { pub pincode: String }

/// Resolve and store the shipping quote for this session. Anything other
/// than a 6-digit pincode, and any failed lookup, resets the quote to
/// unresolved instead of leaving a stale value behind.
async fn check_pincode(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<PincodeRequest>) -> Result<Json<ShippingQuote>, ApiError> {
    let looked_up = match Pincode::parse(&r.pincode) {
        Ok(pincode) => s.shipping.quote(&pincode).await,
        Err(_) => Ok(ShippingQuote::Unresolved),
    };
    let mut store = s.store.write().await;
    let session = store.get_mut(id).ok_or_else(|| api_error(Error::SessionNotFound))?;
    match looked_up {
        Ok(quote) => {
            session.shipping_quote = quote.clone();
            Ok(Json(quote))
        }
        Err(e) => {
            session.shipping_quote = ShippingQuote::Unresolved;
            Err(api_error(e))
        }
    }
}

#[derive(Debug, Serialize)] pub struct CheckoutResponse { pub order_id: String }

async fn checkout(State(s): State<AppState>, Path(id): Path<Uuid>, Json(info): Json<ShippingInfo>) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let payload = {
        let store = s.store.read().await;
        let session = store.get(id).ok_or_else(|| api_error(Error::SessionNotFound))?;
        build_order_payload(&session.basket, session.user.as_ref(), &info, &session.shipping_quote)
            .map_err(|e| api_error(e.into()))?
    };
    // Submission failure leaves the session intact for retry.
    let order_id = s.orders.submit(&payload).await.map_err(api_error)?;
    s.store.write().await.remove(id);
    Ok((StatusCode::CREATED, Json(CheckoutResponse { order_id })))
}
