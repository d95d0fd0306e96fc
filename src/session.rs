//! Explicit session store.
//!
//! One `CustomizeSession` per gift-hamper composition in progress: the user
//! context read from the persisted auth payload at startup/login, and the
//! basket engine state. Handed to handlers by reference through the shared
//! store, never through ambient globals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::basket::{BasketSession, HamperSize};
use crate::domain::order::ShippingQuote;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct CustomizeSession {
    pub id: Uuid,
    pub user: Option<UserContext>,
    pub basket: BasketSession,
    pub shipping_quote: ShippingQuote,
    pub created_at: DateTime<Utc>,
}

impl CustomizeSession {
    pub fn new(size: HamperSize, user: Option<UserContext>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            basket: BasketSession::new(size),
            shipping_quote: ShippingQuote::Unresolved,
            created_at: Utc::now(),
        }
    }
}

/// In-memory map of live customization sessions. State lives here and
/// nowhere else until checkout submits the order downstream.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, CustomizeSession>,
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    pub fn create(&mut self, size: HamperSize, user: Option<UserContext>) -> Uuid {
        let session = CustomizeSession::new(size, user);
        let id = session.id;
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&CustomizeSession> { self.sessions.get(&id) }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut CustomizeSession> { self.sessions.get_mut(&id) }

    pub fn remove(&mut self, id: Uuid) -> Option<CustomizeSession> { self.sessions.remove(&id) }

    pub fn len(&self) -> usize { self.sessions.len() }

    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }
}
