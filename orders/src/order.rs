//! Purchase order records.

use chrono::{DateTime, Utc};
use ratedesk_common::{Currency, Money, OrderId};
use serde::{Deserialize, Serialize};

/// A purchase order priced in a foreign currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Short human-readable title.
    pub title: String,
    /// Price in the order's own currency.
    pub price: Money,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order.
    pub fn new(title: impl Into<String>, price: Money) -> Self {
        Self {
            id: OrderId::new(),
            title: title.into(),
            price,
            created_at: Utc::now(),
        }
    }

    /// The order's pricing currency.
    pub fn currency(&self) -> &Currency {
        &self.price.currency
    }
}
