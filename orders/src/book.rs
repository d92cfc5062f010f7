//! Keyed order store.

use std::collections::HashMap;

use ratedesk_common::{Currency, Money, OrderId};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{OrderError, OrderResult};
use crate::order::Order;

/// In-memory order book. Orders are created on add, mutated by id, and
/// never deleted.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: HashMap<OrderId, Order>,
}

impl OrderBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new order and return its id.
    pub fn add(&mut self, title: impl Into<String>, price: Money) -> OrderResult<OrderId> {
        if price.is_negative() {
            return Err(OrderError::InvalidPrice(price.value));
        }

        let order = Order::new(title, price);
        let id = order.id;
        debug!(order_id = %id, price = %order.price, "Order added");
        self.orders.insert(id, order);
        Ok(id)
    }

    /// Update an order's price value. The id must exist.
    pub fn edit_price(&mut self, id: OrderId, value: Decimal) -> OrderResult<()> {
        if value < Decimal::ZERO {
            return Err(OrderError::InvalidPrice(value));
        }

        let order = self
            .orders
            .get_mut(&id)
            .ok_or(OrderError::UnknownOrder(id))?;
        order.price.value = value;
        debug!(order_id = %id, price = %order.price, "Order price updated");
        Ok(())
    }

    /// Update an order's pricing currency. The id must exist.
    pub fn edit_currency(&mut self, id: OrderId, currency: Currency) -> OrderResult<()> {
        let order = self
            .orders
            .get_mut(&id)
            .ok_or(OrderError::UnknownOrder(id))?;
        order.price.currency = currency;
        debug!(order_id = %id, price = %order.price, "Order currency updated");
        Ok(())
    }

    /// Look up an order by id.
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Iterate over all orders, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Number of orders in the book.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the book is empty.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total all orders in the base currency through a confirmed-rate
    /// lookup. A currency with no rate is an error, not a skipped row.
    pub fn total_in<F>(&self, base: Currency, rate_of: F) -> OrderResult<Money>
    where
        F: Fn(&Currency) -> Option<Decimal>,
    {
        let mut total = Money::zero(base.clone());

        for order in self.orders.values() {
            let converted = if order.price.currency == base {
                order.price.round()
            } else {
                let rate = rate_of(&order.price.currency)
                    .ok_or_else(|| OrderError::MissingRate(order.price.currency.clone()))?;
                order.price.convert(rate, base.clone())
            };
            total.value += converted.value;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratedesk_common::Currency;
    use rust_decimal_macros::dec;

    fn usd(value: Decimal) -> Money {
        Money::new(value, Currency::usd())
    }

    #[test]
    fn test_add_and_get() {
        let mut book = OrderBook::new();

        let id = book.add("Office chairs", usd(dec!(250))).unwrap();

        let order = book.get(&id).unwrap();
        assert_eq!(order.title, "Office chairs");
        assert_eq!(order.price.value, dec!(250));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_edit_price() {
        let mut book = OrderBook::new();
        let id = book.add("Office chairs", usd(dec!(250))).unwrap();

        book.edit_price(id, dec!(275)).unwrap();

        assert_eq!(book.get(&id).unwrap().price.value, dec!(275));
    }

    #[test]
    fn test_edit_currency() {
        let mut book = OrderBook::new();
        let id = book.add("Office chairs", usd(dec!(250))).unwrap();

        book.edit_currency(id, Currency::eur()).unwrap();

        assert_eq!(*book.get(&id).unwrap().currency(), Currency::eur());
    }

    #[test]
    fn test_edits_to_missing_id_fail_explicitly() {
        let mut book = OrderBook::new();
        let ghost = OrderId::new();

        assert!(matches!(
            book.edit_price(ghost, dec!(10)),
            Err(OrderError::UnknownOrder(_))
        ));
        assert!(matches!(
            book.edit_currency(ghost, Currency::eur()),
            Err(OrderError::UnknownOrder(_))
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut book = OrderBook::new();

        assert!(matches!(
            book.add("Refund?", usd(dec!(-5))),
            Err(OrderError::InvalidPrice(_))
        ));

        let id = book.add("Office chairs", usd(dec!(250))).unwrap();
        assert!(book.edit_price(id, dec!(-1)).is_err());
        assert_eq!(book.get(&id).unwrap().price.value, dec!(250));
    }

    #[test]
    fn test_total_uses_confirmed_rates() {
        let mut book = OrderBook::new();
        book.add("Desk", usd(dec!(10))).unwrap();
        book.add("Lamp", Money::new(dec!(20), Currency::eur()))
            .unwrap();

        let total = book
            .total_in(Currency::gbp(), |currency| match currency.code() {
                "USD" => Some(dec!(2)),
                "EUR" => Some(dec!(0.5)),
                _ => None,
            })
            .unwrap();

        // 10 * 2 + 20 * 0.5
        assert_eq!(total.value, dec!(30));
        assert_eq!(total.currency, Currency::gbp());
    }

    #[test]
    fn test_total_passes_base_through() {
        let mut book = OrderBook::new();
        book.add("Desk", Money::new(dec!(15), Currency::gbp()))
            .unwrap();

        let total = book.total_in(Currency::gbp(), |_| None).unwrap();

        assert_eq!(total.value, dec!(15));
    }

    #[test]
    fn test_total_errors_on_missing_rate() {
        let mut book = OrderBook::new();
        book.add("Desk", usd(dec!(10))).unwrap();

        let result = book.total_in(Currency::gbp(), |_| None);

        assert!(matches!(result, Err(OrderError::MissingRate(_))));
    }
}
