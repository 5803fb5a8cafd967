//! Canonical order entities produced by the normalizer.
//!
//! `grand_total` is always the value the source reported, never recomputed
//! from the component fields; the components are independent reads that may
//! be approximations (`subtotal` falls back to `grand_total` when absent).
//! Downstream code must not "repair" that relation.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::NOT_AVAILABLE;

/// One payment split on an order. `amount` is absent on records from cashier
/// builds that only stored the method label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSplit {
    pub method: String,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Raw per-item status string as delivered by the source.
    pub status: String,
    /// True when the item's own status is void/cancel or the order lists it
    /// in its separate void-items structure.
    pub voided: bool,
}

impl LineItem {
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub order_type: String,
    pub table: Option<String>,
    pub cashier: String,
    pub member: Option<String>,
    pub payments: Vec<PaymentSplit>,
    pub subtotal: f64,
    pub service_charge: f64,
    pub tax: f64,
    pub discount: f64,
    pub grand_total: f64,
    pub discount_name: Option<String>,
    /// Raw order status string as delivered by the source.
    pub status: String,
    /// Input order preserved; never resorted.
    pub items: Vec<LineItem>,
    /// Items the source listed separately as voided.
    pub void_items: Vec<LineItem>,
}

impl Order {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Joined payment-method labels for the transaction log column.
    pub fn payment_display(&self) -> String {
        if self.payments.is_empty() {
            return NOT_AVAILABLE.to_string();
        }
        self.payments
            .iter()
            .map(|p| p.method.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Joined "Nx NAME" item summary used by the promotion report.
    pub fn item_detail(&self) -> String {
        self.items
            .iter()
            .map(|i| format!("{}x {}", i.quantity, i.name))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_order() -> Order {
        Order {
            id: "ORD-1".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
            order_type: "Dine In".into(),
            table: None,
            cashier: "N/A".into(),
            member: None,
            payments: Vec::new(),
            subtotal: 0.0,
            service_charge: 0.0,
            tax: 0.0,
            discount: 0.0,
            grand_total: 0.0,
            discount_name: None,
            status: String::new(),
            items: Vec::new(),
            void_items: Vec::new(),
        }
    }

    #[test]
    fn payment_display_joins_split_methods() {
        let mut order = base_order();
        order.payments = vec![
            PaymentSplit {
                method: "Cash".into(),
                amount: Some(10_000.0),
            },
            PaymentSplit {
                method: "QRIS".into(),
                amount: Some(5_000.0),
            },
        ];
        assert_eq!(order.payment_display(), "Cash; QRIS");
    }

    #[test]
    fn item_detail_summarizes_quantities() {
        let mut order = base_order();
        order.items = vec![
            LineItem {
                name: "SOUP".into(),
                quantity: 2.0,
                unit_price: 10_000.0,
                status: String::new(),
                voided: false,
            },
            LineItem {
                name: "TEA".into(),
                quantity: 1.0,
                unit_price: 8_000.0,
                status: String::new(),
                voided: false,
            },
        ];
        assert_eq!(order.item_detail(), "2x SOUP; 1x TEA");
    }

    #[test]
    fn payment_display_falls_back_to_sentinel() {
        assert_eq!(base_order().payment_display(), "N/A");
    }

    #[test]
    fn line_total_is_quantity_times_unit_price() {
        let item = LineItem {
            name: "SOUP".into(),
            quantity: 2.0,
            unit_price: 10_000.0,
            status: String::new(),
            voided: false,
        };
        assert_eq!(item.line_total(), 20_000.0);
    }

    #[test]
    fn date_and_hour_come_from_the_timestamp() {
        let order = base_order();
        assert_eq!(order.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(order.hour(), 12);
    }
}
