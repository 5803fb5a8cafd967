//! Aggregation engine: canonical orders into grouped sales metrics.
//!
//! Consumes orders already restricted to the report's date range, plus the
//! category lookup and branch rates, and produces the headline totals, the
//! grouped tables, and the discount/void extracts the report sheets are
//! built from. `grand_total` is summed exactly as the source delivered it;
//! the recompute helper applies only to voided items, which carry no tax
//! breakdown of their own.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::config::BranchConfig;
use crate::menu::CategoryLookup;
use crate::normalize::is_voidish;
use crate::order::{LineItem, Order};
use crate::NOT_AVAILABLE;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Amount plus order count, used by the hourly and payment-method tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AmountCount {
    pub amount: f64,
    pub count: i64,
}

/// Quantity and amount for one (category, item, order type) group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ItemSales {
    pub quantity: f64,
    pub amount: f64,
}

/// Key of the item-sales table. The order type is part of the key so that
/// complimentary or zero-priced order types report separately from paid
/// sales of the same item.
pub type ItemKey = (String, String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl DiscountKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "Percentage",
            DiscountKind::Fixed => "Fixed",
        }
    }
}

/// One discount-bearing order in the promotion extract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountRow {
    pub order_id: String,
    pub timestamp: NaiveDateTime,
    pub order_type: String,
    pub table: Option<String>,
    pub cashier: String,
    pub member: Option<String>,
    pub promotion_name: String,
    pub kind: DiscountKind,
    /// Leading number of a percentage-style promotion name, when present.
    pub percent: Option<f64>,
    pub item_detail: String,
    pub item_count: usize,
    pub quantity_total: f64,
    pub subtotal: f64,
    pub service_charge: f64,
    pub tax: f64,
    pub discount: f64,
    pub grand_total: f64,
    pub payment_display: String,
    pub payment_splits: usize,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidReason {
    /// Listed in the order's separate void-items structure.
    ListedVoid,
    /// The item's own status string is void/cancel.
    ItemStatus,
    /// The whole order is marked void/cancel.
    OrderVoided,
}

impl VoidReason {
    pub fn label(&self) -> &'static str {
        match self {
            VoidReason::ListedVoid => "Void List",
            VoidReason::ItemStatus => "Item Status",
            VoidReason::OrderVoided => "Order Voided",
        }
    }
}

/// One voided item in the cancel extract, with recomputed charges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoidRow {
    pub order_id: String,
    pub timestamp: NaiveDateTime,
    pub order_type: String,
    pub table: Option<String>,
    pub voided_by: String,
    pub category: String,
    pub item_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub subtotal: f64,
    pub service_charge: f64,
    pub tax: f64,
    pub total: f64,
    pub reason: VoidReason,
}

/// Everything the report sheets are built from. Grouped tables are ordered
/// maps so iteration is deterministic and permutation of the input record
/// sequence cannot change any grouped total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    pub total_orders: i64,
    /// Sum of order subtotals.
    pub gross_sales: f64,
    /// Sum of grand totals as delivered by the source.
    pub net_sales: f64,
    pub discounts_total: f64,
    pub service_total: f64,
    pub tax_total: f64,
    /// Net sales per order; 0 when there are no orders.
    pub average_order_value: f64,
    pub by_date: BTreeMap<NaiveDate, f64>,
    pub by_hour: BTreeMap<u32, AmountCount>,
    pub by_main_category: BTreeMap<String, f64>,
    pub by_item: BTreeMap<ItemKey, ItemSales>,
    pub by_payment_method: BTreeMap<String, AmountCount>,
    pub discounts: Vec<DiscountRow>,
    pub voids: Vec<VoidRow>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate a range-filtered order snapshot.
pub fn aggregate_orders(
    orders: &[Order],
    lookup: &CategoryLookup,
    config: &BranchConfig,
) -> AggregationResult {
    let mut result = AggregationResult::default();

    for order in orders {
        result.total_orders += 1;
        result.gross_sales += order.subtotal;
        result.net_sales += order.grand_total;
        result.discounts_total += order.discount;
        result.service_total += order.service_charge;
        result.tax_total += order.tax;

        *result.by_date.entry(order.date()).or_insert(0.0) += order.grand_total;

        let hour = result.by_hour.entry(order.hour()).or_default();
        hour.amount += order.grand_total;
        hour.count += 1;

        apply_payments(&mut result.by_payment_method, order);

        for item in &order.items {
            let (category, main_category) = lookup.resolve(&item.name);
            *result
                .by_main_category
                .entry(main_category.to_string())
                .or_insert(0.0) += item.line_total();
            let entry = result
                .by_item
                .entry((
                    category.to_string(),
                    item.name.clone(),
                    order.order_type.clone(),
                ))
                .or_default();
            entry.quantity += item.quantity;
            entry.amount += item.line_total();
        }

        if let Some(row) = extract_discount(order) {
            result.discounts.push(row);
        }
        extract_voids(order, lookup, config, &mut result.voids);
    }

    if result.total_orders > 0 {
        result.average_order_value = result.net_sales / result.total_orders as f64;
    }

    info!(
        orders = result.total_orders,
        gross_sales = result.gross_sales,
        net_sales = result.net_sales,
        discount_rows = result.discounts.len(),
        void_rows = result.voids.len(),
        "Aggregated order snapshot"
    );

    result
}

/// Recompute charges for a line subtotal using the branch rates. Tax
/// compounds on the subtotal plus service charge, never on the subtotal
/// alone. Returns (service charge, tax, total).
pub fn recompute_charges(subtotal: f64, discount: f64, config: &BranchConfig) -> (f64, f64, f64) {
    let service_charge = subtotal * config.service_rate;
    let tax = (subtotal + service_charge) * config.tax_rate;
    let total = subtotal + service_charge + tax - discount;
    (service_charge, tax, total)
}

/// Payment attribution. Split payments carry their own amounts when the
/// source provides them; a lone split without an amount stands for the
/// whole order, while missing amounts on a multi-split order contribute
/// nothing rather than double-counting the grand total.
fn apply_payments(table: &mut BTreeMap<String, AmountCount>, order: &Order) {
    if order.payments.is_empty() {
        let entry = table.entry(NOT_AVAILABLE.to_string()).or_default();
        entry.amount += order.grand_total;
        entry.count += 1;
        return;
    }
    let single = order.payments.len() == 1;
    for split in &order.payments {
        let amount = match split.amount {
            Some(amount) => amount,
            None if single => order.grand_total,
            None => 0.0,
        };
        let entry = table.entry(split.method.clone()).or_default();
        entry.amount += amount;
        entry.count += 1;
    }
}

// ---------------------------------------------------------------------------
// Discount / void extraction
// ---------------------------------------------------------------------------

fn extract_discount(order: &Order) -> Option<DiscountRow> {
    if order.discount <= 0.0 {
        return None;
    }
    let promotion_name = order
        .discount_name
        .clone()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let kind = if promotion_name.contains('%') {
        DiscountKind::Percentage
    } else {
        DiscountKind::Fixed
    };
    let percent = match kind {
        DiscountKind::Percentage => leading_percent(&promotion_name),
        DiscountKind::Fixed => None,
    };
    Some(DiscountRow {
        order_id: order.id.clone(),
        timestamp: order.timestamp,
        order_type: order.order_type.clone(),
        table: order.table.clone(),
        cashier: order.cashier.clone(),
        member: order.member.clone(),
        promotion_name,
        kind,
        percent,
        item_detail: order.item_detail(),
        item_count: order.items.len(),
        quantity_total: order.items.iter().map(|i| i.quantity).sum(),
        subtotal: order.subtotal,
        service_charge: order.service_charge,
        tax: order.tax,
        discount: order.discount,
        grand_total: order.grand_total,
        payment_display: order.payment_display(),
        payment_splits: order.payments.len(),
        status: order.status.clone(),
    })
}

/// Leading number of a promotion name like "10 % Member" or "15% Opening".
fn leading_percent(name: &str) -> Option<f64> {
    name.split_whitespace()
        .next()?
        .trim_end_matches('%')
        .parse::<f64>()
        .ok()
}

/// Fixed-priority void rules for one item. The first matching rule wins and
/// names the reason: the separate void-items list, then the item's own
/// status, then a void/cancel status on the whole order.
pub fn item_void_reason(
    item: &LineItem,
    listed_as_void: bool,
    order_voided: bool,
) -> Option<VoidReason> {
    if listed_as_void {
        Some(VoidReason::ListedVoid)
    } else if is_voidish(&item.status) {
        Some(VoidReason::ItemStatus)
    } else if order_voided {
        Some(VoidReason::OrderVoided)
    } else {
        None
    }
}

fn extract_voids(
    order: &Order,
    lookup: &CategoryLookup,
    config: &BranchConfig,
    rows: &mut Vec<VoidRow>,
) {
    let order_voided = is_voidish(&order.status);
    let listed: HashSet<&str> = order.void_items.iter().map(|i| i.name.as_str()).collect();

    for item in &order.void_items {
        rows.push(void_row(order, item, VoidReason::ListedVoid, lookup, config));
    }
    for item in &order.items {
        match item_void_reason(item, listed.contains(item.name.as_str()), order_voided) {
            // The void-items list already produced this item's row.
            Some(VoidReason::ListedVoid) | None => continue,
            Some(reason) => rows.push(void_row(order, item, reason, lookup, config)),
        }
    }
}

fn void_row(
    order: &Order,
    item: &LineItem,
    reason: VoidReason,
    lookup: &CategoryLookup,
    config: &BranchConfig,
) -> VoidRow {
    let subtotal = item.line_total();
    let (service_charge, tax, total) = recompute_charges(subtotal, 0.0, config);
    VoidRow {
        order_id: order.id.clone(),
        timestamp: order.timestamp,
        order_type: order.order_type.clone(),
        table: order.table.clone(),
        voided_by: order.cashier.clone(),
        category: lookup.resolve(&item.name).0.to_string(),
        item_name: item.name.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        subtotal,
        service_charge,
        tax,
        total,
        reason,
    }
}
