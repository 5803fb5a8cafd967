//! Report pipeline: raw snapshot in, finished artifacts out.
//!
//! The pipeline is a pure synchronous function over an owned snapshot; the
//! async fetch client of [`crate::source`] stays at the boundary. Malformed
//! records are skipped and counted, never fatal, so an empty or garbage
//! snapshot still yields valid (header-only) workbooks.

use serde_json::Value;
use tracing::{info, warn};

use crate::aggregate::{aggregate_orders, AggregationResult};
use crate::config::{BranchConfig, DateRange};
use crate::menu::CategoryLookup;
use crate::normalize::{normalize_records, SkipLog};
use crate::order::Order;
use crate::report::{build_promotion_workbook, build_sales_workbook};
use crate::sheet::ReportError;

/// Everything one report request produces.
pub struct ReportBundle {
    /// Orders in range, in input order; the transaction log follows this.
    pub orders: Vec<Order>,
    pub aggregation: AggregationResult,
    /// Skip counters for records the normalizer rejected.
    pub skips: SkipLog,
    /// Sales workbook: summary through transaction log.
    pub sales_workbook: Vec<u8>,
    /// Promotion / cancel workbook.
    pub promotion_workbook: Vec<u8>,
}

/// Run one report request over a raw order snapshot.
pub fn run_report(
    records: &[Value],
    menu: &Value,
    config: &BranchConfig,
    range: DateRange,
) -> Result<ReportBundle, ReportError> {
    if records.is_empty() {
        warn!(branch = %config.name, "Order snapshot is empty");
    }

    let (orders, skips) = normalize_records(records);
    if !skips.is_empty() {
        warn!(
            total = skips.total,
            not_an_object = skips.not_an_object,
            bad_timestamp = skips.bad_timestamp,
            malformed_numeric = skips.malformed_numeric,
            malformed_items = skips.malformed_items,
            "Skipped unusable order records"
        );
    }

    let normalized = orders.len();
    let orders: Vec<Order> = orders
        .into_iter()
        .filter(|order| range.contains(order.date()))
        .collect();

    let lookup = CategoryLookup::from_menu(menu);
    let aggregation = aggregate_orders(&orders, &lookup, config);

    let sales_workbook = build_sales_workbook(&aggregation, &orders)?;
    let promotion_workbook = build_promotion_workbook(&aggregation, config, range)?;

    info!(
        branch = %config.name,
        period = %range.label(),
        records = records.len(),
        normalized,
        in_range = orders.len(),
        skipped = skips.total,
        menu_items = lookup.item_count(),
        "Report generated"
    );

    Ok(ReportBundle {
        orders,
        aggregation,
        skips,
        sales_workbook,
        promotion_workbook,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn menu() -> Value {
        json!({
            "SOUP (APPETIZER)": { "SOUP": { "price": 50_000 } },
            "COFFEE (BEVERAGE)": { "LATTE": { "price": 25_000 } }
        })
    }

    fn config() -> BranchConfig {
        BranchConfig::new("COLEGA PIK")
    }

    #[test]
    fn three_order_scenario_end_to_end() {
        let records = vec![
            json!({
                "order_id": "A",
                "timestamp": "2024-01-01 12:00:00",
                "order_type": "Dine In",
                "cashier": "sari",
                "payment_method": "Cash",
                "subtotal": 100_000.0,
                "service": 5_000.0,
                "tax": 10_500.0,
                "total_final": 115_500.0,
                "items_in_payment": [
                    { "name": "SOUP", "quantity": 2, "price": 50_000.0 }
                ]
            }),
            json!({
                "order_id": "B",
                "timestamp": "2024-01-01 13:30:00",
                "order_type": "Dine In",
                "cashier": "sari",
                "payment_method": "QRIS",
                "subtotal": 50_000.0,
                "service": 2_500.0,
                "tax": 5_250.0,
                "total_final": 57_750.0,
                "items_in_payment": [
                    { "name": "LATTE", "quantity": 2, "price": 25_000.0 }
                ]
            }),
            json!({
                "order_id": "C",
                "timestamp": "2024-01-01 19:00:00",
                "subtotal": 0.0,
                "total_final": 20_000.0
            }),
        ];

        let bundle = run_report(
            &records,
            &menu(),
            &config(),
            DateRange::single_day(date(2024, 1, 1)),
        )
        .unwrap();

        assert_eq!(bundle.aggregation.total_orders, 3);
        assert_eq!(bundle.aggregation.gross_sales, 150_000.0);
        assert_eq!(bundle.aggregation.net_sales, 193_250.0);
        assert!((bundle.aggregation.average_order_value - 64_416.666_666).abs() < 0.001);
        assert!(bundle.skips.is_empty());
        assert_eq!(&bundle.sales_workbook[..2], b"PK");
        assert_eq!(&bundle.promotion_workbook[..2], b"PK");
        // Zero-item order C still reaches the log through the order list.
        assert_eq!(bundle.orders.len(), 3);
        assert!(bundle.orders[2].items.is_empty());
    }

    #[test]
    fn orders_outside_the_range_are_excluded() {
        let records = vec![
            json!({
                "order_id": "IN",
                "timestamp": "2024-01-01 12:00:00",
                "total_final": 10_000.0
            }),
            json!({
                "order_id": "OUT",
                "timestamp": "2024-01-02 12:00:00",
                "total_final": 99_000.0
            }),
        ];

        let bundle = run_report(
            &records,
            &Value::Null,
            &config(),
            DateRange::single_day(date(2024, 1, 1)),
        )
        .unwrap();

        assert_eq!(bundle.aggregation.total_orders, 1);
        assert_eq!(bundle.aggregation.net_sales, 10_000.0);
        assert_eq!(bundle.orders.len(), 1);
        assert_eq!(bundle.orders[0].id, "IN");
        assert!(bundle.skips.is_empty(), "out-of-range is not a skip");
    }

    #[test]
    fn unusable_records_are_counted_not_fatal() {
        let records = vec![
            json!("not an object"),
            json!({ "order_id": "X", "timestamp": "soon", "total_final": 1.0 }),
            json!({
                "order_id": "OK",
                "timestamp": "2024-01-01 10:00:00",
                "total_final": 5_000.0
            }),
        ];

        let bundle = run_report(
            &records,
            &Value::Null,
            &config(),
            DateRange::single_day(date(2024, 1, 1)),
        )
        .unwrap();

        assert_eq!(bundle.skips.total, 2);
        assert_eq!(bundle.skips.not_an_object, 1);
        assert_eq!(bundle.skips.bad_timestamp, 1);
        assert_eq!(bundle.aggregation.total_orders, 1);
    }

    #[test]
    fn empty_snapshot_still_produces_valid_workbooks() {
        let bundle = run_report(
            &[],
            &Value::Null,
            &config(),
            DateRange::single_day(date(2024, 1, 1)),
        )
        .unwrap();

        assert_eq!(bundle.aggregation.total_orders, 0);
        assert!(bundle.orders.is_empty());
        assert_eq!(&bundle.sales_workbook[..2], b"PK");
        assert_eq!(&bundle.promotion_workbook[..2], b"PK");
    }

    #[test]
    fn discounts_and_voids_flow_into_the_extracts() {
        let records = vec![
            json!({
                "order_id": "PROMO",
                "timestamp": "2024-01-01 12:00:00",
                "cashier": "sari",
                "subtotal": 100_000.0,
                "discount_amount": 10_000.0,
                "discount_name": "10 % Member",
                "total_final": 105_500.0,
                "items_in_payment": [
                    { "name": "SOUP", "quantity": 1, "price": 100_000.0 }
                ]
            }),
            json!({
                "order_id": "VOIDED",
                "timestamp": "2024-01-01 13:00:00",
                "status": "void",
                "void_by": "budi",
                "subtotal": 0.0,
                "total_final": 0.0,
                "items": [
                    { "name": "LATTE", "quantity": 1, "price": 25_000.0 }
                ]
            }),
        ];

        let bundle = run_report(
            &records,
            &menu(),
            &config(),
            DateRange::single_day(date(2024, 1, 1)),
        )
        .unwrap();

        assert_eq!(bundle.aggregation.discounts.len(), 1);
        assert_eq!(bundle.aggregation.discounts[0].promotion_name, "10 % Member");
        assert_eq!(bundle.aggregation.voids.len(), 1);
        assert_eq!(bundle.aggregation.voids[0].item_name, "LATTE");
        assert_eq!(bundle.aggregation.voids[0].voided_by, "budi");
    }
}
