//! The Small Reports - Branch sales reporting for The Small POS.
//!
//! Pulls raw order history for a branch from the admin document store,
//! normalizes the schema-ambiguous records into canonical orders, aggregates
//! them into sales metrics, and renders multi-sheet XLSX workbooks (sales
//! report plus the promotion/cancel report). The pipeline is a pure function
//! of (records, menu config, branch rates, date range); only the fetch
//! client in [`source`] touches the network.

pub mod aggregate;
pub mod config;
pub mod menu;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod report;
pub mod sheet;
pub mod source;
pub mod timestamp;

pub use aggregate::{aggregate_orders, AggregationResult};
pub use config::{BranchConfig, DateRange};
pub use menu::CategoryLookup;
pub use normalize::{normalize_record, normalize_records, SkipLog, SkipReason};
pub use order::{LineItem, Order, PaymentSplit};
pub use pipeline::{run_report, ReportBundle};
pub use report::{build_promotion_workbook, build_sales_workbook};
pub use sheet::{Cell, ReportError, SheetWriter};
pub use source::{SourceError, StoreClient};

/// Sentinel for order fields the source never provided.
pub(crate) const NOT_AVAILABLE: &str = "N/A";
/// Category assigned to items that are missing from the branch menu.
pub(crate) const UNCATEGORIZED: &str = "Uncategorized";

pub(crate) fn value_str(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

pub(crate) fn value_f64(v: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        if let Some(x) = v.get(*key) {
            if let Some(n) = x.as_f64() {
                return Some(n);
            }
            // Older cashier builds serialize amounts as strings.
            if let Some(n) = x.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
                return Some(n);
            }
        }
    }
    None
}

pub(crate) fn value_i64(v: &serde_json::Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        if let Some(n) = v.get(*key).and_then(|x| x.as_i64()) {
            return Some(n);
        }
    }
    None
}
