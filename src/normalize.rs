//! Record normalizer: raw document-store records into canonical orders.
//!
//! Order history comes from several generations of the cashier app, each
//! with its own field names and nesting. Every attribute is resolved through
//! an explicit key-priority list, and the raw `serde_json::Value` never
//! leaves this module. A record either becomes a fully populated [`Order`]
//! or a [`SkipReason`]; skips are counted in [`SkipLog`] so dropped records
//! stay visible instead of silently vanishing from the report.
//!
//! Absent and null fields take their documented defaults. A field that is
//! present with a non-numeric type where a number is required rejects the
//! whole record, so a half-computed total is never aggregated.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::order::{LineItem, Order, PaymentSplit};
use crate::timestamp::parse_timestamp;
use crate::{value_f64, value_i64, value_str, NOT_AVAILABLE};

const FALLBACK_ITEM_NAME: &str = "Item";

const ID_KEYS: &[&str] = &["order_id", "id", "unique_code"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "order_time", "created_at"];
const ITEM_CONTAINER_KEYS: &[&str] = &["items_in_payment", "items"];
const VOID_CONTAINER_KEYS: &[&str] = &["void_items", "voided_items"];

/// Why one raw record was excluded from the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing or unparseable timestamp")]
    BadTimestamp,
    #[error("non-numeric {field} field")]
    MalformedNumeric { field: &'static str },
    #[error("items field is neither a list nor a map")]
    MalformedItems,
}

/// Skip counters returned alongside the normalized orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkipLog {
    pub total: usize,
    pub not_an_object: usize,
    pub bad_timestamp: usize,
    pub malformed_numeric: usize,
    pub malformed_items: usize,
}

impl SkipLog {
    pub fn record(&mut self, reason: &SkipReason) {
        self.total += 1;
        match reason {
            SkipReason::NotAnObject => self.not_an_object += 1,
            SkipReason::BadTimestamp => self.bad_timestamp += 1,
            SkipReason::MalformedNumeric { .. } => self.malformed_numeric += 1,
            SkipReason::MalformedItems => self.malformed_items += 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Normalize a whole snapshot, collecting skip counts as it goes.
pub fn normalize_records(records: &[Value]) -> (Vec<Order>, SkipLog) {
    let mut orders = Vec::with_capacity(records.len());
    let mut skips = SkipLog::default();
    for record in records {
        match normalize_record(record) {
            Ok(order) => orders.push(order),
            Err(reason) => {
                warn!(
                    order_id = %value_str(record, ID_KEYS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    reason = %reason,
                    "Skipping unusable order record"
                );
                skips.record(&reason);
            }
        }
    }
    (orders, skips)
}

/// Normalize one raw record into a canonical order.
pub fn normalize_record(record: &Value) -> Result<Order, SkipReason> {
    if !record.is_object() {
        return Err(SkipReason::NotAnObject);
    }

    let raw_timestamp = value_str(record, TIMESTAMP_KEYS).ok_or(SkipReason::BadTimestamp)?;
    let timestamp = parse_timestamp(&raw_timestamp).ok_or(SkipReason::BadTimestamp)?;

    let grand_total = numeric_field(record, &["total_final", "total"], "total")?
        .unwrap_or(0.0)
        .max(0.0);
    let subtotal = numeric_field(record, &["subtotal"], "subtotal")?
        .unwrap_or(grand_total)
        .max(0.0);
    let service_charge = numeric_field(record, &["service", "service_charge"], "service")?
        .unwrap_or(0.0)
        .max(0.0);
    let tax = numeric_field(record, &["tax", "pb1"], "tax")?.unwrap_or(0.0).max(0.0);
    let discount = numeric_field(record, &["discount_amount", "total_discount"], "discount")?
        .unwrap_or(0.0)
        .max(0.0);

    let void_items = normalize_items(container_value(record, VOID_CONTAINER_KEYS), None)?
        .into_iter()
        .map(|mut item| {
            item.voided = true;
            item
        })
        .collect::<Vec<_>>();
    let void_names: HashSet<&str> = void_items.iter().map(|i| i.name.as_str()).collect();
    let items = normalize_items(container_value(record, ITEM_CONTAINER_KEYS), Some(&void_names))?;

    Ok(Order {
        id: string_field(record, ID_KEYS).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        timestamp,
        order_type: value_str(record, &["order_type", "type"])
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        table: string_field(record, &["table", "table_number"]),
        cashier: value_str(record, &["void_by", "cashier", "user"])
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        member: value_str(record, &["member", "member_name", "customer"]),
        payments: normalize_payments(record),
        subtotal,
        service_charge,
        tax,
        discount,
        grand_total,
        discount_name: value_str(record, &["discount_name", "discount"]),
        status: value_str(record, &["status"]).unwrap_or_default(),
        items,
        void_items,
    })
}

/// True for the status strings the cashier app uses to mark voided or
/// cancelled orders and items, across all spellings seen in the wild.
pub(crate) fn is_voidish(status: &str) -> bool {
    let status = status.to_ascii_lowercase();
    status.contains("void") || status.contains("cancel")
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// String read that also accepts integer values (numeric ids and table
/// numbers appear in older exports).
fn string_field(record: &Value, keys: &[&str]) -> Option<String> {
    value_str(record, keys).or_else(|| value_i64(record, keys).map(|n| n.to_string()))
}

/// Numeric read that distinguishes "absent" from "present but malformed".
/// Absent, null, and blank-string values fall through to the next key;
/// a value of the wrong type rejects the record.
fn numeric_field(
    record: &Value,
    keys: &[&str],
    field: &'static str,
) -> Result<Option<f64>, SkipReason> {
    for key in keys {
        let raw = match record.get(*key) {
            Some(v) => v,
            None => continue,
        };
        match raw {
            Value::Null => continue,
            Value::Number(n) => match n.as_f64() {
                Some(v) => return Ok(Some(v)),
                None => return Err(SkipReason::MalformedNumeric { field }),
            },
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    continue;
                }
                return match trimmed.parse::<f64>() {
                    Ok(v) => Ok(Some(v)),
                    Err(_) => Err(SkipReason::MalformedNumeric { field }),
                };
            }
            _ => return Err(SkipReason::MalformedNumeric { field }),
        }
    }
    Ok(None)
}

/// First present item container wins, empty or not; later keys are
/// consulted only when the key is absent entirely. A present `[]` resolves
/// to zero items rather than adopting a sibling container, and a present
/// null counts as an empty container.
fn container_value<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(v) = record.get(*key) {
            if v.is_null() {
                return None;
            }
            return Some(v);
        }
    }
    None
}

/// Items arrive either as a list or as a map of id to item. Map iteration
/// order is whatever the source map yields; callers must not read meaning
/// into it.
fn normalize_items(
    container: Option<&Value>,
    void_names: Option<&HashSet<&str>>,
) -> Result<Vec<LineItem>, SkipReason> {
    let container = match container {
        Some(v) => v,
        None => return Ok(Vec::new()),
    };
    match container {
        Value::Array(list) => list
            .iter()
            .map(|raw| normalize_item(raw, void_names))
            .collect(),
        Value::Object(map) => map
            .values()
            .map(|raw| normalize_item(raw, void_names))
            .collect(),
        _ => Err(SkipReason::MalformedItems),
    }
}

fn normalize_item(
    raw: &Value,
    void_names: Option<&HashSet<&str>>,
) -> Result<LineItem, SkipReason> {
    if !raw.is_object() {
        return Err(SkipReason::MalformedItems);
    }
    let name = value_str(raw, &["name", "item_name"])
        .unwrap_or_else(|| FALLBACK_ITEM_NAME.to_string());
    let quantity = numeric_field(raw, &["quantity", "qty"], "quantity")?
        .unwrap_or(1.0)
        .max(0.0);
    let unit_price = numeric_field(raw, &["price", "unit_price"], "price")?
        .unwrap_or(0.0)
        .max(0.0);
    let status = value_str(raw, &["status"]).unwrap_or_default();
    let listed_as_void = void_names
        .map(|names| names.contains(name.as_str()))
        .unwrap_or(false);
    let voided = is_voidish(&status) || listed_as_void;
    Ok(LineItem {
        name,
        quantity,
        unit_price,
        status,
        voided,
    })
}

fn normalize_payments(record: &Value) -> Vec<PaymentSplit> {
    if let Some(list) = record.get("payments").and_then(|v| v.as_array()) {
        let mut splits = Vec::new();
        for entry in list {
            let method = match value_str(entry, &["method", "payment_method", "name"]) {
                Some(m) => m,
                None => continue,
            };
            splits.push(PaymentSplit {
                method,
                amount: value_f64(entry, &["amount", "total"]),
            });
        }
        if !splits.is_empty() {
            return splits;
        }
    }
    match value_str(record, &["payment_method", "payment"]) {
        Some(method) => vec![PaymentSplit {
            method,
            amount: None,
        }],
        None => Vec::new(),
    }
}
