//! Report layout: aggregation output into workbook sheets.
//!
//! Two artifacts leave this module as in-memory XLSX bytes. The sales
//! workbook carries the summary, payment, category, item, and hourly tables
//! plus the waterfall transaction log; the promotion workbook carries the
//! fixed-column promotion and cancel extracts, each under a document header
//! block. All writing goes through [`SheetWriter`], so every layout in here
//! is plain row arithmetic over [`Cell`] values.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::aggregate::{AggregationResult, DiscountRow, ItemKey, ItemSales, VoidRow};
use crate::config::{BranchConfig, DateRange};
use crate::order::Order;
use crate::sheet::{Cell, ReportError, ReportWorkbook, SheetWriter, XlsxSheetWriter};

pub const SHEET_SUMMARY: &str = "Summary";
pub const SHEET_PAYMENTS: &str = "Payment Methods";
pub const SHEET_CATEGORY: &str = "Category Sales";
pub const SHEET_ITEMS: &str = "Item Sales";
pub const SHEET_HOURLY: &str = "Hourly Sales";
pub const SHEET_LOG: &str = "Transaction Log";
pub const SHEET_PROMOTION: &str = "Promotion Report";
pub const SHEET_CANCEL: &str = "Cancel Menu Detail Report";

/// Sentinel item cell for orders that reach the log without line items.
const NO_ITEMS: &str = "(no items)";

const LOG_COLUMNS: [&str; 12] = [
    "Order ID",
    "Date",
    "Time",
    "Order Type",
    "Table",
    "Cashier",
    "Payment Method",
    "Grand Total",
    "Item",
    "Qty",
    "Unit Price",
    "Line Total",
];

/// Order columns repeated per group; everything before the item columns.
const LOG_ORDER_COLUMNS: usize = 8;

const PROMOTION_COLUMNS: [&str; 24] = [
    "No",
    "Branch",
    "Bill Number",
    "Sales Date",
    "Day",
    "Sales Time",
    "Order Type",
    "Table",
    "Cashier",
    "Member",
    "Promotion Name",
    "Promotion Type",
    "Discount %",
    "Menu Detail",
    "Menu Count",
    "Total Qty",
    "Subtotal",
    "Service Charge",
    "Tax",
    "Discount Amount",
    "Grand Total",
    "Payment Method",
    "Payment Splits",
    "Status",
];

const CANCEL_COLUMNS: [&str; 17] = [
    "No",
    "Branch",
    "Bill Number",
    "Sales Date",
    "Sales Time",
    "Order Type",
    "Table",
    "Void By",
    "Category",
    "Menu Name",
    "Qty",
    "Unit Price",
    "Subtotal",
    "Service Charge",
    "Tax",
    "Total",
    "Void Reason",
];

// ---------------------------------------------------------------------------
// Document header
// ---------------------------------------------------------------------------

/// Header block above the promotion and cancel tables.
#[derive(Debug, Clone)]
pub struct DocumentHeader {
    pub report_number: String,
    pub generated_at: String,
    pub period: String,
    pub branch: String,
    pub filter: String,
}

impl DocumentHeader {
    pub fn new(config: &BranchConfig, range: DateRange, filter: &str) -> Self {
        Self {
            report_number: report_number(),
            generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            period: range.label(),
            branch: config.name.clone(),
            filter: filter.to_string(),
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Report No", self.report_number.clone()),
            ("Generated", self.generated_at.clone()),
            ("Period", self.period.clone()),
            ("Branch", self.branch.clone()),
            ("Filter", self.filter.clone()),
        ]
    }
}

/// Report document number: uppercase hex, no hyphens, 12 characters.
fn report_number() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .take(12)
        .collect()
}

// ---------------------------------------------------------------------------
// Workbook builders
// ---------------------------------------------------------------------------

/// Build the sales workbook: summary through transaction log, in sheet order.
pub fn build_sales_workbook(
    agg: &AggregationResult,
    orders: &[Order],
) -> Result<Vec<u8>, ReportError> {
    let mut workbook = ReportWorkbook::new();
    attach(&mut workbook, SHEET_SUMMARY, |w| write_summary(w, agg))?;
    attach(&mut workbook, SHEET_PAYMENTS, |w| write_payment_methods(w, agg))?;
    attach(&mut workbook, SHEET_CATEGORY, |w| write_category_sales(w, agg))?;
    attach(&mut workbook, SHEET_ITEMS, |w| write_item_sales(w, agg))?;
    attach(&mut workbook, SHEET_HOURLY, |w| write_hourly_sales(w, agg))?;
    attach(&mut workbook, SHEET_LOG, |w| write_transaction_log(w, orders))?;
    let bytes = workbook.into_bytes()?;
    debug!(
        payment_methods = agg.by_payment_method.len(),
        categories = agg.by_main_category.len(),
        item_groups = agg.by_item.len(),
        hours = agg.by_hour.len(),
        log_orders = orders.len(),
        bytes = bytes.len(),
        "Sales workbook assembled"
    );
    Ok(bytes)
}

/// Build the promotion/cancel workbook with its document header blocks.
pub fn build_promotion_workbook(
    agg: &AggregationResult,
    config: &BranchConfig,
    range: DateRange,
) -> Result<Vec<u8>, ReportError> {
    let mut workbook = ReportWorkbook::new();
    let header = DocumentHeader::new(config, range, "All promotions");
    attach(&mut workbook, SHEET_PROMOTION, |w| {
        write_promotion_report(w, &header, &agg.discounts)
    })?;
    let header = DocumentHeader::new(config, range, "All voided items");
    attach(&mut workbook, SHEET_CANCEL, |w| {
        write_cancel_report(w, &header, &agg.voids)
    })?;
    let bytes = workbook.into_bytes()?;
    debug!(
        promotion_rows = agg.discounts.len(),
        cancel_rows = agg.voids.len(),
        bytes = bytes.len(),
        "Promotion workbook assembled"
    );
    Ok(bytes)
}

fn attach<F>(workbook: &mut ReportWorkbook, name: &str, write: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut dyn SheetWriter) -> Result<(), ReportError>,
{
    let mut sheet = XlsxSheetWriter::new(name)?;
    write(&mut sheet)?;
    workbook.push(sheet);
    Ok(())
}

// ---------------------------------------------------------------------------
// Sales workbook sheets
// ---------------------------------------------------------------------------

fn write_summary(w: &mut dyn SheetWriter, agg: &AggregationResult) -> Result<(), ReportError> {
    w.header(&["Metric", "Value"])?;
    w.row(&[
        Cell::text("Total Orders"),
        Cell::Number(agg.total_orders as f64),
    ])?;
    w.row(&[Cell::text("Gross Sales"), Cell::Money(agg.gross_sales)])?;
    w.row(&[Cell::text("Net Sales"), Cell::Money(agg.net_sales)])?;
    w.row(&[Cell::text("Total Discounts"), Cell::Money(agg.discounts_total)])?;
    w.row(&[Cell::text("Service Charge"), Cell::Money(agg.service_total)])?;
    w.row(&[Cell::text("Tax"), Cell::Money(agg.tax_total)])?;
    w.row(&[
        Cell::text("Average Order Value"),
        Cell::Money(agg.average_order_value),
    ])?;
    w.column_widths(&[24.0, 18.0])
}

fn write_payment_methods(
    w: &mut dyn SheetWriter,
    agg: &AggregationResult,
) -> Result<(), ReportError> {
    w.header(&["Payment Method", "Amount", "Orders"])?;
    for (method, entry) in &agg.by_payment_method {
        w.row(&[
            Cell::text(method),
            Cell::Money(entry.amount),
            Cell::Number(entry.count as f64),
        ])?;
    }
    if !agg.by_payment_method.is_empty() {
        let amount: f64 = agg.by_payment_method.values().map(|e| e.amount).sum();
        let count: i64 = agg.by_payment_method.values().map(|e| e.count).sum();
        w.totals(&[
            Cell::text("Total"),
            Cell::Money(amount),
            Cell::Number(count as f64),
        ])?;
    }
    w.column_widths(&[24.0, 16.0, 10.0])
}

fn write_category_sales(
    w: &mut dyn SheetWriter,
    agg: &AggregationResult,
) -> Result<(), ReportError> {
    w.header(&["Main Category", "Sales Amount"])?;
    let mut rows: Vec<(&String, &f64)> = agg.by_main_category.iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(a.1));
    for (category, amount) in &rows {
        w.row(&[Cell::text(category.as_str()), Cell::Money(**amount)])?;
    }
    if !rows.is_empty() {
        let total: f64 = agg.by_main_category.values().sum();
        w.totals(&[Cell::text("Total"), Cell::Money(total)])?;
    }
    w.column_widths(&[28.0, 16.0])
}

fn write_item_sales(w: &mut dyn SheetWriter, agg: &AggregationResult) -> Result<(), ReportError> {
    w.header(&["Category", "Item", "Order Type", "Quantity", "Sales Amount"])?;
    let mut rows: Vec<(&ItemKey, &ItemSales)> = agg.by_item.iter().collect();
    // Category ascending, then amount descending inside the category.
    rows.sort_by(|(ka, sa), (kb, sb)| ka.0.cmp(&kb.0).then(sb.amount.total_cmp(&sa.amount)));
    for ((category, item, order_type), sales) in &rows {
        w.row(&[
            Cell::text(category.as_str()),
            Cell::text(item.as_str()),
            Cell::text(order_type.as_str()),
            Cell::Number(sales.quantity),
            Cell::Money(sales.amount),
        ])?;
    }
    if !rows.is_empty() {
        let quantity: f64 = agg.by_item.values().map(|s| s.quantity).sum();
        let amount: f64 = agg.by_item.values().map(|s| s.amount).sum();
        w.totals(&[
            Cell::text("Total"),
            Cell::Blank,
            Cell::Blank,
            Cell::Number(quantity),
            Cell::Money(amount),
        ])?;
    }
    w.column_widths(&[28.0, 28.0, 14.0, 10.0, 16.0])
}

fn write_hourly_sales(w: &mut dyn SheetWriter, agg: &AggregationResult) -> Result<(), ReportError> {
    w.header(&["Hour", "Sales Amount", "Orders"])?;
    for (hour, entry) in &agg.by_hour {
        w.row(&[
            Cell::text(format!("{hour:02}:00")),
            Cell::Money(entry.amount),
            Cell::Number(entry.count as f64),
        ])?;
    }
    w.column_widths(&[10.0, 16.0, 10.0])?;
    if !agg.by_hour.is_empty() {
        w.column_chart("Hourly Sales", 0, 1)?;
    }
    Ok(())
}

/// Waterfall transaction log: one row per line item, order columns only on
/// the first row of each group, continuation rows blank but bordered. Row
/// order follows the input order list; nothing here re-sorts.
fn write_transaction_log(w: &mut dyn SheetWriter, orders: &[Order]) -> Result<(), ReportError> {
    w.header(&LOG_COLUMNS)?;
    for order in orders {
        let lead = [
            Cell::text(&order.id),
            Cell::text(order.date().to_string()),
            Cell::text(order.timestamp.format("%H:%M:%S").to_string()),
            Cell::text(&order.order_type),
            Cell::opt_text(order.table.as_deref()),
            Cell::text(&order.cashier),
            Cell::text(order.payment_display()),
            Cell::Money(order.grand_total),
        ];
        if order.items.is_empty() {
            let mut cells = lead.to_vec();
            cells.push(Cell::text(NO_ITEMS));
            cells.extend([Cell::Blank, Cell::Blank, Cell::Blank]);
            w.row(&cells)?;
            continue;
        }
        for (index, item) in order.items.iter().enumerate() {
            let mut cells = if index == 0 {
                lead.to_vec()
            } else {
                vec![Cell::Blank; LOG_ORDER_COLUMNS]
            };
            cells.push(Cell::text(&item.name));
            cells.push(Cell::Number(item.quantity));
            cells.push(Cell::Money(item.unit_price));
            cells.push(Cell::Money(item.line_total()));
            w.row(&cells)?;
        }
    }
    w.column_widths(&[
        16.0, 12.0, 10.0, 12.0, 8.0, 12.0, 20.0, 14.0, 28.0, 6.0, 12.0, 14.0,
    ])
}

// ---------------------------------------------------------------------------
// Promotion / cancel sheets
// ---------------------------------------------------------------------------

fn write_promotion_report(
    w: &mut dyn SheetWriter,
    header: &DocumentHeader,
    rows: &[DiscountRow],
) -> Result<(), ReportError> {
    w.document_header(
        SHEET_PROMOTION,
        &header.fields(),
        PROMOTION_COLUMNS.len() as u16,
    )?;
    w.header(&PROMOTION_COLUMNS)?;
    for (index, row) in rows.iter().enumerate() {
        w.row(&[
            Cell::Number((index + 1) as f64),
            Cell::text(&header.branch),
            Cell::text(&row.order_id),
            Cell::text(row.timestamp.date().to_string()),
            Cell::text(row.timestamp.format("%A").to_string()),
            Cell::text(row.timestamp.format("%H:%M:%S").to_string()),
            Cell::text(&row.order_type),
            Cell::opt_text(row.table.as_deref()),
            Cell::text(&row.cashier),
            Cell::opt_text(row.member.as_deref()),
            Cell::text(&row.promotion_name),
            Cell::text(row.kind.label()),
            match row.percent {
                Some(percent) => Cell::Number(percent),
                None => Cell::Blank,
            },
            Cell::text(&row.item_detail),
            Cell::Number(row.item_count as f64),
            Cell::Number(row.quantity_total),
            Cell::Money(row.subtotal),
            Cell::Money(row.service_charge),
            Cell::Money(row.tax),
            Cell::Money(row.discount),
            Cell::Money(row.grand_total),
            Cell::text(&row.payment_display),
            Cell::Number(row.payment_splits as f64),
            Cell::text(&row.status),
        ])?;
    }
    w.column_widths(&[
        5.0, 16.0, 16.0, 12.0, 10.0, 10.0, 12.0, 8.0, 12.0, 14.0, 22.0, 12.0, 10.0, 36.0, 10.0,
        10.0, 14.0, 14.0, 12.0, 14.0, 14.0, 20.0, 8.0, 12.0,
    ])
}

fn write_cancel_report(
    w: &mut dyn SheetWriter,
    header: &DocumentHeader,
    rows: &[VoidRow],
) -> Result<(), ReportError> {
    w.document_header(SHEET_CANCEL, &header.fields(), CANCEL_COLUMNS.len() as u16)?;
    w.header(&CANCEL_COLUMNS)?;
    for (index, row) in rows.iter().enumerate() {
        w.row(&[
            Cell::Number((index + 1) as f64),
            Cell::text(&header.branch),
            Cell::text(&row.order_id),
            Cell::text(row.timestamp.date().to_string()),
            Cell::text(row.timestamp.format("%H:%M:%S").to_string()),
            Cell::text(&row.order_type),
            Cell::opt_text(row.table.as_deref()),
            Cell::text(&row.voided_by),
            Cell::text(&row.category),
            Cell::text(&row.item_name),
            Cell::Number(row.quantity),
            Cell::Money(row.unit_price),
            Cell::Money(row.subtotal),
            Cell::Money(row.service_charge),
            Cell::Money(row.tax),
            Cell::Money(row.total),
            Cell::text(row.reason.label()),
        ])?;
    }
    w.column_widths(&[
        5.0, 16.0, 16.0, 12.0, 10.0, 12.0, 8.0, 12.0, 18.0, 24.0, 8.0, 12.0, 14.0, 14.0, 12.0,
        14.0, 12.0,
    ])
}
