//! Branch configuration and report request parameters.
//!
//! Rates are decimal fractions supplied per branch by the admin side; the
//! defaults below only apply when a branch carries no override. Nothing in
//! the pipeline hardcodes rates beyond these documented defaults.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default service-charge fraction for branches without an override.
pub const DEFAULT_SERVICE_RATE: f64 = 0.05;
/// Default tax (PB1) fraction for branches without an override.
pub const DEFAULT_TAX_RATE: f64 = 0.10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Display name used in report headers.
    pub name: String,
    pub service_rate: f64,
    pub tax_rate: f64,
}

impl BranchConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            service_rate: DEFAULT_SERVICE_RATE,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }

    pub fn with_rates(name: &str, service_rate: f64, tax_rate: f64) -> Self {
        Self {
            name: name.to_string(),
            service_rate,
            tax_rate,
        }
    }
}

/// Inclusive calendar date range for a report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Single-day range, the most common request shape.
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Period string used in report document headers.
    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{} - {}", self.start, self.end)
        }
    }
}
