//! Sheet-writer seam between report layout and the XLSX library.
//!
//! Layout code in [`crate::report`] talks to the [`SheetWriter`] trait only:
//! document header, column header, data rows, totals, widths, chart. The one
//! real implementation, [`XlsxSheetWriter`], owns every `rust_xlsxwriter`
//! type, so the waterfall algorithm and the fixed-column layouts can be
//! tested against a recording writer without a spreadsheet library in sight.

use rust_xlsxwriter::{
    Chart, ChartType, Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};
use thiserror::Error;

const HEADER_FILL: Color = Color::RGB(0xD9E1F2);
const TOTALS_FILL: Color = Color::RGB(0xF2F2F2);
const MONEY_FORMAT: &str = "#,##0";

/// Workbook assembly failure. Layout code never fails on empty data; the
/// library surface is the only fallible part of report building.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("spreadsheet write failed: {0}")]
    Sheet(#[from] XlsxError),
}

/// One cell value, typed so the writer can pick the matching format.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Monetary amount, rendered thousands-separated.
    Money(f64),
    /// Plain number (quantities, counts, percentages).
    Number(f64),
    /// Empty but still bordered, used by waterfall continuation rows.
    Blank,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Text cell from an optional source field; `None` stays blank.
    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(v) => Cell::Text(v.to_string()),
            None => Cell::Blank,
        }
    }
}

/// Everything a report sheet needs from its sink.
pub trait SheetWriter {
    /// Merged title line plus label/value rows and a spacer, written above
    /// the table. `span` is the column width of the title merge.
    fn document_header(
        &mut self,
        title: &str,
        fields: &[(&str, String)],
        span: u16,
    ) -> Result<(), ReportError>;

    /// Bold column-header row; fixes the table width for totals and charts.
    fn header(&mut self, titles: &[&str]) -> Result<(), ReportError>;

    /// One data row.
    fn row(&mut self, cells: &[Cell]) -> Result<(), ReportError>;

    /// Emphasized totals row closing the table.
    fn totals(&mut self, cells: &[Cell]) -> Result<(), ReportError>;

    fn column_widths(&mut self, widths: &[f64]) -> Result<(), ReportError>;

    /// Column chart over the data rows written since the last header.
    /// A table without data rows keeps no chart.
    fn column_chart(
        &mut self,
        title: &str,
        category_col: u16,
        value_col: u16,
    ) -> Result<(), ReportError>;
}

// ---------------------------------------------------------------------------
// XLSX implementation
// ---------------------------------------------------------------------------

struct Styles {
    title: Format,
    label: Format,
    header: Format,
    text: Format,
    money: Format,
    number: Format,
    total_text: Format,
    total_money: Format,
    total_number: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(14.0),
            label: Format::new().set_bold(),
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(HEADER_FILL)
                .set_border(FormatBorder::Thin),
            text: Format::new().set_border(FormatBorder::Thin),
            money: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format(MONEY_FORMAT),
            number: Format::new().set_border(FormatBorder::Thin),
            total_text: Format::new()
                .set_bold()
                .set_background_color(TOTALS_FILL)
                .set_border(FormatBorder::Thin),
            total_money: Format::new()
                .set_bold()
                .set_background_color(TOTALS_FILL)
                .set_border(FormatBorder::Thin)
                .set_num_format(MONEY_FORMAT),
            total_number: Format::new()
                .set_bold()
                .set_background_color(TOTALS_FILL)
                .set_border(FormatBorder::Thin),
        }
    }
}

fn write_cells(
    worksheet: &mut Worksheet,
    row: u32,
    cells: &[Cell],
    text: &Format,
    money: &Format,
    number: &Format,
) -> Result<(), XlsxError> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        match cell {
            Cell::Text(v) => worksheet.write_string_with_format(row, col, v.as_str(), text)?,
            Cell::Money(v) => worksheet.write_number_with_format(row, col, *v, money)?,
            Cell::Number(v) => worksheet.write_number_with_format(row, col, *v, number)?,
            Cell::Blank => worksheet.write_blank(row, col, text)?,
        };
    }
    Ok(())
}

/// [`SheetWriter`] backed by one `rust_xlsxwriter` worksheet.
pub struct XlsxSheetWriter {
    worksheet: Worksheet,
    styles: Styles,
    name: String,
    next_row: u32,
    first_data_row: u32,
}

impl XlsxSheetWriter {
    pub fn new(name: &str) -> Result<Self, ReportError> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(name)?;
        Ok(Self {
            worksheet,
            styles: Styles::new(),
            name: name.to_string(),
            next_row: 0,
            first_data_row: 0,
        })
    }
}

impl SheetWriter for XlsxSheetWriter {
    fn document_header(
        &mut self,
        title: &str,
        fields: &[(&str, String)],
        span: u16,
    ) -> Result<(), ReportError> {
        if span > 1 {
            self.worksheet.merge_range(
                self.next_row,
                0,
                self.next_row,
                span - 1,
                title,
                &self.styles.title,
            )?;
        } else {
            self.worksheet
                .write_string_with_format(self.next_row, 0, title, &self.styles.title)?;
        }
        self.next_row += 1;
        for (label, value) in fields {
            self.worksheet
                .write_string_with_format(self.next_row, 0, *label, &self.styles.label)?;
            self.worksheet.write_string(self.next_row, 1, value.as_str())?;
            self.next_row += 1;
        }
        // Spacer between the header block and the table.
        self.next_row += 1;
        Ok(())
    }

    fn header(&mut self, titles: &[&str]) -> Result<(), ReportError> {
        for (col, title) in titles.iter().enumerate() {
            self.worksheet.write_string_with_format(
                self.next_row,
                col as u16,
                *title,
                &self.styles.header,
            )?;
        }
        self.next_row += 1;
        self.first_data_row = self.next_row;
        Ok(())
    }

    fn row(&mut self, cells: &[Cell]) -> Result<(), ReportError> {
        write_cells(
            &mut self.worksheet,
            self.next_row,
            cells,
            &self.styles.text,
            &self.styles.money,
            &self.styles.number,
        )?;
        self.next_row += 1;
        Ok(())
    }

    fn totals(&mut self, cells: &[Cell]) -> Result<(), ReportError> {
        write_cells(
            &mut self.worksheet,
            self.next_row,
            cells,
            &self.styles.total_text,
            &self.styles.total_money,
            &self.styles.total_number,
        )?;
        self.next_row += 1;
        Ok(())
    }

    fn column_widths(&mut self, widths: &[f64]) -> Result<(), ReportError> {
        for (col, width) in widths.iter().enumerate() {
            self.worksheet.set_column_width(col as u16, *width)?;
        }
        Ok(())
    }

    fn column_chart(
        &mut self,
        title: &str,
        category_col: u16,
        value_col: u16,
    ) -> Result<(), ReportError> {
        if self.next_row <= self.first_data_row {
            return Ok(());
        }
        let last_row = self.next_row - 1;
        let mut chart = Chart::new(ChartType::Column);
        chart
            .add_series()
            .set_name(title)
            .set_categories((
                self.name.as_str(),
                self.first_data_row,
                category_col,
                last_row,
                category_col,
            ))
            .set_values((
                self.name.as_str(),
                self.first_data_row,
                value_col,
                last_row,
                value_col,
            ));
        chart.title().set_name(title);
        chart.legend().set_hidden();
        // Anchor the chart clear of the table, one row below the header.
        self.worksheet
            .insert_chart(self.first_data_row, value_col + 3, &chart)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Workbook assembly
// ---------------------------------------------------------------------------

/// Workbook under assembly; sheets appear in the order they are pushed.
pub struct ReportWorkbook {
    workbook: Workbook,
}

impl ReportWorkbook {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
        }
    }

    pub fn push(&mut self, sheet: XlsxSheetWriter) {
        self.workbook.push_worksheet(sheet.worksheet);
    }

    /// Serialize into the final in-memory artifact.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, ReportError> {
        Ok(self.workbook.save_to_buffer()?)
    }
}

impl Default for ReportWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opt_text_blanks_missing_fields() {
        assert_eq!(Cell::opt_text(Some("12")), Cell::Text("12".into()));
        assert_eq!(Cell::opt_text(None), Cell::Blank);
    }

    #[test]
    fn workbook_with_every_feature_serializes_to_xlsx() {
        let mut sheet = XlsxSheetWriter::new("Hourly Sales").unwrap();
        sheet
            .document_header("Hourly Sales", &[("Branch", "COLEGA PIK".to_string())], 3)
            .unwrap();
        sheet.header(&["Hour", "Sales Amount", "Orders"]).unwrap();
        sheet
            .row(&[Cell::text("12:00"), Cell::Money(15_000.0), Cell::Number(2.0)])
            .unwrap();
        sheet
            .row(&[Cell::text("19:00"), Cell::Money(7_000.0), Cell::Number(1.0)])
            .unwrap();
        sheet
            .totals(&[Cell::text("Total"), Cell::Money(22_000.0), Cell::Number(3.0)])
            .unwrap();
        sheet.column_widths(&[10.0, 16.0, 10.0]).unwrap();
        sheet.column_chart("Hourly Sales", 0, 1).unwrap();

        let mut workbook = ReportWorkbook::new();
        workbook.push(sheet);
        let bytes = workbook.into_bytes().unwrap();
        // XLSX is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn chart_on_a_header_only_sheet_is_skipped() {
        let mut sheet = XlsxSheetWriter::new("Hourly Sales").unwrap();
        sheet.header(&["Hour", "Sales Amount"]).unwrap();
        sheet.column_chart("Hourly Sales", 0, 1).unwrap();

        let mut workbook = ReportWorkbook::new();
        workbook.push(sheet);
        assert!(workbook.into_bytes().is_ok());
    }

    #[test]
    fn blank_cells_keep_the_row_bordered() {
        // Waterfall continuation rows are all-blank in the order columns;
        // the write must not error on them.
        let mut sheet = XlsxSheetWriter::new("Transaction Log").unwrap();
        sheet.header(&["Order ID", "Item"]).unwrap();
        sheet.row(&[Cell::text("ORD-1"), Cell::text("SOUP")]).unwrap();
        sheet.row(&[Cell::Blank, Cell::text("TEA")]).unwrap();

        let mut workbook = ReportWorkbook::new();
        workbook.push(sheet);
        assert!(workbook.into_bytes().is_ok());
    }

    #[test]
    fn invalid_sheet_names_are_rejected() {
        assert!(XlsxSheetWriter::new("").is_err());
        // Excel limits sheet names to 31 characters.
        assert!(XlsxSheetWriter::new(&"X".repeat(32)).is_err());
    }
}
