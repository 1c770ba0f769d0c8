//! Report export: fills the "Eigenbemühungen" xlsx template, one workbook per
//! page of six applications.
//!
//! Template layout: period in E4, customer number in F4, name labels in E1/F1,
//! agreed count in B2. Entries start at row 7 and take three rows each.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::models::record::{CanonicalRecord, DATE_FORMAT};
use crate::reconcile::normalize::clean;

pub const ENTRIES_PER_PAGE: usize = 6;
pub const SHEET_NAME: &str = "Eigenbemühungen";
const FIRST_ENTRY_ROW: usize = 7;
const ROWS_PER_ENTRY: usize = 3;
const APPLICATION_CHANNEL: &str = "Online-Bewerbung";

/// Header fields written on every page.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub agreed_count: Option<u32>,
    pub customer_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Employer name followed by its address, either part optional.
fn employer_line(record: &CanonicalRecord) -> String {
    let name = clean(record.employer_name.as_deref());
    let address = clean(record.postal_address.as_deref());
    match (name, address) {
        (Some(name), Some(address)) => format!("{name}, {address}"),
        (Some(name), None) => name,
        (None, Some(address)) => address,
        (None, None) => String::new(),
    }
}

/// First sheet row of a slot on the page.
fn slot_row(slot: usize) -> usize {
    FIRST_ENTRY_ROW + slot * ROWS_PER_ENTRY
}

/// Appends `value` to a label cell, but only while the cell still holds the
/// bare template label.
fn fill_label(sheet: &mut Worksheet, coordinate: &str, label: &str, value: Option<&str>) {
    let Some(value) = value else {
        return;
    };
    let current = sheet
        .get_cell(coordinate)
        .map(|c| c.get_value().trim().to_string())
        .unwrap_or_default();
    if current == label {
        sheet
            .get_cell_mut(coordinate)
            .set_value(format!("{label} {value}"));
    }
}

/// Writes the header and one page of entries into the template sheet.
/// `first_number` is the running number of the page's first slot.
pub fn fill_page(
    sheet: &mut Worksheet,
    header: &ReportHeader,
    entries: &[CanonicalRecord],
    first_number: usize,
) {
    sheet.get_cell_mut("E4").set_value(format!(
        "{} - {}",
        header.period_start.format(DATE_FORMAT),
        header.period_end.format(DATE_FORMAT)
    ));
    if let Some(customer_number) = &header.customer_number {
        sheet.get_cell_mut("F4").set_value(customer_number.as_str());
    }
    fill_label(sheet, "E1", "Name:", header.last_name.as_deref());
    fill_label(sheet, "F1", "Vorname:", header.first_name.as_deref());
    if let Some(count) = header.agreed_count {
        sheet.get_cell_mut("B2").set_value_number(count);
    }

    // Slot numbers are printed even for empty slots.
    for slot in 0..ENTRIES_PER_PAGE {
        sheet
            .get_cell_mut(format!("A{}", slot_row(slot)).as_str())
            .set_value_number((first_number + slot) as f64);
    }

    for (slot, entry) in entries.iter().take(ENTRIES_PER_PAGE).enumerate() {
        let row = slot_row(slot);
        sheet
            .get_cell_mut(format!("B{row}").as_str())
            .set_value(employer_line(entry));
        if let Some(contact) = &entry.contact_person {
            sheet
                .get_cell_mut(format!("C{row}").as_str())
                .set_value(contact.as_str());
        }
        sheet.get_cell_mut(format!("D{row}").as_str()).set_value(format!(
            "am: {}",
            entry.first_contact_date.as_deref().unwrap_or("")
        ));
        sheet
            .get_cell_mut(format!("D{}", row + 1).as_str())
            .set_value(format!("wie: {APPLICATION_CHANNEL}"));
        sheet.get_cell_mut(format!("D{}", row + 2).as_str()).set_value(format!(
            "als: {}",
            entry.applied_position.as_deref().unwrap_or("")
        ));
        if let Some(result) = entry.result {
            sheet
                .get_cell_mut(format!("F{row}").as_str())
                .set_value(result.label());
        }
    }
}

fn load_template(template: &Path) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(template)
        .map_err(|e| anyhow!("Failed to read report template {}: {e}", template.display()))
}

/// Writes one workbook per page into `out_dir` and returns their paths.
/// Every page starts from a fresh copy of the template. No records, no files.
pub fn write_report_pages(
    template: &Path,
    out_dir: &Path,
    records: &[CanonicalRecord],
    header: &ReportHeader,
    generated_at: NaiveDateTime,
) -> Result<Vec<PathBuf>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create report directory {}", out_dir.display()))?;

    let stamp = generated_at.format("%d%m%Y_%H%M%S");
    let mut written = Vec::new();

    for (index, chunk) in records.chunks(ENTRIES_PER_PAGE).enumerate() {
        let mut book = load_template(template)?;
        let sheet = book.get_sheet_by_name_mut(SHEET_NAME).with_context(|| {
            format!(
                "Report template {} has no sheet '{SHEET_NAME}'",
                template.display()
            )
        })?;
        fill_page(sheet, header, chunk, index * ENTRIES_PER_PAGE + 1);

        let path = out_dir.join(format!("table_filled_{stamp}_{:02}.xlsx", index + 1));
        umya_spreadsheet::writer::xlsx::write(&book, &path)
            .map_err(|e| anyhow!("Failed to write report page {}: {e}", path.display()))?;
        info!("Wrote report page {}", path.display());
        written.push(path);
    }

    Ok(written)
}
