use std::path::{Path, PathBuf};

use reembolso_core::{DayMonthFormatter, ExpenseRecord, PayeeProfile};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use umya_spreadsheet::{Spreadsheet, Worksheet};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Workbook error: {0}")]
    Xlsx(String),
    #[error("Sheet '{0}' not found in workbook")]
    MissingSheet(String),
}

/// Where things live on the reimbursement template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub sheet_name: String,
    pub first_data_row: u32,
    /// Used only when `totals_label` cannot be found in column B.
    pub totals_row: u32,
    pub totals_label: String,
    pub origin: String,
    pub destination: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet_name: "Plan2".to_string(),
            first_data_row: 10,
            totals_row: 46,
            totals_label: "TOTAL A RECEBER".to_string(),
            origin: "São Jose dos Campos".to_string(),
            destination: "São Paulo".to_string(),
        }
    }
}

/// The filled-in copy of the reimbursement template.
///
/// Every call loads the file, edits it and saves it back.
pub struct ReimbursementWorkbook {
    destination: PathBuf,
    layout: SheetLayout,
}

impl ReimbursementWorkbook {
    /// Copies `template` to `destination` the first time.
    pub fn open(template: &Path, destination: &Path, layout: SheetLayout) -> Result<Self, SheetError> {
        if !destination.exists() {
            if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(template, destination)?;
            info!(template = %template.display(), destination = %destination.display(), "workbook created from template");
        }
        Ok(Self { destination: destination.to_path_buf(), layout })
    }

    pub fn path(&self) -> &Path {
        &self.destination
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Header block: name, CPF/CNPJ, bank, branch/account and PIX in H3..H7,
    /// period start and end in F4/F5.
    pub fn write_payee(&self, payee: &PayeeProfile) -> Result<(), SheetError> {
        let mut book = self.load()?;
        let sheet = self.sheet_mut(&mut book)?;

        sheet.get_cell_mut("H3").set_value(payee.name.as_str());
        sheet.get_cell_mut("H4").set_value(payee.tax_id.as_str());
        sheet.get_cell_mut("H5").set_value(payee.bank.as_str());
        sheet.get_cell_mut("H6").set_value(payee.branch_account.as_str());
        sheet.get_cell_mut("H7").set_value(payee.pix_key.as_str());
        sheet.get_cell_mut("F4").set_value(payee.period.start.format("%d/%m/%Y").to_string());
        sheet.get_cell_mut("F5").set_value(payee.period.end.format("%d/%m/%Y").to_string());

        self.save(&book)?;
        info!(payee = %payee.name, "payee details saved");
        Ok(())
    }

    /// Append one row per record below the last filled row, inserting rows
    /// above the totals when the free space runs out. Returns rows written.
    pub fn append_expenses(
        &self,
        records: &[ExpenseRecord],
        dates: &DayMonthFormatter,
    ) -> Result<usize, SheetError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut book = self.load()?;
        let layout = &self.layout;
        let sheet = self.sheet_mut(&mut book)?;

        let totals_row = find_totals_row(sheet, layout);
        let mut row = first_free_row(sheet, layout.first_data_row, totals_row);

        let needed = records.len() as u32;
        let available = totals_row.saturating_sub(row);
        if needed > available {
            let missing = needed - available;
            sheet.insert_new_row(&totals_row, &missing);
            info!(at = totals_row, rows = missing, "rows inserted above totals");
        }

        for record in records {
            sheet.get_cell_mut(format!("B{row}").as_str()).set_value(dates.format(&record.date));
            sheet.get_cell_mut(format!("C{row}").as_str()).set_value(record.description());
            sheet.get_cell_mut(format!("D{row}").as_str()).set_value(record.expense_type.as_str());
            sheet.get_cell_mut(format!("F{row}").as_str()).set_value(layout.origin.as_str());
            sheet.get_cell_mut(format!("G{row}").as_str()).set_value(layout.destination.as_str());
            sheet.get_cell_mut(format!("I{row}").as_str()).set_value_number(record.amount.to_f64());
            row += 1;
        }

        self.save(&book)?;
        info!(rows = records.len(), workbook = %self.destination.display(), "expenses appended");
        Ok(records.len())
    }

    fn load(&self) -> Result<Spreadsheet, SheetError> {
        umya_spreadsheet::reader::xlsx::read(&self.destination).map_err(|e| SheetError::Xlsx(e.to_string()))
    }

    fn save(&self, book: &Spreadsheet) -> Result<(), SheetError> {
        umya_spreadsheet::writer::xlsx::write(book, &self.destination).map_err(|e| SheetError::Xlsx(e.to_string()))
    }

    fn sheet_mut<'a>(&self, book: &'a mut Spreadsheet) -> Result<&'a mut Worksheet, SheetError> {
        book.get_sheet_by_name_mut(&self.layout.sheet_name)
            .ok_or_else(|| SheetError::MissingSheet(self.layout.sheet_name.clone()))
    }
}

fn cell_b(sheet: &Worksheet, row: u32) -> String {
    sheet.get_value(format!("B{row}").as_str())
}

/// Row holding the totals label in column B, or the configured fallback.
fn find_totals_row(sheet: &Worksheet, layout: &SheetLayout) -> u32 {
    let last = sheet.get_highest_row();
    (layout.first_data_row..=last)
        .find(|&r| cell_b(sheet, r).trim().eq_ignore_ascii_case(&layout.totals_label))
        .unwrap_or(layout.totals_row)
}

const DATA_COLUMNS: [&str; 8] = ["B", "C", "D", "E", "F", "G", "H", "I"];

fn row_has_data(sheet: &Worksheet, row: u32) -> bool {
    DATA_COLUMNS
        .iter()
        .any(|col| !sheet.get_value(format!("{col}{row}").as_str()).trim().is_empty())
}

/// Row after the last filled row above the totals. Gaps left between filled
/// rows are not reused.
fn first_free_row(sheet: &Worksheet, first: u32, totals_row: u32) -> u32 {
    (first..totals_row)
        .rev()
        .find(|&r| row_has_data(sheet, r))
        .map_or(first, |r| r + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reembolso_core::{DateRange, Money, MonthNames};

    /// Template with a header at row 9, three data rows (10..=12) and the
    /// totals label at row 13.
    fn template(dir: &Path) -> PathBuf {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.new_sheet("Plan2").unwrap();
        sheet.get_cell_mut("B9").set_value("DATA");
        sheet.get_cell_mut("I9").set_value("VALOR");
        sheet.get_cell_mut("B13").set_value("TOTAL A RECEBER");
        let path = dir.join("modelo.xlsx");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
        path
    }

    fn layout() -> SheetLayout {
        SheetLayout { totals_row: 13, ..SheetLayout::default() }
    }

    fn record(date: &str, cents: i64) -> ExpenseRecord {
        ExpenseRecord {
            date: date.to_string(),
            expense_type: "Passagem".into(),
            establishment: "Pedágio - Veículo 123".into(),
            amount: Money::from_cents(cents),
            note: Some("Placa ABC1234".into()),
        }
    }

    fn formatter() -> DayMonthFormatter {
        DayMonthFormatter::new(MonthNames::pt_br(), 2025)
    }

    fn read_sheet(path: &Path) -> Spreadsheet {
        umya_spreadsheet::reader::xlsx::read(path).unwrap()
    }

    #[test]
    fn open_copies_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("out").join("preenchido.xlsx");

        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();
        assert!(dest.exists());
        wb.append_expenses(&[record("10 de março", 500)], &formatter()).unwrap();

        // Re-opening must not clobber what was written.
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();
        let book = read_sheet(wb.path());
        let sheet = book.get_sheet_by_name("Plan2").unwrap();
        assert_eq!(sheet.get_value("B10"), "10/03/2025");
    }

    #[test]
    fn append_writes_row_layout() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();

        let written = wb.append_expenses(&[record("10 de março", 1050)], &formatter()).unwrap();
        assert_eq!(written, 1);

        let book = read_sheet(&dest);
        let sheet = book.get_sheet_by_name("Plan2").unwrap();
        assert_eq!(sheet.get_value("B10"), "10/03/2025");
        assert_eq!(sheet.get_value("C10"), "Pedágio - Veículo 123 - Placa ABC1234");
        assert_eq!(sheet.get_value("D10"), "Passagem");
        assert_eq!(sheet.get_value("F10"), "São Jose dos Campos");
        assert_eq!(sheet.get_value("G10"), "São Paulo");
        assert_eq!(sheet.get_value("I10").parse::<f64>().unwrap(), 10.5);
    }

    #[test]
    fn appends_after_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();

        wb.append_expenses(&[record("1 de março", 100)], &formatter()).unwrap();
        wb.append_expenses(&[record("2 de março", 200)], &formatter()).unwrap();

        let book = read_sheet(&dest);
        let sheet = book.get_sheet_by_name("Plan2").unwrap();
        assert_eq!(sheet.get_value("B10"), "01/03/2025");
        assert_eq!(sheet.get_value("B11"), "02/03/2025");
        assert_eq!(sheet.get_value("B12"), "");
        assert_eq!(sheet.get_value("B13"), "TOTAL A RECEBER");
    }

    #[test]
    fn rows_after_a_gap_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();

        // Row 11 has no date but is not empty; row 12 is a full entry.
        let mut book = read_sheet(&dest);
        let sheet = book.get_sheet_by_name_mut("Plan2").unwrap();
        sheet.get_cell_mut("B10").set_value("01/03/2025");
        sheet.get_cell_mut("C11").set_value("linha manual");
        sheet.get_cell_mut("B12").set_value("03/03/2025");
        sheet.get_cell_mut("C12").set_value("Hotel");
        umya_spreadsheet::writer::xlsx::write(&book, &dest).unwrap();

        let records = [record("6 de março", 600), record("7 de março", 700)];
        wb.append_expenses(&records, &formatter()).unwrap();

        let book = read_sheet(&dest);
        let sheet = book.get_sheet_by_name("Plan2").unwrap();
        assert_eq!(sheet.get_value("C11"), "linha manual");
        assert_eq!(sheet.get_value("B12"), "03/03/2025");
        assert_eq!(sheet.get_value("C12"), "Hotel");
        assert_eq!(sheet.get_value("B13"), "06/03/2025");
        assert_eq!(sheet.get_value("B14"), "07/03/2025");
        assert_eq!(sheet.get_value("B15"), "TOTAL A RECEBER");
    }

    #[test]
    fn inserts_rows_to_keep_totals_below() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();

        let records: Vec<_> = (1..=5).map(|d| record(&format!("{d} de março"), 100 * d)).collect();
        assert_eq!(wb.append_expenses(&records, &formatter()).unwrap(), 5);

        let book = read_sheet(&dest);
        let sheet = book.get_sheet_by_name("Plan2").unwrap();
        assert_eq!(sheet.get_value("B14"), "05/03/2025");
        assert_eq!(sheet.get_value("B15"), "TOTAL A RECEBER");

        // The moved label is found again on the next append.
        wb.append_expenses(&[record("6 de março", 600)], &formatter()).unwrap();
        let book = read_sheet(&dest);
        let sheet = book.get_sheet_by_name("Plan2").unwrap();
        assert_eq!(sheet.get_value("B15"), "06/03/2025");
        assert_eq!(sheet.get_value("B16"), "TOTAL A RECEBER");
    }

    #[test]
    fn unresolvable_dates_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();

        wb.append_expenses(&[record("05/03/2025", 100)], &formatter()).unwrap();
        let book = read_sheet(&dest);
        assert_eq!(book.get_sheet_by_name("Plan2").unwrap().get_value("B10"), "05/03/2025");
    }

    #[test]
    fn empty_append_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();
        assert_eq!(wb.append_expenses(&[], &formatter()).unwrap(), 0);
    }

    #[test]
    fn payee_header_block() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(&tpl, &dest, layout()).unwrap();

        let payee = PayeeProfile {
            name: "Maria Souza".into(),
            tax_id: "123.456.789-00".into(),
            bank: "Nubank".into(),
            branch_account: "0001 / 12345-6".into(),
            pix_key: "maria@pix".into(),
            period: DateRange::new(
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            )
            .unwrap(),
        };
        wb.write_payee(&payee).unwrap();

        let book = read_sheet(&dest);
        let sheet = book.get_sheet_by_name("Plan2").unwrap();
        assert_eq!(sheet.get_value("H3"), "Maria Souza");
        assert_eq!(sheet.get_value("H7"), "maria@pix");
        assert_eq!(sheet.get_value("F4"), "01/03/2025");
        assert_eq!(sheet.get_value("F5"), "31/03/2025");
    }

    #[test]
    fn missing_sheet_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = template(dir.path());
        let dest = dir.path().join("preenchido.xlsx");
        let wb = ReimbursementWorkbook::open(
            &tpl,
            &dest,
            SheetLayout { sheet_name: "Plan9".into(), ..layout() },
        )
        .unwrap();
        assert!(matches!(
            wb.append_expenses(&[record("1 de março", 1)], &formatter()),
            Err(SheetError::MissingSheet(_))
        ));
    }
}
