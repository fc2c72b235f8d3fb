use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Expense type written for every retail (NFC-e) receipt.
pub const RETAIL_EXPENSE_TYPE: &str = "Combustivel/Alimentação";

/// One row of the reimbursement sheet, as handed to the workbook writer.
///
/// Serialized keys match the column captions used on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Free-form date text: `dd/mm/yyyy` for retail receipts, day and month
    /// only (e.g. "10 de março") for toll statements.
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Tipo de Despesa")]
    pub expense_type: String,
    #[serde(rename = "Estabelecimento")]
    pub establishment: String,
    #[serde(rename = "Valor")]
    pub amount: Money,
    #[serde(rename = "Observação", skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

impl ExpenseRecord {
    /// Text for the sheet's client column: establishment, then ` - note` if present.
    pub fn description(&self) -> String {
        match self.note.as_deref() {
            Some(note) if !note.is_empty() => format!("{} - {}", self.establishment, note),
            _ => self.establishment.clone(),
        }
    }
}
