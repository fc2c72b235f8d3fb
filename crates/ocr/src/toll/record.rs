use reembolso_core::{ExpenseRecord, Money};

use crate::types::TollTransaction;

pub const TOLL_ESTABLISHMENT_PREFIX: &str = "Pedágio - Veículo";

/// Map a toll charge onto a reimbursement-sheet row.
///
/// The exact amount is rounded to whole centavos, the sheet's unit.
pub fn to_expense_record(tx: &TollTransaction) -> ExpenseRecord {
    ExpenseRecord {
        date: tx.date.clone(),
        expense_type: tx.category.label().to_string(),
        establishment: format!("{TOLL_ESTABLISHMENT_PREFIX} {}", tx.vehicle.code),
        amount: Money::from_decimal(tx.amount),
        note: Some(format!("Placa {}", tx.vehicle.plate)),
    }
}
