use serde::{Deserialize, Serialize};

use crate::period::DateRange;

/// Identity and banking details of the person being reimbursed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeProfile {
    pub name: String,
    /// CPF or CNPJ, as typed.
    pub tax_id: String,
    pub bank: String,
    /// Branch and checking account ("Agência e C/C").
    pub branch_account: String,
    pub pix_key: String,
    pub period: DateRange,
}
