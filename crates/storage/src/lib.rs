pub mod workbook;

pub use workbook::{ReimbursementWorkbook, SheetError, SheetLayout};
