pub mod nfce;

pub use nfce::{parse_receipt_page, NfceClient, NfceError, RetailReceipt};
