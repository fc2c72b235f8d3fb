//! Retail receipts (NFC-e): the QR code on the paper receipt links to the
//! state tax authority's consultation page, which carries the vendor, the
//! CNPJ, the amount paid and the issue date.

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reembolso_core::{ExpenseRecord, Money, RETAIL_EXPENSE_TYPE};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const NOT_FOUND: &str = "NÃO ENCONTRADO";
const DATE_NOT_FOUND: &str = "NÃO ENCONTRADA";

/// Lazily built, process-wide value behind a getter fn.
macro_rules! cached {
    ($name:ident: $ty:ty = $init:expr) => {
        fn $name() -> &'static $ty {
            static CELL: OnceLock<$ty> = OnceLock::new();
            CELL.get_or_init(|| $init)
        }
    };
}

macro_rules! re {
    ($name:ident, $pat:expr) => {
        cached!($name: Regex = Regex::new($pat).expect("invalid regex"));
    };
}

re!(re_cnpj, r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}");
re!(re_issue_date, r"\d{2}/\d{2}/\d{4}");
re!(re_total_label, r"(?i)valor a pagar");
re!(re_issue_label, r"(?i)emissão");

macro_rules! sel {
    ($name:ident, $css:expr) => {
        cached!($name: Selector = Selector::parse($css).expect("invalid selector"));
    };
}

sel!(sel_vendor, "div.txtTopo");
sel!(sel_div, "div");
sel!(sel_label, "label");
sel!(sel_strong, "strong");

#[derive(Debug, Error)]
pub enum NfceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Receipt page has no amount to pay")]
    MissingTotal,
    #[error("Invalid amount on receipt page: '{0}'")]
    InvalidTotal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailReceipt {
    pub vendor: String,
    pub cnpj: String,
    pub total: Money,
    /// `dd/mm/yyyy` as printed on the page.
    pub issued_on: String,
}

impl RetailReceipt {
    pub fn to_expense_record(&self) -> ExpenseRecord {
        ExpenseRecord {
            date: self.issued_on.clone(),
            expense_type: RETAIL_EXPENSE_TYPE.to_string(),
            establishment: self.vendor.clone(),
            amount: self.total,
            note: Some(format!("CNPJ: {}", self.cnpj)),
        }
    }
}

/// Extract the receipt fields from the consultation page HTML.
///
/// Vendor, CNPJ and date fall back to placeholders; the amount is required.
pub fn parse_receipt_page(html: &str) -> Result<RetailReceipt, NfceError> {
    let doc = Html::parse_document(html);

    let vendor = doc
        .select(sel_vendor())
        .next()
        .map(|e| element_text(&e))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let cnpj = doc
        .select(sel_div())
        .map(|e| element_text(&e))
        .find(|text| text.contains("CNPJ:"))
        .and_then(|text| re_cnpj().find(&text).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let total_text = doc
        .select(sel_label())
        .find(|label| re_total_label().is_match(&element_text(label)))
        .and_then(|label| {
            label
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "span" && e.value().classes().any(|c| c == "totalNumb"))
        })
        .map(|span| element_text(&span))
        .ok_or(NfceError::MissingTotal)?;
    let total = parse_brl(&total_text).ok_or(NfceError::InvalidTotal(total_text))?;

    let issued_on = doc
        .select(sel_strong())
        .find(|strong| re_issue_label().is_match(&element_text(strong)))
        .and_then(|strong| strong.parent().and_then(ElementRef::wrap))
        .and_then(|parent| {
            let text = element_text(&parent);
            re_issue_date().find(&text).map(|m| m.as_str().to_string())
        })
        .unwrap_or_else(|| DATE_NOT_FOUND.to_string());

    Ok(RetailReceipt { vendor, cnpj, total, issued_on })
}

/// Whitespace-normalized text of an element and its descendants.
fn element_text(e: &ElementRef<'_>) -> String {
    e.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// "1.234,56" → 1234.56. Without a comma the dot is the decimal separator.
fn parse_brl(s: &str) -> Option<Money> {
    let s = s.trim().trim_start_matches("R$").trim();
    let clean = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };
    Decimal::from_str(&clean).ok().map(Money::from_decimal)
}

/// Downloads and parses consultation pages.
#[derive(Clone)]
pub struct NfceClient {
    http: reqwest::Client,
}

impl NfceClient {
    pub fn new(timeout: Duration) -> Result<Self, NfceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("reembolso/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub async fn fetch(&self, url: &str) -> Result<RetailReceipt, NfceError> {
        info!(%url, "fetching NFC-e page");
        let html = self.http.get(url).send().await?.error_for_status()?.text().await?;
        let receipt = parse_receipt_page(&html)?;
        info!(
            vendor = %receipt.vendor,
            cnpj = %receipt.cnpj,
            total = %receipt.total,
            issued_on = %receipt.issued_on,
            "NFC-e receipt parsed"
        );
        Ok(receipt)
    }
}
