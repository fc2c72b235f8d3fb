use std::collections::HashMap;
use std::time::{Duration, Instant};

use reembolso_core::{IntakeSession, PayeeProfile};
use reembolso_import::NfceClient;
use reembolso_ocr::{OcrBackend, QrDecoder, ReceiptPipeline};
use reembolso_storage::ReimbursementWorkbook;
use tokio::sync::Mutex;

use crate::config::Config;

pub type Pipeline = ReceiptPipeline<Box<dyn OcrBackend>, Box<dyn QrDecoder>>;

/// Per-phone-number conversation state.
#[derive(Debug)]
pub struct Sender {
    pub intake: IntakeSession,
    pub payee: Option<PayeeProfile>,
    pub last_seen: Instant,
}

impl Default for Sender {
    fn default() -> Self {
        Self { intake: IntakeSession::new(), payee: None, last_seen: Instant::now() }
    }
}

/// Drop senders that went quiet part-way through intake.
///
/// Senders with a saved payee are kept for the life of the process; their
/// details are already in the workbook header and date every later append.
pub fn prune_idle(senders: &mut HashMap<String, Sender>, idle: Duration) {
    let before = senders.len();
    senders.retain(|_, s| s.payee.is_some() || s.last_seen.elapsed() < idle);
    let pruned = before - senders.len();
    if pruned > 0 {
        tracing::debug!(pruned, "idle intake sessions dropped");
    }
}

pub struct AppState {
    pub config: Config,
    pub senders: Mutex<HashMap<String, Sender>>,
    /// Blocking I/O; only touched from `spawn_blocking`.
    pub workbook: std::sync::Mutex<ReimbursementWorkbook>,
    pub pipeline: Pipeline,
    pub nfce: NfceClient,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: Config,
        workbook: ReimbursementWorkbook,
        pipeline: Pipeline,
    ) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        Ok(Self {
            nfce: NfceClient::new(timeout)?,
            http: reqwest::Client::builder().timeout(timeout).build()?,
            senders: Mutex::new(HashMap::new()),
            workbook: std::sync::Mutex::new(workbook),
            pipeline,
            config,
        })
    }

    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let workbook = ReimbursementWorkbook::open(
            &config.template_path,
            &config.destination_path,
            config.sheet.clone(),
        )?;
        let pipeline = ReceiptPipeline::new(recognizer(&config), qr_decoder());
        Self::new(config, workbook, pipeline)
    }
}

#[cfg(feature = "tesseract")]
fn recognizer(config: &Config) -> Box<dyn OcrBackend> {
    use reembolso_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    Box::new(TesseractRecognizer::new(config.ocr.tessdata.clone(), &config.ocr.lang))
}

#[cfg(not(feature = "tesseract"))]
fn recognizer(_config: &Config) -> Box<dyn OcrBackend> {
    tracing::warn!("built without the `tesseract` feature; toll statements cannot be read");
    Box::new(reembolso_ocr::UnavailableRecognizer)
}

#[cfg(feature = "qr")]
fn qr_decoder() -> Box<dyn QrDecoder> {
    Box::new(reembolso_ocr::qr::rqrr_backend::RqrrDecoder)
}

#[cfg(not(feature = "qr"))]
fn qr_decoder() -> Box<dyn QrDecoder> {
    tracing::warn!("built without the `qr` feature; every photo is treated as a toll statement");
    Box::new(reembolso_ocr::NoQrDecoder)
}
