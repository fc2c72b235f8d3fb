use thiserror::Error;
use tracing::{debug, info};

use crate::preprocess::{self, PreprocessError};
use crate::qr::QrDecoder;
use crate::recognizer::{OcrBackend, OcrError};
use crate::toll;
use crate::types::TollTransaction;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// What a photo turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedDocument {
    /// A retail receipt; the QR code points at the tax authority's page.
    RetailQr { url: String },
    /// A toll statement. `transactions` may be empty when nothing usable was found.
    Toll { ocr_text: String, transactions: Vec<TollTransaction> },
    /// OCR produced no text at all.
    Unreadable,
}

/// Routes a photo: decode → QR lookup → OCR → toll reconstruction.
pub struct ReceiptPipeline<R: OcrBackend, Q: QrDecoder> {
    recognizer: R,
    qr: Q,
}

impl<R: OcrBackend, Q: QrDecoder> ReceiptPipeline<R, Q> {
    pub fn new(recognizer: R, qr: Q) -> Self {
        Self { recognizer, qr }
    }

    /// Blocking; OCR engines are CPU-bound.
    pub fn scan(&self, data: &[u8]) -> Result<ScannedDocument, PipelineError> {
        let gray = preprocess::decode_grayscale(data)?;

        if let Some(url) = self.qr.decode(&gray) {
            info!(%url, "QR code found; treating photo as retail receipt");
            return Ok(ScannedDocument::RetailQr { url });
        }

        info!("no QR code; treating photo as toll statement");
        let png = preprocess::encode_png(&gray)?;
        let ocr_text = self.recognizer.recognize(&png)?;
        if ocr_text.trim().is_empty() {
            return Ok(ScannedDocument::Unreadable);
        }
        debug!(chars = ocr_text.len(), "OCR text received");

        let transactions = toll::reconstruct(&ocr_text);
        Ok(ScannedDocument::Toll { ocr_text, transactions })
    }
}
