pub mod pipeline;
pub mod preprocess;
pub mod qr;
pub mod recognizer;
pub mod toll;
pub mod types;

pub use pipeline::{PipelineError, ReceiptPipeline, ScannedDocument};
pub use preprocess::{decode_grayscale, encode_png, PreprocessError};
pub use qr::{MockQrDecoder, NoQrDecoder, QrDecoder};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use toll::reconstruct;
pub use types::{TollCategory, TollTransaction, VehicleId};
