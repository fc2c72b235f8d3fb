use image::GrayImage;

/// Finds the URL embedded in a receipt's QR code, if there is one.
pub trait QrDecoder: Send + Sync {
    fn decode(&self, image: &GrayImage) -> Option<String>;
}

impl<T: QrDecoder + ?Sized> QrDecoder for Box<T> {
    fn decode(&self, image: &GrayImage) -> Option<String> {
        (**self).decode(image)
    }
}

/// Never finds a code; every photo is routed to OCR.
pub struct NoQrDecoder;

impl QrDecoder for NoQrDecoder {
    fn decode(&self, _image: &GrayImage) -> Option<String> {
        None
    }
}

pub struct MockQrDecoder {
    pub url: Option<String>,
}

impl MockQrDecoder {
    pub fn found(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()) }
    }
}

impl QrDecoder for MockQrDecoder {
    fn decode(&self, _image: &GrayImage) -> Option<String> {
        self.url.clone()
    }
}

// ── rqrr backend (optional, gated behind `qr` feature) ─────────────────────────

#[cfg(feature = "qr")]
pub mod rqrr_backend {
    use super::QrDecoder;
    use image::GrayImage;

    pub struct RqrrDecoder;

    impl QrDecoder for RqrrDecoder {
        fn decode(&self, image: &GrayImage) -> Option<String> {
            let (w, h) = image.dimensions();
            let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
                w as usize,
                h as usize,
                |x, y| image.get_pixel(x as u32, y as u32).0[0],
            );
            prepared
                .detect_grids()
                .into_iter()
                .find_map(|grid| grid.decode().ok().map(|(_, content)| content))
        }
    }
}
