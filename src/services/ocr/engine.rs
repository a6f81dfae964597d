use image::GrayImage;
use std::future::Future;

/// Callback receiving the fractional progress (0.0..=1.0) of the cell being recognized
pub type CellProgress<'a> = &'a (dyn Fn(f32) + Send + Sync);

/// OCR Engine trait - abstraction for different OCR implementations
pub trait OcrEngine: Send + Sync {
    /// Recognize the text of one cell image in `lang`
    fn recognize(
        &self,
        image: &GrayImage,
        lang: &str,
        progress: CellProgress<'_>,
    ) -> impl Future<Output = Result<String, String>> + Send;
}
