pub mod cell_extractor;
pub mod engine;
pub mod http_ocr;
pub mod parser;
pub mod preprocessing;
pub mod recognizer;

// Re-export main types
pub use cell_extractor::{Cell, CellExtractor};
pub use engine::OcrEngine;
pub use http_ocr::HttpOcrClient;
pub use preprocessing::{ImageNormalizer, NormalizedImage};
pub use recognizer::{RecognizedCell, TextRecognizer};
