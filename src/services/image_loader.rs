use crate::error::ImageDecodeError;
use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A submitted screenshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ImageInput {
    /// Encoded image file contents (PNG, JPEG, ...)
    Bytes(Vec<u8>),
    /// `data:<mime>;base64,<payload>`
    DataUrl(String),
}

impl ImageInput {
    /// Decode into a raster. `index` identifies the image in errors.
    pub fn decode(&self, index: usize) -> Result<DynamicImage, ImageDecodeError> {
        let bytes = match self {
            ImageInput::Bytes(bytes) => std::borrow::Cow::Borrowed(bytes.as_slice()),
            ImageInput::DataUrl(url) => std::borrow::Cow::Owned(decode_data_url(url, index)?),
        };

        image::load_from_memory(&bytes).map_err(|source| ImageDecodeError::Raster { index, source })
    }
}

fn decode_data_url(url: &str, index: usize) -> Result<Vec<u8>, ImageDecodeError> {
    let (header, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(ImageDecodeError::InvalidDataUrl { index })?;

    if !header.ends_with(";base64") {
        return Err(ImageDecodeError::InvalidDataUrl { index });
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|source| ImageDecodeError::Base64 { index, source })
}

/// Decode every input, failing on the first bad one
pub fn decode_all(inputs: &[ImageInput]) -> Result<Vec<DynamicImage>, ImageDecodeError> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| input.decode(index))
        .collect()
}
