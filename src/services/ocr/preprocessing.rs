use crate::error::{ImageDecodeError, PipelineError, TemplateError};
use crate::models::config::PreprocessingConfig;
use crate::models::template::{RegionTemplate, SourceRegion};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

/// Working image ready for cell extraction
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub image: GrayImage,
    /// Reference pixels → working pixels (position multiplier × resize multiplier)
    pub scale: f64,
}

/// Crops, rescales and binarizes raw screenshots for OCR
pub struct ImageNormalizer {
    config: PreprocessingConfig,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(PreprocessingConfig::default())
    }
}

impl ImageNormalizer {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    /// Normalize every screenshot of a request against its source region.
    /// The image count must match the template.
    pub fn normalize_all(
        &self,
        images: &[DynamicImage],
        template: &RegionTemplate,
    ) -> Result<Vec<NormalizedImage>, PipelineError> {
        if images.len() != template.sources.len() {
            return Err(TemplateError::ImageCount {
                title: template.title.to_string(),
                expected: template.sources.len(),
                actual: images.len(),
            }
            .into());
        }

        images
            .iter()
            .zip(&template.sources)
            .enumerate()
            .map(|(index, (image, source))| {
                self.normalize(image, source, template, index)
                    .map_err(PipelineError::from)
            })
            .collect()
    }

    /// Full pipeline for one screenshot:
    /// crop → resize (cubic) → grayscale → erode → dilate → inverse threshold
    pub fn normalize(
        &self,
        image: &DynamicImage,
        source: &SourceRegion,
        template: &RegionTemplate,
        index: usize,
    ) -> Result<NormalizedImage, ImageDecodeError> {
        let (width, height) = image.dimensions();
        let position_multiplier = width as f64 / template.reference_width as f64;

        let cropped = Self::crop_board(image, source, position_multiplier)
            .ok_or(ImageDecodeError::EmptyCrop { index })?;
        let resized = Self::scale(&cropped, template.resize_multiplier);
        let gray = resized.to_luma8();
        let opened = self.open(&gray);
        let binary = self.threshold_inverse(&opened);

        tracing::debug!(
            index,
            source = %source.name,
            input = ?(width, height),
            output = ?binary.dimensions(),
            position_multiplier,
            "Normalized screenshot"
        );

        Ok(NormalizedImage {
            image: binary,
            scale: position_multiplier * template.resize_multiplier,
        })
    }

    /// Cut the scoreboard area out, offsets scaled to the actual resolution
    fn crop_board(
        image: &DynamicImage,
        source: &SourceRegion,
        position_multiplier: f64,
    ) -> Option<DynamicImage> {
        let (width, height) = image.dimensions();
        let board = source
            .board
            .scaled(position_multiplier)
            .clamped_to(width, height)?;

        Some(image.crop_imm(board.x as u32, board.y as u32, board.width, board.height))
    }

    /// Scale image by factor with cubic interpolation
    pub fn scale(image: &DynamicImage, factor: f64) -> DynamicImage {
        let (width, height) = image.dimensions();
        let new_width = ((width as f64 * factor).round() as u32).max(1);
        let new_height = ((height as f64 * factor).round() as u32).max(1);

        image.resize_exact(new_width, new_height, FilterType::CatmullRom)
    }

    /// Morphological opening (one erosion followed by one dilation)
    pub fn open(&self, image: &GrayImage) -> GrayImage {
        let mask = Mask::square(self.config.morphology_radius);
        let eroded = grayscale_erode(image, &mask);
        grayscale_dilate(&eroded, &mask)
    }

    /// Inverse binary threshold: bright pixels → 0, everything else → 255
    pub fn threshold_inverse(&self, image: &GrayImage) -> GrayImage {
        let level = self.config.threshold;

        ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            if image.get_pixel(x, y)[0] > level {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }
}
