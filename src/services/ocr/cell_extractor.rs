use crate::error::TemplateError;
use crate::models::game::Side;
use crate::models::rect::CropRect;
use crate::models::template::RegionTemplate;
use crate::services::ocr::preprocessing::NormalizedImage;
use image::{GenericImageView, GrayImage};

/// One (row, column) sub-image of the scoreboard
#[derive(Debug, Clone)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
    pub side: Side,
    /// Index of the source screenshot
    pub source: usize,
    /// Crop rectangle in working-image pixels
    pub rect: CropRect,
    pub image: GrayImage,
}

/// Geometry of a cell before cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub row: usize,
    pub column: usize,
    pub side: Side,
    pub source: usize,
    pub rect: CropRect,
}

/// Applies a region template to normalized screenshots
pub struct CellExtractor<'a> {
    template: &'a RegionTemplate,
}

impl<'a> CellExtractor<'a> {
    pub fn new(template: &'a RegionTemplate) -> Self {
        Self { template }
    }

    /// Cut every cell out of the working images, row-major, column-minor.
    pub fn extract(&self, images: &[NormalizedImage]) -> Result<Vec<Cell>, TemplateError> {
        let dimensions: Vec<(u32, u32, f64)> = images
            .iter()
            .map(|n| (n.image.width(), n.image.height(), n.scale))
            .collect();

        let cells = self
            .layout(&dimensions)?
            .into_iter()
            .map(|c| {
                let image = images[c.source]
                    .image
                    .view(c.rect.x as u32, c.rect.y as u32, c.rect.width, c.rect.height)
                    .to_image();
                Cell {
                    row: c.row,
                    column: c.column,
                    side: c.side,
                    source: c.source,
                    rect: c.rect,
                    image,
                }
            })
            .collect();

        Ok(cells)
    }

    /// Cell rectangles for working images of the given (width, height, scale).
    ///
    /// Rows where any rectangle leaves its image are dropped as a whole.
    pub fn layout(&self, images: &[(u32, u32, f64)]) -> Result<Vec<CellRect>, TemplateError> {
        let template = self.template;
        if images.len() != template.sources.len() {
            return Err(TemplateError::ImageCount {
                title: template.title.to_string(),
                expected: template.sources.len(),
                actual: images.len(),
            });
        }

        let rows_per_side = template.rows_per_side as usize;
        let mut cells = Vec::with_capacity(template.rows() * template.column_count());

        for row in 0..template.rows() {
            let side = Side::of_row(row, rows_per_side);
            let row_in_side = (row % rows_per_side) as i32;

            let row_cells: Vec<CellRect> = template
                .columns
                .iter()
                .enumerate()
                .map(|(column, region)| {
                    let (_, height, scale) = images[region.source];
                    let row_height = (height / template.rows_per_side) as i32;
                    let rect = region
                        .rect(side)
                        .translated(0, region.y_correction)
                        .scaled(scale)
                        .translated(0, row_in_side * row_height);
                    CellRect {
                        row,
                        column,
                        side,
                        source: region.source,
                        rect,
                    }
                })
                .collect();

            let overflow = row_cells.iter().find(|c| {
                let (width, height, _) = images[c.source];
                !c.rect.fits_within(width, height)
            });
            if let Some(cell) = overflow {
                tracing::debug!(row, column = cell.column, rect = ?cell.rect, "Skipping row outside image bounds");
                continue;
            }

            cells.extend(row_cells);
        }

        Ok(cells)
    }
}
