use crate::error::RecognitionError;
use crate::models::config::RecognitionConfig;
use crate::models::game::Side;
use crate::services::ocr::cell_extractor::Cell;
use crate::services::ocr::engine::OcrEngine;
use crate::services::progress::StageProgress;
use std::time::{Duration, Instant};

/// A cell's position plus its recognized text
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedCell {
    pub row: usize,
    pub column: usize,
    pub side: Side,
    pub text: String,
    /// Overall recognition progress (0.0..=1.0) once this cell completed
    pub cumulative_progress: f32,
}

impl RecognizedCell {
    /// Cell with text only, for feeding the row compiler directly
    pub fn from_text(row: usize, column: usize, side: Side, text: impl Into<String>) -> Self {
        Self {
            row,
            column,
            side,
            text: text.into(),
            cumulative_progress: 0.0,
        }
    }
}

/// Sequential OCR over a cell sequence
pub struct TextRecognizer<'e, E: OcrEngine> {
    engine: &'e E,
    language: String,
    cell_timeout: Duration,
}

impl<'e, E: OcrEngine> TextRecognizer<'e, E> {
    pub fn new(engine: &'e E, config: &RecognitionConfig) -> Self {
        Self {
            engine,
            language: config.language.clone(),
            cell_timeout: Duration::from_millis(config.cell_timeout_ms),
        }
    }

    /// Recognize every cell, one at a time, in input order.
    ///
    /// The first failing or timed-out cell aborts the batch.
    pub async fn recognize_all(
        &self,
        cells: &[Cell],
        progress: &StageProgress<'_>,
    ) -> Result<Vec<RecognizedCell>, RecognitionError> {
        let total = cells.len();
        let mut recognized = Vec::with_capacity(total);
        if total == 0 {
            progress.report_fraction(1.0);
            return Ok(recognized);
        }

        let started = Instant::now();
        for (index, cell) in cells.iter().enumerate() {
            let on_cell_progress = |fraction: f32| {
                let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
                progress.report_fraction((index as f32 + fraction) / total as f32);
            };

            let text = tokio::time::timeout(
                self.cell_timeout,
                self.engine
                    .recognize(&cell.image, &self.language, &on_cell_progress),
            )
            .await
            .map_err(|_| RecognitionError::Timeout {
                cell: index,
                after: self.cell_timeout,
            })?
            .map_err(|message| RecognitionError::Engine {
                cell: index,
                message,
            })?;

            let cumulative_progress = (index + 1) as f32 / total as f32;
            progress.report_fraction(cumulative_progress);
            tracing::debug!(
                cell = index,
                row = cell.row,
                column = cell.column,
                text = %text,
                "Recognized cell"
            );

            recognized.push(RecognizedCell {
                row: cell.row,
                column: cell.column,
                side: cell.side,
                text,
                cumulative_progress,
            });
        }

        tracing::info!(cells = total, elapsed_ms = started.elapsed().as_millis() as u64, "Recognition finished");
        Ok(recognized)
    }
}
