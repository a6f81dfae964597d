use super::engine::{CellProgress, OcrEngine};
use crate::models::config::RecognitionConfig;
use base64::{engine::general_purpose, Engine as _};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Boxes overlapping more than this are treated as duplicate detections
const NMS_IOU_THRESHOLD: f64 = 0.3;

/// Horizontal gap, relative to box height, that separates two words
const WORD_GAP_RATIO: f64 = 0.5;

/// HTTP OCR client that communicates with a local OCR server
#[derive(Clone)]
pub struct HttpOcrClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    image_base64: String,
    lang: &'a str,
}

/// Single text box with bounding box coordinates
#[derive(Deserialize, Clone, Debug)]
struct TextBox {
    #[serde(rename = "box")]
    bbox: Vec<Vec<f64>>, // 4 corner points [[x1,y1], [x2,y2], [x3,y3], [x4,y4]]
    text: String,
    #[serde(default)]
    #[allow(dead_code)]
    score: f64,
}

#[derive(Deserialize)]
struct OcrResponse {
    boxes: Vec<TextBox>,
    #[serde(default)]
    raw_text: String,
}

impl TextBox {
    /// Get bounding box as (x_min, y_min, x_max, y_max)
    fn get_bbox_rect(&self) -> (f64, f64, f64, f64) {
        let xs = self.bbox.iter().filter_map(|p| p.first().copied());
        let ys = self.bbox.iter().filter_map(|p| p.get(1).copied());

        let (x_min, x_max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
        let (y_min, y_max) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });

        (x_min, y_min, x_max, y_max)
    }

    /// Compute IoU (Intersection over Union) with another box
    fn iou(&self, other: &TextBox) -> f64 {
        let (x1_min, y1_min, x1_max, y1_max) = self.get_bbox_rect();
        let (x2_min, y2_min, x2_max, y2_max) = other.get_bbox_rect();

        let inter_x_min = x1_min.max(x2_min);
        let inter_y_min = y1_min.max(y2_min);
        let inter_x_max = x1_max.min(x2_max);
        let inter_y_max = y1_max.min(y2_max);

        if inter_x_max <= inter_x_min || inter_y_max <= inter_y_min {
            return 0.0;
        }

        let inter_area = (inter_x_max - inter_x_min) * (inter_y_max - inter_y_min);
        let union_area = self.area() + other.area() - inter_area;

        if union_area <= 0.0 {
            return 0.0;
        }

        inter_area / union_area
    }

    fn left_x(&self) -> f64 {
        self.get_bbox_rect().0
    }

    fn right_x(&self) -> f64 {
        self.get_bbox_rect().2
    }

    fn height(&self) -> f64 {
        let (_, y_min, _, y_max) = self.get_bbox_rect();
        y_max - y_min
    }

    fn area(&self) -> f64 {
        let (x_min, y_min, x_max, y_max) = self.get_bbox_rect();
        (x_max - x_min) * (y_max - y_min)
    }
}

impl HttpOcrClient {
    pub fn new(config: &RecognitionConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.cell_timeout_ms))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    /// Apply NMS-like filtering to remove overlapping boxes
    /// Keep larger boxes when IoU > threshold
    fn filter_overlapping_boxes(boxes: Vec<TextBox>, iou_threshold: f64) -> Vec<TextBox> {
        let mut filtered: Vec<TextBox> = Vec::with_capacity(boxes.len());
        let mut remaining = boxes;

        // Largest first
        remaining.sort_by(|a, b| b.area().total_cmp(&a.area()));

        for candidate in remaining {
            if filtered.iter().all(|kept| kept.iou(&candidate) <= iou_threshold) {
                filtered.push(candidate);
            }
        }

        filtered
    }

    /// Filter overlapping boxes, sort left-to-right, join into one line.
    /// Boxes separated by a visible gap are joined with a space.
    fn process_ocr_boxes(boxes: Vec<TextBox>) -> String {
        let mut filtered = Self::filter_overlapping_boxes(boxes, NMS_IOU_THRESHOLD);
        filtered.sort_by(|a, b| a.left_x().total_cmp(&b.left_x()));

        let mut text = String::new();
        let mut previous: Option<&TextBox> = None;
        for current in &filtered {
            if let Some(prev) = previous {
                let gap = current.left_x() - prev.right_x();
                if gap > prev.height().max(current.height()) * WORD_GAP_RATIO {
                    text.push(' ');
                }
            }
            text.push_str(current.text.trim());
            previous = Some(current);
        }

        text
    }

    /// Check if server is healthy
    pub async fn health_check(&self) -> Result<(), String> {
        let url = format!("{}/health", self.base_url);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Health check failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Health check failed: {}", e))?;
        Ok(())
    }

    fn encode_image(image: &GrayImage) -> Result<String, String> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| format!("Failed to encode image: {}", e))?;
        Ok(general_purpose::STANDARD.encode(&buffer))
    }
}

impl OcrEngine for HttpOcrClient {
    async fn recognize(
        &self,
        image: &GrayImage,
        lang: &str,
        progress: CellProgress<'_>,
    ) -> Result<String, String> {
        let image_base64 = Self::encode_image(image)?;
        let url = format!("{}/ocr", self.base_url);
        progress(0.0);

        let response = self
            .client
            .post(&url)
            .json(&OcrRequest { image_base64, lang })
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("OCR server error: {}", error_text));
        }
        progress(0.5);

        let data: OcrResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        let text = if data.boxes.is_empty() {
            data.raw_text.trim().to_string()
        } else {
            Self::process_ocr_boxes(data.boxes)
        };
        progress(1.0);

        Ok(text)
    }
}
