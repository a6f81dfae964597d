use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessingConfig {
    /// Pixels brighter than this become background after inversion
    pub threshold: u8,
    /// Radius of the square structuring element used for erosion/dilation
    pub morphology_radius: u8,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            threshold: 150,
            morphology_radius: 1,
        }
    }
}

/// Text recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognitionConfig {
    /// Fixed OCR language for every cell
    pub language: String,
    /// Upper bound for a single cell's recognition
    pub cell_timeout_ms: u64,
    /// Local OCR server
    pub server_url: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            cell_timeout_ms: 30_000,
            server_url: "http://127.0.0.1:39835".to_string(),
        }
    }
}

/// Region template overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TemplateConfig {
    /// Directory holding `<title>.json` overrides of the built-in templates
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
}
