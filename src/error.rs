use std::time::Duration;
use thiserror::Error;

/// Message shown to the caller for every fatal pipeline failure.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Could not read statistics from the submitted screenshot(s). Please resubmit them.";

/// A submitted image could not be turned into a raster
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("image {index} is not a valid data URL")]
    InvalidDataUrl { index: usize },
    #[error("image {index} has an invalid base64 payload")]
    Base64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },
    #[error("image {index} could not be decoded")]
    Raster {
        index: usize,
        #[source]
        source: image::ImageError,
    },
    #[error("image {index} is empty after cropping to the scoreboard area")]
    EmptyCrop { index: usize },
}

/// OCR failed for one cell; fatal for the whole batch
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("OCR engine failed on cell {cell}: {message}")]
    Engine { cell: usize, message: String },
    #[error("OCR timed out on cell {cell} after {after:?}")]
    Timeout { cell: usize, after: Duration },
}

/// Numeric column text that could not be parsed. Never fatal: it ends up as a
/// review issue on the record.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("'{raw}' is not a number")]
pub struct FieldParseError {
    pub raw: String,
}

/// Template data that cannot be applied
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{title} expects {expected} image(s), got {actual}")]
    ImageCount {
        title: String,
        expected: usize,
        actual: usize,
    },
    #[error("template for {title} declares {actual} columns, expected {expected}")]
    ColumnCount {
        title: String,
        expected: usize,
        actual: usize,
    },
    #[error("column {column} refers to source image {source_index}, but only {sources} are declared")]
    UnknownSource {
        column: usize,
        source_index: usize,
        sources: usize,
    },
    #[error("column {column} has an empty rectangle")]
    EmptyRect { column: usize },
    #[error("template has an invalid {0}")]
    Invalid(&'static str),
    #[error("template file {path} could not be read")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("template file {path} could not be parsed")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A roster collaborator failed
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster lookup failed: {0}")]
    Lookup(String),
    #[error("unknown team {0}")]
    UnknownTeam(String),
    #[error("{title} requires the participating teams to be known")]
    MissingMatchContext { title: String },
    #[error("roster file {path} could not be loaded")]
    Load {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    NoConfigDir,
    #[error("config I/O failed")]
    Io(#[from] std::io::Error),
    #[error("config JSON is invalid")]
    Json(#[from] serde_json::Error),
}

/// Fatal errors that abort a compile run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    ImageDecode(#[from] ImageDecodeError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("background task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// The one message the caller gets for any fatal failure.
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_fatal_error_maps_to_generic_message() {
        let errors = vec![
            PipelineError::from(ImageDecodeError::InvalidDataUrl { index: 0 }),
            PipelineError::from(RecognitionError::Timeout {
                cell: 3,
                after: Duration::from_secs(1),
            }),
            PipelineError::from(RosterError::Lookup("offline".to_string())),
            PipelineError::Task("join".to_string()),
        ];

        for err in errors {
            assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_detailed_messages_keep_context() {
        let err = PipelineError::from(RecognitionError::Engine {
            cell: 7,
            message: "server error".to_string(),
        });
        assert_eq!(err.to_string(), "OCR engine failed on cell 7: server error");

        let err = TemplateError::ImageCount {
            title: "moba".to_string(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "moba expects 2 image(s), got 1");
    }
}
