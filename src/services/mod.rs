pub mod config;
pub mod entity_resolver;
pub mod image_loader;
pub mod ocr;
pub mod pipeline;
pub mod progress;
pub mod roster;
pub mod row_compiler;
