use crate::error::{PipelineError, TemplateError};
use crate::models::config::AppConfig;
use crate::models::game::GameTitle;
use crate::models::roster::MatchContext;
use crate::models::stat_record::PlayerStatRecord;
use crate::models::template::RegionTemplate;
use crate::services::entity_resolver::EntityResolver;
use crate::services::ocr::{CellExtractor, ImageNormalizer, OcrEngine, TextRecognizer};
use crate::services::progress::{ProgressSink, ProgressTracker};
use crate::services::roster::{RosterCache, RosterSource};
use crate::services::row_compiler::RowCompiler;
use image::DynamicImage;
use std::time::Instant;

/// Progress once normalization and extraction are done
const EXTRACTED_PERCENT: u8 = 5;
/// Progress once every cell is recognized
const RECOGNIZED_PERCENT: u8 = 95;

/// Runs Normalize → Extract → Recognize → Compile → Resolve for one request
pub struct PipelineOrchestrator<'a, E: OcrEngine, S: RosterSource> {
    config: &'a AppConfig,
    engine: &'a E,
    roster: &'a S,
    cache: &'a RosterCache,
    template_override: Option<RegionTemplate>,
}

impl<'a, E: OcrEngine, S: RosterSource> PipelineOrchestrator<'a, E, S> {
    pub fn new(config: &'a AppConfig, engine: &'a E, roster: &'a S, cache: &'a RosterCache) -> Self {
        Self {
            config,
            engine,
            roster,
            cache,
            template_override: None,
        }
    }

    /// Use `template` instead of the configured one for its title
    pub fn with_template(mut self, template: RegionTemplate) -> Self {
        self.template_override = Some(template);
        self
    }

    fn template(&self, title: GameTitle) -> Result<RegionTemplate, TemplateError> {
        match &self.template_override {
            Some(template) if template.title == title => {
                template.validate()?;
                Ok(template.clone())
            }
            _ => RegionTemplate::for_title(title, self.config.templates.directory.as_deref()),
        }
    }

    /// Compile the records of one scoreboard
    pub async fn compile(
        &self,
        title: GameTitle,
        images: Vec<DynamicImage>,
        match_context: Option<&MatchContext>,
        progress: &ProgressSink<'_>,
    ) -> Result<Vec<PlayerStatRecord>, PipelineError> {
        let records = self
            .compile_while(title, images, match_context, progress, || true)
            .await?;
        Ok(records.unwrap_or_default())
    }

    /// Like [`compile`](Self::compile), but checks `still_wanted` between
    /// stages and returns `Ok(None)` as soon as it turns false.
    pub async fn compile_while(
        &self,
        title: GameTitle,
        images: Vec<DynamicImage>,
        match_context: Option<&MatchContext>,
        progress: &ProgressSink<'_>,
        still_wanted: impl Fn() -> bool + Send,
    ) -> Result<Option<Vec<PlayerStatRecord>>, PipelineError> {
        let started = Instant::now();
        let tracker = ProgressTracker::new(progress);
        let template = self.template(title)?;

        tracing::info!(%title, images = images.len(), version = template.version, "Compiling scoreboard");

        // Normalize (CPU-bound)
        let normalizer = ImageNormalizer::new(self.config.preprocessing.clone());
        let blocking_template = template.clone();
        let normalized = tokio::task::spawn_blocking(move || {
            normalizer.normalize_all(&images, &blocking_template)
        })
        .await
        .map_err(|e| PipelineError::Task(format!("Normalization task failed: {}", e)))??;

        // Extract
        let cells = CellExtractor::new(&template).extract(&normalized)?;
        tracker.report(EXTRACTED_PERCENT);
        tracing::info!(cells = cells.len(), "Extracted cells");
        if !still_wanted() {
            tracing::info!(%title, "Run superseded after extraction");
            return Ok(None);
        }

        // Recognize
        let recognized = TextRecognizer::new(self.engine, &self.config.recognition)
            .recognize_all(&cells, &tracker.stage(EXTRACTED_PERCENT, RECOGNIZED_PERCENT))
            .await?;
        if !still_wanted() {
            tracing::info!(%title, "Run superseded after recognition");
            return Ok(None);
        }

        // Compile
        let column_map = template.column_map();
        let records = RowCompiler::new(&column_map).compile(&recognized);

        // Resolve
        let records = EntityResolver::new(self.roster, self.cache)
            .resolve(title, match_context, records)
            .await?;
        if !still_wanted() {
            tracing::info!(%title, "Run superseded after resolution");
            return Ok(None);
        }

        tracker.report(100);
        tracing::info!(
            %title,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scoreboard compiled"
        );
        Ok(Some(records))
    }
}
