use crate::error::PipelineError;
use crate::models::config::AppConfig;
use crate::models::game::GameTitle;
use crate::models::roster::MatchContext;
use crate::models::stat_record::PlayerStatRecord;
use crate::models::template::RegionTemplate;
use crate::services::image_loader::{self, ImageInput};
use crate::services::ocr::OcrEngine;
use crate::services::pipeline::PipelineOrchestrator;
use crate::services::progress::ProgressSink;
use crate::services::roster::{RosterCache, RosterSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// One statistics submission: screenshots of a finished match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    pub title: GameTitle,
    /// Required for titles whose teams are not read from the scoreboard
    #[serde(default)]
    pub match_context: Option<MatchContext>,
    pub images: Vec<ImageInput>,
}

/// Records ready for review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompiledStats {
    pub submission_id: u64,
    pub title: GameTitle,
    pub compiled_at: DateTime<Utc>,
    pub records: Vec<PlayerStatRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileOutcome {
    Completed(CompiledStats),
    /// A newer submission replaced this one; its result was discarded
    Superseded { submission_id: u64 },
}

/// Entry point for statistics submissions.
///
/// Only the latest submission's result is kept; older runs stop at the next
/// stage boundary.
pub struct StatsCompiler<E: OcrEngine, S: RosterSource> {
    config: AppConfig,
    engine: E,
    roster: S,
    cache: RosterCache,
    template_override: Option<RegionTemplate>,
    latest_submission: AtomicU64,
}

impl<E: OcrEngine, S: RosterSource> StatsCompiler<E, S> {
    pub fn new(config: AppConfig, engine: E, roster: S) -> Self {
        Self {
            config,
            engine,
            roster,
            cache: RosterCache::new(),
            template_override: None,
            latest_submission: AtomicU64::new(0),
        }
    }

    /// Compile with `template` instead of the configured one for its title
    pub fn with_template(mut self, template: RegionTemplate) -> Self {
        self.template_override = Some(template);
        self
    }

    pub fn roster_cache(&self) -> &RosterCache {
        &self.cache
    }

    /// Id of the most recent submission (0 before the first)
    pub fn latest_submission(&self) -> u64 {
        self.latest_submission.load(Ordering::SeqCst)
    }

    /// Compile a submission, reporting 0..=100 progress to `progress`.
    ///
    /// Fatal failures are logged with full detail and returned as one
    /// generic message; the caller may resubmit.
    pub async fn submit(
        &self,
        request: CompileRequest,
        progress: &ProgressSink<'_>,
    ) -> Result<CompileOutcome, String> {
        let submission_id = self.latest_submission.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            submission_id,
            title = %request.title,
            images = request.images.len(),
            "Submission received"
        );

        match self.run(submission_id, request, progress).await {
            Ok(Some((title, records))) => {
                tracing::debug!(submission_id, cached_rosters = self.cache.len(), "Submission completed");
                Ok(CompileOutcome::Completed(CompiledStats {
                    submission_id,
                    title,
                    compiled_at: Utc::now(),
                    records,
                }))
            }
            Ok(None) => {
                tracing::info!(submission_id, "Submission superseded, result discarded");
                Ok(CompileOutcome::Superseded { submission_id })
            }
            Err(e) => {
                tracing::error!(submission_id, error = %e, details = ?e, "Compile failed");
                Err(e.user_message().to_string())
            }
        }
    }

    async fn run(
        &self,
        submission_id: u64,
        request: CompileRequest,
        progress: &ProgressSink<'_>,
    ) -> Result<Option<(GameTitle, Vec<PlayerStatRecord>)>, PipelineError> {
        let still_wanted = || self.latest_submission.load(Ordering::SeqCst) == submission_id;

        let images = image_loader::decode_all(&request.images)?;
        if !still_wanted() {
            return Ok(None);
        }

        let mut pipeline = PipelineOrchestrator::new(&self.config, &self.engine, &self.roster, &self.cache);
        if let Some(template) = &self.template_override {
            pipeline = pipeline.with_template(template.clone());
        }

        let records = pipeline
            .compile_while(
                request.title,
                images,
                request.match_context.as_ref(),
                progress,
                still_wanted,
            )
            .await?;

        Ok(records.map(|records| (request.title, records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE_MESSAGE;
    use crate::models::game::StatField;
    use crate::models::rect::CropRect;
    use crate::models::template::{ColumnRegion, SourceRegion, TEMPLATE_VERSION};
    use crate::services::ocr::engine::testing::ScriptedEngine;
    use crate::services::roster::InMemoryRoster;
    use base64::{engine::general_purpose, Engine as _};
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;
    use std::time::Duration;

    fn synthetic_template() -> RegionTemplate {
        RegionTemplate {
            version: TEMPLATE_VERSION,
            title: GameTitle::TacticalShooter,
            reference_width: 120,
            reference_height: 40,
            resize_multiplier: 1.0,
            rows_per_side: 1,
            sources: vec![SourceRegion {
                name: "scoreboard".to_string(),
                board: CropRect::new(0, 0, 120, 40),
            }],
            columns: [StatField::Name, StatField::Kills, StatField::Deaths]
                .iter()
                .enumerate()
                .map(|(i, &field)| ColumnRegion {
                    field,
                    source: 0,
                    left: CropRect::new(i as i32 * 20, 0, 18, 20),
                    right: CropRect::new(60 + i as i32 * 20, 0, 18, 20),
                    y_correction: 0,
                })
                .collect(),
        }
    }

    fn png_bytes() -> Vec<u8> {
        let image = GrayImage::from_pixel(120, 40, Luma([255]));
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png).unwrap();
        buffer
    }

    fn request(images: Vec<ImageInput>) -> CompileRequest {
        CompileRequest {
            title: GameTitle::TacticalShooter,
            match_context: None,
            images,
        }
    }

    fn compiler(engine: ScriptedEngine) -> StatsCompiler<ScriptedEngine, InMemoryRoster> {
        let roster = InMemoryRoster::new()
            .with_team("t1", "Team Alpha", "TeamA")
            .with_player(GameTitle::TacticalShooter, "p1", "t1", "PlayerOne")
            .with_player(GameTitle::TacticalShooter, "p2", "t1", "PlayerTwo");
        StatsCompiler::new(AppConfig::default(), engine, roster).with_template(synthetic_template())
    }

    #[tokio::test]
    async fn test_submit_data_url_completes() {
        let engine = ScriptedEngine::new(&["TeamA PlayerOne", "10", "2", "TeamA PlayerTwo", "7", "5"]);
        let compiler = compiler(engine);
        let url = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png_bytes()));

        let outcome = compiler
            .submit(request(vec![ImageInput::DataUrl(url)]), &|_: u8| {})
            .await
            .unwrap();

        match outcome {
            CompileOutcome::Completed(stats) => {
                assert_eq!(stats.submission_id, 1);
                assert_eq!(stats.title, GameTitle::TacticalShooter);
                assert_eq!(stats.records.len(), 2);
                assert_eq!(stats.records[1].player.as_ref().map(|p| p.id.as_str()), Some("p2"));
                assert!(stats.compiled_at <= Utc::now());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(compiler.roster_cache().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_image_yields_generic_message() {
        let compiler = compiler(ScriptedEngine::new::<&str>(&[]));

        let result = compiler
            .submit(request(vec![ImageInput::DataUrl("not a url".to_string())]), &|_: u8| {})
            .await;

        assert_eq!(result, Err(GENERIC_FAILURE_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_wrong_image_count_yields_generic_message() {
        let compiler = compiler(ScriptedEngine::new::<&str>(&[]));

        let result = compiler
            .submit(
                request(vec![ImageInput::Bytes(png_bytes()), ImageInput::Bytes(png_bytes())]),
                &|_: u8| {},
            )
            .await;

        assert_eq!(result, Err(GENERIC_FAILURE_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_newer_submission_supersedes_older() {
        let texts: Vec<String> = (0..12).map(|i| format!("TeamA PlayerOne {}", i)).collect();
        let engine = ScriptedEngine::new(texts.as_slice()).with_delay(Duration::from_millis(20));
        let compiler = compiler(engine);
        let quiet = |_: u8| {};

        let older = compiler.submit(request(vec![ImageInput::Bytes(png_bytes())]), &quiet);
        let newer = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            compiler
                .submit(request(vec![ImageInput::Bytes(png_bytes())]), &quiet)
                .await
        };
        let (older, newer) = tokio::join!(older, newer);

        assert_eq!(older, Ok(CompileOutcome::Superseded { submission_id: 1 }));
        match newer {
            Ok(CompileOutcome::Completed(stats)) => assert_eq!(stats.submission_id, 2),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(compiler.latest_submission(), 2);
    }

    #[tokio::test]
    async fn test_progress_callback_borrows_local_state() {
        let engine = ScriptedEngine::new(&["TeamA PlayerOne", "10", "2", "TeamA PlayerTwo", "7", "5"]);
        let compiler = compiler(engine);
        let seen = parking_lot::Mutex::new(Vec::new());
        let sink = |p: u8| seen.lock().push(p);

        let outcome = compiler
            .submit(request(vec![ImageInput::Bytes(png_bytes())]), &sink)
            .await
            .unwrap();

        assert!(matches!(outcome, CompileOutcome::Completed(_)));
        let seen = seen.into_inner();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "{:?}", seen);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(CompileOutcome::Superseded { submission_id: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "superseded", "submission_id": 4 }));
    }
}
