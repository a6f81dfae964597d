//! Declarative crop geometry for each supported scoreboard.
//!
//! All rectangles are expressed in pixels of the template's reference
//! resolution. Board rectangles are absolute positions in the raw screenshot;
//! column rectangles are relative to the top-left corner of a row inside the
//! cropped board. The normalizer and extractor scale them to the actual image.

use crate::error::TemplateError;
use crate::models::game::{GameTitle, Side, StatField};
use crate::models::rect::CropRect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current template schema version
pub const TEMPLATE_VERSION: u32 = 1;

/// Scoreboard area of one source screenshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRegion {
    pub name: String,
    pub board: CropRect,
}

/// Crop geometry of one scoreboard column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnRegion {
    pub field: StatField,
    /// Index into `RegionTemplate::sources`
    #[serde(default)]
    pub source: usize,
    pub left: CropRect,
    pub right: CropRect,
    /// Vertical correction for label baselines, reference pixels
    #[serde(default)]
    pub y_correction: i32,
}

impl ColumnRegion {
    pub fn rect(&self, side: Side) -> CropRect {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Hand-calibrated crop layout for one title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionTemplate {
    pub version: u32,
    pub title: GameTitle,
    pub reference_width: u32,
    pub reference_height: u32,
    /// Working-resolution multiplier applied after cropping
    pub resize_multiplier: f64,
    pub rows_per_side: u32,
    pub sources: Vec<SourceRegion>,
    pub columns: Vec<ColumnRegion>,
}

impl RegionTemplate {
    /// Built-in template for `title`
    pub fn builtin(title: GameTitle) -> Self {
        match title {
            GameTitle::TacticalShooter => tactical_shooter(),
            GameTitle::Moba => moba(),
        }
    }

    /// Load `<dir>/<title>.json` if present, otherwise the built-in template.
    /// Loaded templates must match the title's fixed column map.
    pub fn for_title(title: GameTitle, dir: Option<&Path>) -> Result<Self, TemplateError> {
        if let Some(dir) = dir {
            let path = dir.join(format!("{}.json", title.as_str()));
            if path.exists() {
                let template = Self::load(&path)?;
                template.validate_for_title()?;
                tracing::info!(path = %path.display(), version = template.version, "Loaded region template");
                return Ok(template);
            }
        }
        Ok(Self::builtin(title))
    }

    /// Read a template from a JSON file
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: display.clone(),
            source,
        })?;
        let template: RegionTemplate =
            serde_json::from_str(&content).map_err(|source| TemplateError::Parse {
                path: display,
                source,
            })?;
        template.validate()?;
        Ok(template)
    }

    pub fn rows(&self) -> usize {
        self.rows_per_side as usize * 2
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_map(&self) -> Vec<StatField> {
        self.columns.iter().map(|c| c.field).collect()
    }

    /// Structural checks that hold for any template, synthetic or shipped
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.version == 0 || self.version > TEMPLATE_VERSION {
            return Err(TemplateError::Invalid("version"));
        }
        if self.reference_width == 0 || self.reference_height == 0 {
            return Err(TemplateError::Invalid("reference resolution"));
        }
        if !(self.resize_multiplier.is_finite() && self.resize_multiplier > 0.0) {
            return Err(TemplateError::Invalid("resize multiplier"));
        }
        if self.rows_per_side == 0 {
            return Err(TemplateError::Invalid("row count"));
        }
        if self.sources.len() != self.title.image_count() {
            return Err(TemplateError::ImageCount {
                title: self.title.to_string(),
                expected: self.title.image_count(),
                actual: self.sources.len(),
            });
        }
        if self.sources.iter().any(|s| !s.board.is_valid()) {
            return Err(TemplateError::Invalid("board rectangle"));
        }
        if self.columns.first().map(|c| c.field) != Some(StatField::Name) {
            return Err(TemplateError::Invalid("column map (column 0 must be the name)"));
        }
        for (column, region) in self.columns.iter().enumerate() {
            if region.source >= self.sources.len() {
                return Err(TemplateError::UnknownSource {
                    column,
                    source_index: region.source,
                    sources: self.sources.len(),
                });
            }
            if !region.left.is_valid() || !region.right.is_valid() {
                return Err(TemplateError::EmptyRect { column });
            }
        }
        Ok(())
    }

    /// `validate` plus the title's fixed column map
    pub fn validate_for_title(&self) -> Result<(), TemplateError> {
        self.validate()?;
        let expected = self.title.column_map();
        if self.columns.len() != expected.len() {
            return Err(TemplateError::ColumnCount {
                title: self.title.to_string(),
                expected: expected.len(),
                actual: self.columns.len(),
            });
        }
        if self.column_map() != expected {
            return Err(TemplateError::Invalid("column map"));
        }
        Ok(())
    }
}

/// Columns sharing one vertical band; right side mirrors left by `right_shift`
#[allow(clippy::too_many_arguments)]
fn column(
    field: StatField,
    source: usize,
    x: i32,
    width: u32,
    y: i32,
    height: u32,
    right_shift: i32,
    y_correction: i32,
) -> ColumnRegion {
    let left = CropRect::new(x, y, width, height);
    ColumnRegion {
        field,
        source,
        left,
        right: left.translated(right_shift, 0),
        y_correction,
    }
}

// 1920x1080 reference. Board is 1320x400, two 660px team blocks, 80px rows.
fn tactical_shooter() -> RegionTemplate {
    use StatField::*;
    const SHIFT: i32 = 660;

    RegionTemplate {
        version: TEMPLATE_VERSION,
        title: GameTitle::TacticalShooter,
        reference_width: 1920,
        reference_height: 1080,
        resize_multiplier: 2.0,
        rows_per_side: 5,
        sources: vec![SourceRegion {
            name: "scoreboard".to_string(),
            board: CropRect::new(300, 330, 1320, 400),
        }],
        columns: vec![
            column(Name, 0, 10, 170, 22, 36, SHIFT, 0),
            column(CombatScore, 0, 190, 60, 26, 30, SHIFT, 0),
            column(Kills, 0, 260, 40, 26, 30, SHIFT, 0),
            column(Deaths, 0, 305, 40, 26, 30, SHIFT, 0),
            column(Assists, 0, 350, 40, 26, 30, SHIFT, 0),
            column(EconRating, 0, 395, 50, 26, 30, SHIFT, 0),
            column(FirstBloods, 0, 450, 40, 26, 30, SHIFT, 0),
            column(Plants, 0, 495, 40, 24, 32, SHIFT, 0),
            column(Defuses, 0, 540, 40, 24, 32, SHIFT, 0),
        ],
    }
}

// 1920x1080 reference. Both screenshots share a 1520x600 board, 120px rows.
// Data-screen labels sit lower than the equipment screen's, hence the corrections.
fn moba() -> RegionTemplate {
    use StatField::*;
    const SHIFT: i32 = 760;

    RegionTemplate {
        version: TEMPLATE_VERSION,
        title: GameTitle::Moba,
        reference_width: 1920,
        reference_height: 1080,
        resize_multiplier: 1.5,
        rows_per_side: 5,
        sources: vec![
            SourceRegion {
                name: "equipment".to_string(),
                board: CropRect::new(200, 250, 1520, 600),
            },
            SourceRegion {
                name: "data".to_string(),
                board: CropRect::new(200, 250, 1520, 600),
            },
        ],
        columns: vec![
            column(Name, 0, 10, 200, 20, 40, SHIFT, 0),
            column(Kills, 0, 260, 40, 30, 34, SHIFT, 4),
            column(Deaths, 0, 310, 40, 30, 34, SHIFT, 4),
            column(Assists, 0, 360, 40, 30, 34, SHIFT, 4),
            column(Gold, 0, 420, 80, 30, 34, SHIFT, 2),
            column(Rating, 0, 520, 60, 30, 34, SHIFT, 0),
            column(HeroDamage, 1, 30, 110, 40, 36, SHIFT, -6),
            column(DamageTaken, 1, 160, 110, 40, 36, SHIFT, -6),
            column(TowerDamage, 1, 290, 110, 40, 36, SHIFT, -8),
            column(Healing, 1, 420, 110, 40, 36, SHIFT, -8),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_are_valid_for_their_title() {
        for title in [GameTitle::TacticalShooter, GameTitle::Moba] {
            let template = RegionTemplate::builtin(title);
            template
                .validate_for_title()
                .unwrap_or_else(|e| panic!("{} template invalid: {}", title, e));
            assert_eq!(template.rows(), 10);
        }
    }

    #[test]
    fn test_moba_columns_split_six_four() {
        let template = RegionTemplate::builtin(GameTitle::Moba);
        let equipment = template.columns.iter().filter(|c| c.source == 0).count();
        let data = template.columns.iter().filter(|c| c.source == 1).count();
        assert_eq!((equipment, data), (6, 4));
        assert!(template.columns[..6].iter().all(|c| c.source == 0));
    }

    #[test]
    fn test_column_rects_fit_inside_a_row() {
        for title in [GameTitle::TacticalShooter, GameTitle::Moba] {
            let template = RegionTemplate::builtin(title);
            for source in &template.sources {
                let row_height = source.board.height / template.rows_per_side;
                for c in &template.columns {
                    for side in [Side::Left, Side::Right] {
                        let rect = c.rect(side).translated(0, c.y_correction);
                        assert!(
                            rect.fits_within(source.board.width, row_height),
                            "{:?} {:?} of {} overflows its row",
                            c.field,
                            side,
                            title
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_source_index() {
        let mut template = RegionTemplate::builtin(GameTitle::TacticalShooter);
        template.columns[3].source = 1;
        assert!(matches!(
            template.validate(),
            Err(TemplateError::UnknownSource { column: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_source_count() {
        let mut template = RegionTemplate::builtin(GameTitle::Moba);
        template.sources.pop();
        template.columns.retain(|c| c.source == 0);
        assert!(matches!(
            template.validate(),
            Err(TemplateError::ImageCount { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_validate_for_title_rejects_reordered_columns() {
        let mut template = RegionTemplate::builtin(GameTitle::TacticalShooter);
        template.columns.swap(2, 3);
        assert!(template.validate().is_ok());
        assert!(template.validate_for_title().is_err());
    }

    #[test]
    fn test_template_file_round_trip_and_override() {
        let dir = std::env::temp_dir().join(format!("scoreboard-template-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let mut template = RegionTemplate::builtin(GameTitle::TacticalShooter);
        template.resize_multiplier = 3.0;
        let path = dir.join("tactical_shooter.json");
        fs::write(&path, serde_json::to_string_pretty(&template).unwrap()).unwrap();

        let loaded = RegionTemplate::for_title(GameTitle::TacticalShooter, Some(&dir)).unwrap();
        assert_eq!(loaded, template);

        // No override file for this title: built-in
        let moba = RegionTemplate::for_title(GameTitle::Moba, Some(&dir)).unwrap();
        assert_eq!(moba, RegionTemplate::builtin(GameTitle::Moba));

        let _ = fs::remove_dir_all(&dir);
    }
}
