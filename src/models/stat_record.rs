use crate::models::game::{Side, StatField};
use crate::models::roster::EntityRef;
use serde::{Deserialize, Serialize};

/// Numeric statistics of one row. Unset fields were unreadable or are not
/// part of the title's layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combat_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kills: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaths: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assists: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub econ_rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_bloods: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defuses: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_damage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_taken: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tower_damage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healing: Option<i64>,
}

impl StatLine {
    fn slot(&mut self, field: StatField) -> Option<&mut Option<i64>> {
        let slot = match field {
            StatField::Name => return None,
            StatField::CombatScore => &mut self.combat_score,
            StatField::Kills => &mut self.kills,
            StatField::Deaths => &mut self.deaths,
            StatField::Assists => &mut self.assists,
            StatField::EconRating => &mut self.econ_rating,
            StatField::FirstBloods => &mut self.first_bloods,
            StatField::Plants => &mut self.plants,
            StatField::Defuses => &mut self.defuses,
            StatField::Gold => &mut self.gold,
            StatField::Rating => &mut self.rating,
            StatField::HeroDamage => &mut self.hero_damage,
            StatField::DamageTaken => &mut self.damage_taken,
            StatField::TowerDamage => &mut self.tower_damage,
            StatField::Healing => &mut self.healing,
        };
        Some(slot)
    }

    /// Set a numeric field. The name column has no slot and is ignored.
    pub fn set(&mut self, field: StatField, value: i64) {
        if let Some(slot) = self.slot(field) {
            *slot = Some(value);
        }
    }

}

/// Non-fatal problem attached to a record for the reviewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordIssue {
    /// Numeric column text could not be parsed; the field is unset
    FieldParse { field: StatField, raw: String },
    /// No known team abbreviation occurs in the name text
    UnresolvedTeam { raw: String },
    /// Several team abbreviations match equally well
    AmbiguousTeam { raw: String, candidates: Vec<EntityRef> },
    /// No roster player matches the name text
    UnresolvedPlayer { raw: String },
    /// Several roster players match; left for manual disambiguation
    AmbiguousPlayer { raw: String, candidates: Vec<EntityRef> },
    /// Several characters match the name text
    AmbiguousCharacter { raw: String, candidates: Vec<EntityRef> },
}

/// Per-player output of the pipeline, editable by a reviewer before persistence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStatRecord {
    /// Scoreboard row index (0-based, left side first)
    pub row: usize,
    pub side: Side,
    /// Name cell text after noise cleanup
    pub raw_name: String,
    pub player: Option<EntityRef>,
    pub team: Option<EntityRef>,
    pub character: Option<EntityRef>,
    pub stats: StatLine,
    /// Recognized text of every cell, in column order
    pub raw_cells: Vec<String>,
    pub issues: Vec<RecordIssue>,
}

impl PlayerStatRecord {
    pub fn new(row: usize, side: Side) -> Self {
        Self {
            row,
            side,
            raw_name: String::new(),
            player: None,
            team: None,
            character: None,
            stats: StatLine::default(),
            raw_cells: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.player.is_some() && self.team.is_some()
    }
}
