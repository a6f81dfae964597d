use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported game titles. Also used as the roster platform key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GameTitle {
    /// Single scoreboard image, 9 columns
    TacticalShooter,
    /// Equipment + data screenshots, 10 columns split 6/4
    Moba,
}

impl GameTitle {
    /// Number of screenshots a compile request must supply
    pub fn image_count(self) -> usize {
        match self {
            GameTitle::TacticalShooter => 1,
            GameTitle::Moba => 2,
        }
    }

    /// Number of scoreboard columns
    pub fn column_count(self) -> usize {
        self.column_map().len()
    }

    /// Positional column → field map. Immutable per title.
    pub fn column_map(self) -> &'static [StatField] {
        use StatField::*;
        match self {
            GameTitle::TacticalShooter => &[
                Name,
                CombatScore,
                Kills,
                Deaths,
                Assists,
                EconRating,
                FirstBloods,
                Plants,
                Defuses,
            ],
            GameTitle::Moba => &[
                Name,
                Kills,
                Deaths,
                Assists,
                Gold,
                Rating,
                HeroDamage,
                DamageTaken,
                TowerDamage,
                Healing,
            ],
        }
    }

    /// Whether team membership is read from a prefix in the name cell
    pub fn discovers_teams_from_text(self) -> bool {
        matches!(self, GameTitle::TacticalShooter)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameTitle::TacticalShooter => "tactical_shooter",
            GameTitle::Moba => "moba",
        }
    }
}

impl fmt::Display for GameTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which team block of the scoreboard a row belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Rows `0..rows_per_side` are left, the rest right
    pub fn of_row(row: usize, rows_per_side: usize) -> Self {
        if row < rows_per_side {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// A statistic column of a scoreboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    Name,
    CombatScore,
    Kills,
    Deaths,
    Assists,
    EconRating,
    FirstBloods,
    Plants,
    Defuses,
    Gold,
    Rating,
    HeroDamage,
    DamageTaken,
    TowerDamage,
    Healing,
}

impl StatField {
    pub fn is_numeric(self) -> bool {
        !matches!(self, StatField::Name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_counts_are_fixed() {
        assert_eq!(GameTitle::TacticalShooter.column_count(), 9);
        assert_eq!(GameTitle::Moba.column_count(), 10);
        assert_eq!(GameTitle::TacticalShooter.image_count(), 1);
        assert_eq!(GameTitle::Moba.image_count(), 2);
    }

    #[test]
    fn test_column_zero_is_name() {
        for title in [GameTitle::TacticalShooter, GameTitle::Moba] {
            let map = title.column_map();
            assert_eq!(map[0], StatField::Name);
            assert!(map[1..].iter().all(|f| f.is_numeric()));
        }
    }

    #[test]
    fn test_side_of_row() {
        assert_eq!(Side::of_row(0, 5), Side::Left);
        assert_eq!(Side::of_row(4, 5), Side::Left);
        assert_eq!(Side::of_row(5, 5), Side::Right);
        assert_eq!(Side::of_row(9, 5), Side::Right);
    }

    #[test]
    fn test_title_serialization() {
        assert_eq!(
            serde_json::to_string(&GameTitle::TacticalShooter).unwrap(),
            "\"tactical_shooter\""
        );
        assert_eq!(serde_json::to_string(&StatField::FirstBloods).unwrap(), "\"first_bloods\"");
    }
}
