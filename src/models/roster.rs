use serde::{Deserialize, Serialize};

/// Team as known to the league database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Short tag shown in front of player names on the scoreboard
    pub abbreviation: String,
}

/// Player registered to a team for one platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Player {
    pub id: String,
    pub team_id: String,
    /// Name as displayed in game
    pub in_game_name: String,
}

/// Playable character (agent/hero) of a platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Character {
    pub id: String,
    pub name: String,
}

/// Teams playing the match being compiled; known up front for the MOBA flow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchContext {
    pub home_team_id: String,
    pub away_team_id: String,
}

impl MatchContext {
    pub fn team_ids(&self) -> [&str; 2] {
        [&self.home_team_id, &self.away_team_id]
    }
}

/// Lightweight reference embedded in output records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

impl From<&Team> for EntityRef {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.clone(),
            name: team.name.clone(),
        }
    }
}

impl From<&Player> for EntityRef {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.in_game_name.clone(),
        }
    }
}

impl From<&Character> for EntityRef {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id.clone(),
            name: character.name.clone(),
        }
    }
}
