use crate::error::RosterError;
use crate::models::game::GameTitle;
use crate::models::roster::{Character, Player, Team};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// League database lookups needed to resolve scoreboard names
pub trait RosterSource: Send + Sync {
    /// Every team known to the league
    fn teams(&self) -> impl Future<Output = Result<Vec<Team>, RosterError>> + Send;

    fn team_by_id(&self, id: &str) -> impl Future<Output = Result<Option<Team>, RosterError>> + Send;

    /// Players registered to `team_id` for `platform`
    fn players(
        &self,
        team_id: &str,
        platform: GameTitle,
    ) -> impl Future<Output = Result<Vec<Player>, RosterError>> + Send;

    fn characters(
        &self,
        platform: GameTitle,
    ) -> impl Future<Output = Result<Vec<Character>, RosterError>> + Send;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformPlayer {
    pub platform: GameTitle,
    #[serde(flatten)]
    pub player: Player,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCharacter {
    pub platform: GameTitle,
    #[serde(flatten)]
    pub character: Character,
}

/// Roster held in memory, typically loaded from a JSON export
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InMemoryRoster {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub players: Vec<PlatformPlayer>,
    #[serde(default)]
    pub characters: Vec<PlatformCharacter>,
    #[serde(skip)]
    player_fetches: AtomicUsize,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a roster export
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let load_error = |source: Box<dyn std::error::Error + Send + Sync>| RosterError::Load {
            path: path.display().to_string(),
            source,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_error(Box::new(e)))?;
        let roster: Self = serde_json::from_str(&content).map_err(|e| load_error(Box::new(e)))?;

        tracing::debug!(
            path = %path.display(),
            teams = roster.teams.len(),
            players = roster.players.len(),
            "Roster loaded"
        );
        Ok(roster)
    }

    pub fn with_team(mut self, id: &str, name: &str, abbreviation: &str) -> Self {
        self.teams.push(Team {
            id: id.to_string(),
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        });
        self
    }

    pub fn with_player(mut self, platform: GameTitle, id: &str, team_id: &str, in_game_name: &str) -> Self {
        self.players.push(PlatformPlayer {
            platform,
            player: Player {
                id: id.to_string(),
                team_id: team_id.to_string(),
                in_game_name: in_game_name.to_string(),
            },
        });
        self
    }

    pub fn with_character(mut self, platform: GameTitle, id: &str, name: &str) -> Self {
        self.characters.push(PlatformCharacter {
            platform,
            character: Character {
                id: id.to_string(),
                name: name.to_string(),
            },
        });
        self
    }

    /// Number of `players` lookups served so far
    pub fn player_fetches(&self) -> usize {
        self.player_fetches.load(Ordering::SeqCst)
    }
}

impl RosterSource for InMemoryRoster {
    async fn teams(&self) -> Result<Vec<Team>, RosterError> {
        Ok(self.teams.clone())
    }

    async fn team_by_id(&self, id: &str) -> Result<Option<Team>, RosterError> {
        Ok(self.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn players(&self, team_id: &str, platform: GameTitle) -> Result<Vec<Player>, RosterError> {
        self.player_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .players
            .iter()
            .filter(|p| p.platform == platform && p.player.team_id == team_id)
            .map(|p| p.player.clone())
            .collect())
    }

    async fn characters(&self, platform: GameTitle) -> Result<Vec<Character>, RosterError> {
        Ok(self
            .characters
            .iter()
            .filter(|c| c.platform == platform)
            .map(|c| c.character.clone())
            .collect())
    }
}

type RosterKey = (String, GameTitle);

/// Process-wide cache of team rosters keyed by (team id, platform)
#[derive(Default)]
pub struct RosterCache {
    players: RwLock<HashMap<RosterKey, Arc<Vec<Player>>>>,
}

impl RosterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached roster, or fetch it from `source` and remember it
    pub async fn get_or_fetch<S: RosterSource>(
        &self,
        source: &S,
        team_id: &str,
        platform: GameTitle,
    ) -> Result<Arc<Vec<Player>>, RosterError> {
        let key = (team_id.to_string(), platform);
        let cached = self.players.read().get(&key).cloned();
        if let Some(players) = cached {
            tracing::debug!(team_id, %platform, "Roster cache hit");
            return Ok(players);
        }

        let fetched = Arc::new(source.players(team_id, platform).await?);
        tracing::debug!(team_id, %platform, players = fetched.len(), "Roster fetched");

        let mut players = self.players.write();
        Ok(Arc::clone(players.entry(key).or_insert(fetched)))
    }

    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.read().is_empty()
    }
}
