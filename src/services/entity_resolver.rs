//! Maps raw scoreboard names onto league entities.
//!
//! Resolution runs in three steps over explicit per-run state:
//! discovery of the participating teams, one batch fetch of their rosters,
//! then a single ordered pass over the records. Nothing here ever fails on
//! a name; unresolved or ambiguous names become record issues.

use crate::error::RosterError;
use crate::models::game::GameTitle;
use crate::models::roster::{Character, EntityRef, MatchContext, Player, Team};
use crate::models::stat_record::{PlayerStatRecord, RecordIssue};
use crate::services::ocr::parser::{clean_name_text, match_key};
use crate::services::roster::{RosterCache, RosterSource};
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of looking for a team abbreviation in one name
#[derive(Debug, Clone, PartialEq)]
pub enum TeamMatch {
    Unmatched,
    Unique(Team),
    Ambiguous(Vec<EntityRef>),
}

/// Teams and rosters gathered for one compile run
#[derive(Debug)]
pub struct ResolutionContext {
    title: GameTitle,
    teams: Vec<Team>,
    rosters: HashMap<String, Arc<Vec<Player>>>,
    characters: Vec<Character>,
}

impl ResolutionContext {
    pub fn new(title: GameTitle) -> Self {
        Self {
            title,
            teams: Vec::new(),
            rosters: HashMap::new(),
            characters: Vec::new(),
        }
    }

    /// Discovered teams, in discovery order
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn roster(&self, team_id: &str) -> Option<&[Player]> {
        self.rosters.get(team_id).map(|r| r.as_slice())
    }

    /// Add a team once; later sightings are ignored
    fn discover(&mut self, team: &Team) {
        if !self.teams.iter().any(|t| t.id == team.id) {
            tracing::debug!(team_id = %team.id, abbreviation = %team.abbreviation, "Discovered team");
            self.teams.push(team.clone());
        }
    }

    fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    fn resolve_player(&self, record: &mut PlayerStatRecord, candidates: Vec<&Player>) {
        match candidates.as_slice() {
            [] => record.issues.push(RecordIssue::UnresolvedPlayer {
                raw: record.raw_name.clone(),
            }),
            [player] => {
                record.player = Some(EntityRef::from(*player));
                if record.team.is_none() {
                    record.team = self.team(&player.team_id).map(EntityRef::from);
                }
            }
            several => record.issues.push(RecordIssue::AmbiguousPlayer {
                raw: record.raw_name.clone(),
                candidates: several.iter().map(|p| EntityRef::from(*p)).collect(),
            }),
        }
    }

    /// Look for a character name in what is left of the name cell once the
    /// team tag and the player's in-game name are taken out. Records without
    /// a resolved player are skipped.
    fn resolve_character(&self, record: &mut PlayerStatRecord) {
        if record.character.is_some() {
            return;
        }
        let Some(player) = &record.player else {
            return;
        };

        let mut remainder = match_key(&record.raw_name);
        if let Some(team) = record.team.as_ref().and_then(|t| self.team(&t.id)) {
            let tag = match_key(&team.abbreviation);
            if let Some(rest) = remainder.strip_prefix(tag.as_str()) {
                remainder = rest.to_string();
            }
        }
        let player_key = match_key(&player.name);
        if !player_key.is_empty() {
            remainder = remainder.replacen(player_key.as_str(), "", 1);
        }

        let matches: Vec<&Character> = self
            .characters
            .iter()
            .filter(|c| key_contains(&remainder, &c.name))
            .collect();

        match matches.as_slice() {
            [] => {}
            [character] => record.character = Some(EntityRef::from(*character)),
            several => record.issues.push(RecordIssue::AmbiguousCharacter {
                raw: record.raw_name.clone(),
                candidates: several.iter().map(|c| EntityRef::from(*c)).collect(),
            }),
        }
    }
}

/// `name` reduced to its match key is a non-empty substring of `haystack_key`
fn key_contains(haystack_key: &str, name: &str) -> bool {
    let key = match_key(name);
    !key.is_empty() && haystack_key.contains(&key)
}

/// Name cell as compared against team tags: cleaned and lowercased, spaces kept
pub fn team_text(raw_name: &str) -> String {
    clean_name_text(raw_name).to_lowercase()
}

fn team_tag(team: &Team) -> String {
    team.abbreviation.trim().to_lowercase()
}

/// Find the team whose abbreviation occurs in `name_text` (see [`team_text`]).
/// Prefix matches win over matches further into the name.
pub fn match_team(known: &[Team], name_text: &str) -> TeamMatch {
    let matches: Vec<(&Team, bool)> = known
        .iter()
        .filter_map(|team| {
            let tag = team_tag(team);
            if tag.is_empty() || !name_text.contains(&tag) {
                return None;
            }
            Some((team, name_text.starts_with(&tag)))
        })
        .collect();

    let any_prefix = matches.iter().any(|(_, prefix)| *prefix);
    let winners: Vec<&Team> = matches
        .into_iter()
        .filter(|(_, prefix)| *prefix || !any_prefix)
        .map(|(team, _)| team)
        .collect();

    match winners.as_slice() {
        [] => TeamMatch::Unmatched,
        [team] => TeamMatch::Unique((*team).clone()),
        several => TeamMatch::Ambiguous(several.iter().map(|t| EntityRef::from(*t)).collect()),
    }
}

/// Match key of the name text with the team's abbreviation taken out once
fn strip_abbreviation(name_text: &str, team: &Team) -> String {
    let tag = team_tag(team);
    match name_text.strip_prefix(tag.as_str()) {
        Some(rest) => match_key(rest),
        None => match_key(&name_text.replacen(tag.as_str(), "", 1)),
    }
}

pub struct EntityResolver<'a, S: RosterSource> {
    source: &'a S,
    cache: &'a RosterCache,
}

impl<'a, S: RosterSource> EntityResolver<'a, S> {
    pub fn new(source: &'a S, cache: &'a RosterCache) -> Self {
        Self { source, cache }
    }

    /// Resolve team, player and character of every record, in order.
    ///
    /// Fields that are already set are left untouched.
    pub async fn resolve(
        &self,
        title: GameTitle,
        match_context: Option<&MatchContext>,
        mut records: Vec<PlayerStatRecord>,
    ) -> Result<Vec<PlayerStatRecord>, RosterError> {
        let mut context = ResolutionContext::new(title);

        let team_matches = if title.discovers_teams_from_text() {
            self.discover_from_names(&mut context, &records).await?
        } else {
            self.discover_from_match(&mut context, match_context).await?;
            Vec::new()
        };

        self.fetch_rosters(&mut context).await?;
        context.characters = self.source.characters(title).await?;

        for (index, record) in records.iter_mut().enumerate() {
            match team_matches.get(index) {
                Some(team_match) => Self::resolve_by_prefix(&context, record, team_match),
                None => Self::resolve_by_roster(&context, record),
            }
            context.resolve_character(record);
        }

        let resolved = records.iter().filter(|r| r.is_fully_resolved()).count();
        tracing::info!(
            %title,
            records = records.len(),
            resolved,
            teams = context.teams.len(),
            "Entity resolution finished"
        );
        Ok(records)
    }

    /// Teams named by an abbreviation prefix in the name cells
    async fn discover_from_names(
        &self,
        context: &mut ResolutionContext,
        records: &[PlayerStatRecord],
    ) -> Result<Vec<TeamMatch>, RosterError> {
        let known = self.source.teams().await?;

        let matches: Vec<TeamMatch> = records
            .iter()
            .map(|record| {
                let preset = record
                    .team
                    .as_ref()
                    .and_then(|t| known.iter().find(|k| k.id == t.id));
                match preset {
                    Some(team) => TeamMatch::Unique(team.clone()),
                    None => match_team(&known, &team_text(&record.raw_name)),
                }
            })
            .collect();

        for team_match in &matches {
            if let TeamMatch::Unique(team) = team_match {
                context.discover(team);
            }
        }

        Ok(matches)
    }

    /// Both teams of the match, known up front
    async fn discover_from_match(
        &self,
        context: &mut ResolutionContext,
        match_context: Option<&MatchContext>,
    ) -> Result<(), RosterError> {
        let match_context = match_context.ok_or_else(|| RosterError::MissingMatchContext {
            title: context.title.to_string(),
        })?;

        for team_id in match_context.team_ids() {
            let team = self
                .source
                .team_by_id(team_id)
                .await?
                .ok_or_else(|| RosterError::UnknownTeam(team_id.to_string()))?;
            context.discover(&team);
        }

        Ok(())
    }

    /// Load every discovered team's roster before any player is resolved
    async fn fetch_rosters(&self, context: &mut ResolutionContext) -> Result<(), RosterError> {
        for team in &context.teams {
            let roster = self
                .cache
                .get_or_fetch(self.source, &team.id, context.title)
                .await?;
            context.rosters.insert(team.id.clone(), roster);
        }
        Ok(())
    }

    fn resolve_by_prefix(context: &ResolutionContext, record: &mut PlayerStatRecord, team_match: &TeamMatch) {
        let team = match team_match {
            TeamMatch::Unique(team) => team,
            TeamMatch::Unmatched => {
                record.issues.push(RecordIssue::UnresolvedTeam {
                    raw: record.raw_name.clone(),
                });
                if record.player.is_none() {
                    record.issues.push(RecordIssue::UnresolvedPlayer {
                        raw: record.raw_name.clone(),
                    });
                }
                return;
            }
            TeamMatch::Ambiguous(candidates) => {
                record.issues.push(RecordIssue::AmbiguousTeam {
                    raw: record.raw_name.clone(),
                    candidates: candidates.clone(),
                });
                if record.player.is_none() {
                    record.issues.push(RecordIssue::UnresolvedPlayer {
                        raw: record.raw_name.clone(),
                    });
                }
                return;
            }
        };

        if record.team.is_none() {
            record.team = Some(EntityRef::from(team));
        }
        if record.player.is_some() {
            return;
        }

        let remainder = strip_abbreviation(&team_text(&record.raw_name), team);
        let candidates: Vec<&Player> = context
            .roster(&team.id)
            .unwrap_or_default()
            .iter()
            .filter(|p| key_contains(&remainder, &p.in_game_name))
            .collect();
        context.resolve_player(record, candidates);
    }

    fn resolve_by_roster(context: &ResolutionContext, record: &mut PlayerStatRecord) {
        if record.player.is_some() {
            return;
        }

        let name_key = match_key(&record.raw_name);
        let candidates: Vec<&Player> = context
            .teams
            .iter()
            .filter_map(|t| context.roster(&t.id))
            .flatten()
            .filter(|p| key_contains(&name_key, &p.in_game_name))
            .collect();
        context.resolve_player(record, candidates);
    }
}
