//! Fixture Generation
//!
//! Seeds the `Match` records a tournament will later score.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::core::ids::{MatchId, TeamId, TournamentId};
use crate::game::state::{Match, Participant, Sport};

/// Stage label on generated league fixtures.
pub const LEAGUE_STAGE: &str = "League";

/// Placeholder venue until the organiser assigns one.
pub const LOCATION_TBD: &str = "TBD";

/// A team as supplied by the team directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier
    pub id: TeamId,
    /// Display name
    pub name: String,
}

impl Team {
    /// Create a team entry.
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One match per unordered pair of teams.
///
/// Pairs are enumerated in list order (0-1, 0-2, ..., (n-2)-(n-1)); the
/// lower index is the home side. Every fixture shares the same placeholder
/// date, which the caller is expected to redistribute. Fewer than two teams
/// yields an empty list.
pub fn generate_round_robin_matches(
    teams: &[Team],
    tournament_id: &TournamentId,
    sport: Sport,
) -> Vec<Match> {
    if teams.len() < 2 {
        warn!(tournament_id = %tournament_id, teams = teams.len(), "cannot create fixtures with less than 2 teams");
        return Vec::new();
    }

    let now = Utc::now();
    let matches: Vec<Match> = pairings(teams.len())
        .map(|(home, away)| fixture(&teams[home], &teams[away], tournament_id, &sport, now))
        .collect();

    info!(
        tournament_id = %tournament_id,
        teams = teams.len(),
        matches = matches.len(),
        "generated round-robin fixtures"
    );

    matches
}

/// Home-and-away round robin: the single round robin followed by the
/// return fixtures with home and away swapped.
pub fn generate_double_round_robin_matches(
    teams: &[Team],
    tournament_id: &TournamentId,
    sport: Sport,
) -> Vec<Match> {
    let mut matches = generate_round_robin_matches(teams, tournament_id, sport.clone());
    let Some(date) = matches.first().map(|m| m.date) else {
        return matches;
    };

    let return_legs: Vec<Match> = pairings(teams.len())
        .map(|(home, away)| fixture(&teams[away], &teams[home], tournament_id, &sport, date))
        .collect();

    info!(tournament_id = %tournament_id, matches = return_legs.len(), "generated return fixtures");

    matches.extend(return_legs);
    matches
}

/// Index pairs `(i, j)` with `i < j`, in lexicographic order.
fn pairings(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
}

fn fixture(
    home: &Team,
    away: &Team,
    tournament_id: &TournamentId,
    sport: &Sport,
    date: DateTime<Utc>,
) -> Match {
    let mut m = Match::new(
        MatchId::generate(),
        sport.clone(),
        Participant::new(home.id.clone(), home.name.clone()),
        Participant::new(away.id.clone(), away.name.clone()),
        date,
    );
    m.tournament_id = Some(tournament_id.clone());
    m.stage = Some(LEAGUE_STAGE.to_owned());
    m.location = LOCATION_TBD.to_owned();
    m
}
