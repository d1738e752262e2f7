//! Score Engine
//!
//! Folds one `ScoreEvent` into a `Match` and returns the new value.
//! The input match is never mutated; callers replace their stored copy
//! with the returned one.
//!
//! The engine is permissive: unknown players get a zero-valued stats row,
//! fields that do not apply to the sport are ignored, and nothing here
//! returns an error. Use `game::roster::validate_event` upstream for
//! strict checking.

use tracing::{debug, info, warn};

use crate::core::ids::{PlayerId, TeamId};
use crate::game::events::{CardType, DismissalType, EventType, ScoreEvent};
use crate::game::state::{Match, MatchStatus, PlayerStats, Side, Sport, TeamResult, BALLS_PER_OVER};

/// A stats row created lazily while applying an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPlayer {
    /// Team the row was created under
    pub team_id: TeamId,
    /// Player that had no prior record
    pub player_id: PlayerId,
}

/// Result of applying one event.
#[derive(Clone, Debug)]
pub struct Applied {
    /// Updated match
    pub state: Match,
    /// Stats rows created by this event, in creation order
    pub new_players: Vec<NewPlayer>,
}

/// Apply an event and return the updated match.
pub fn apply_event(current: &Match, event: &ScoreEvent) -> Match {
    apply(current, event).state
}

/// Apply an event, also reporting any lazily created players.
pub fn apply(current: &Match, event: &ScoreEvent) -> Applied {
    if current.status.is_terminal() {
        warn!(
            match_id = %current.id,
            status = ?current.status,
            event_id = %event.id,
            "applying event to a match in a terminal status"
        );
    }

    let mut next = current.clone();
    let mut new_players = Vec::new();

    match next.sport {
        Sport::Football => apply_football(&mut next, event, &mut new_players),
        _ => apply_cricket(&mut next, event, &mut new_players),
    }

    next.events.insert(0, event.clone());

    debug!(
        match_id = %next.id,
        event_id = %event.id,
        event_type = ?event.event_type,
        points = event.points,
        home = next.home_team.score,
        away = next.away_team.score,
        "event applied"
    );

    Applied { state: next, new_players }
}

/// Resolve the acting side: event team, then current batting team, then home.
fn acting_side(state: &Match, event: &ScoreEvent) -> Side {
    let Some(team_id) = event.team_id.as_ref().or(state.current_batting_team_id.as_ref()) else {
        return Side::Home;
    };

    state.side_of(team_id).unwrap_or_else(|| {
        warn!(match_id = %state.id, team_id = %team_id, "team is not a participant, defaulting to home");
        Side::Home
    })
}

/// Fetch-or-create a stats row and record the creation.
fn touch_player<'a>(
    state: &'a mut Match,
    side: Side,
    player_id: &PlayerId,
    new_players: &mut Vec<NewPlayer>,
) -> &'a mut PlayerStats {
    let match_id = state.id.clone();
    let team = state.participant_mut(side);
    let team_id = team.id.clone();
    let (stats, created) = team.player_entry(player_id);

    if created {
        info!(
            match_id = %match_id,
            team_id = %team_id,
            player_id = %player_id,
            "player not on scorecard, created new stats row"
        );
        new_players.push(NewPlayer {
            team_id,
            player_id: player_id.clone(),
        });
    }

    stats
}

// =============================================================================
// FOOTBALL
// =============================================================================

fn apply_football(state: &mut Match, event: &ScoreEvent, new_players: &mut Vec<NewPlayer>) {
    let side = acting_side(state, event);

    match event.event_type {
        EventType::Goal => {
            state.participant_mut(side).score += 1;
            if let Some(scorer) = &event.scorer_id {
                touch_player(state, side, scorer, new_players).goals += 1;
            }
        }
        EventType::Card => {
            if let Some(player) = &event.scorer_id {
                match event.card_type {
                    Some(CardType::Yellow) => touch_player(state, side, player, new_players).yellow_cards += 1,
                    Some(CardType::Red) => touch_player(state, side, player, new_players).red_cards += 1,
                    // unrecognised or missing colour, nothing to count
                    Some(CardType::Other) | None => {}
                }
            }
        }
        _ => {}
    }

    if let Some(assist) = &event.assist_id {
        touch_player(state, side, assist, new_players).assists += 1;
    }
}

// =============================================================================
// CRICKET
// =============================================================================

fn apply_cricket(state: &mut Match, event: &ScoreEvent, new_players: &mut Vec<NewPlayer>) {
    let batting = acting_side(state, event);
    let bowling = batting.other();

    let legal = !event.is_illegal_delivery();
    let bat_runs = event.bat_runs();

    // 1. Team score
    {
        let team = state.participant_mut(batting);
        team.score += event.points;
        if event.is_wicket {
            team.wickets += 1;
        }

        // 2. Legal delivery counts toward the over
        if legal {
            team.balls += 1;
            team.overs = team.balls / BALLS_PER_OVER;
        }
    }

    // 3. Batter
    if let Some(batter) = &event.batter_id {
        let stats = touch_player(state, batting, batter, new_players);
        stats.runs += bat_runs;
        if legal {
            stats.balls += 1;
        }
    }

    // 4. Bowler (byes and leg-byes are not charged)
    if let Some(bowler) = &event.bowler_id {
        let charged_extras = match event.extras {
            Some(extras) if extras.kind.is_illegal_delivery() => extras.runs,
            _ => 0,
        };
        let run_out = event
            .dismissal
            .as_ref()
            .is_some_and(|d| d.kind == DismissalType::RunOut);

        let stats = touch_player(state, bowling, bowler, new_players);
        stats.runs_conceded += bat_runs + charged_extras;
        if legal {
            stats.balls_bowled += 1;
        }
        if event.is_wicket && !run_out {
            stats.wickets += 1;
        }
    }

    // 5. Fielder
    if let Some(dismissal) = &event.dismissal {
        if let Some(fielder) = &dismissal.fielder_id {
            let stats = touch_player(state, bowling, fielder, new_players);
            match dismissal.kind {
                DismissalType::Caught => stats.catches += 1,
                DismissalType::RunOut => stats.runouts += 1,
                _ => {}
            }
        }
    }

    // 6. Live state
    let live = state.live_state.get_or_insert_with(Default::default);

    if let Some(batter) = &event.batter_id {
        live.striker_id = Some(batter.clone());
    }
    if let Some(non_striker) = &event.non_striker_id {
        live.non_striker_id = Some(non_striker.clone());
    }
    if let Some(bowler) = &event.bowler_id {
        live.bowler_id = Some(bowler.clone());
    }

    if bat_runs % 2 == 1 {
        live.rotate_strike();
    }

    if legal {
        live.balls_in_current_over += 1;
        if live.balls_in_current_over >= BALLS_PER_OVER {
            live.current_over += 1;
            live.balls_in_current_over = 0;
            live.rotate_strike();
            live.bowler_id = None;
            debug!(match_id = %state.id, over = live.current_over, "over complete, bowler required");
        }
    }
}

// =============================================================================
// REPLAY & RESULT
// =============================================================================

/// Fold a chronological sequence of events onto a base match.
pub fn replay_events<'a, I>(base: &Match, events: I) -> Match
where
    I: IntoIterator<Item = &'a ScoreEvent>,
{
    events
        .into_iter()
        .fold(base.clone(), |state, event| apply_event(&state, event))
}

/// Recompute every aggregate from the stored event list.
///
/// Starts from a blank scorecard, so live-state selections made outside of
/// events are not reproduced.
pub fn rebuild(current: &Match) -> Match {
    replay_events(&current.blank_scorecard(), current.events_chronological())
}

/// Mark the match completed and record the result by score.
///
/// A level score is a draw with no winner.
pub fn complete_match(current: &Match) -> Match {
    let mut next = current.clone();
    next.status = MatchStatus::Completed;

    let home = next.home_team.score;
    let away = next.away_team.score;

    let (home_result, away_result, winner) = match home.cmp(&away) {
        std::cmp::Ordering::Greater => (TeamResult::Win, TeamResult::Loss, Some(next.home_team.id.clone())),
        std::cmp::Ordering::Less => (TeamResult::Loss, TeamResult::Win, Some(next.away_team.id.clone())),
        std::cmp::Ordering::Equal => (TeamResult::Draw, TeamResult::Draw, None),
    };

    next.home_team.result = Some(home_result);
    next.away_team.result = Some(away_result);
    next.winner_id = winner;
    next.live_state = None;

    debug!(match_id = %next.id, home, away, winner = ?next.winner_id, "match completed");

    next
}

// =============================================================================
// TESTS
// =============================================================================
