//! Impact Ranking
//!
//! Weighted "impact" score per player, used to pick player-of-the-match
//! candidates. Reads stats produced by the score engine, never mutates them.
//!
//! ## Weights
//!
//! | Discipline | Rule |
//! |---|---|
//! | Batting | +1 per run; when runs > 10, strike rate > 150: +10, > 120: +5, < 80: -2; 50+: +10; 100+: +20 more |
//! | Bowling | +25 per wicket; 3+: +10; 5+: +20 more; with 12+ balls, economy < 6: +10, < 8: +5, > 12: -5 |
//! | Fielding | +10 per catch, +15 per run-out |
//!
//! The total is floored to an integer.

use std::cmp::Ordering;

use serde::{Serialize, Deserialize};

use crate::core::ids::{PlayerId, TeamId};
use crate::game::state::{Match, PlayerStats, BALLS_PER_OVER};

/// Which disciplines count toward a player's impact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Batting, bowling and fielding
    #[default]
    AllRounder,
    /// Batting and fielding
    Batter,
    /// Bowling and fielding
    Bowler,
}

/// A player's computed impact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactScore {
    /// Player identifier
    pub player_id: PlayerId,
    /// Team the player appeared for
    pub team_id: TeamId,
    /// Floored impact score
    pub score: i64,
    /// Runs scored (tie-break)
    pub runs: u32,
    /// Wickets taken (tie-break)
    pub wickets: u32,
}

/// Impact score for one player's stats.
pub fn calculate_impact_score(stats: &PlayerStats, role: Role) -> i64 {
    let total = match role {
        Role::AllRounder => batting_impact(stats) + bowling_impact(stats) + fielding_impact(stats),
        Role::Batter => batting_impact(stats) + fielding_impact(stats),
        Role::Bowler => bowling_impact(stats) + fielding_impact(stats),
    };
    total.floor() as i64
}

fn batting_impact(stats: &PlayerStats) -> f64 {
    let runs = stats.runs as f64;
    let mut impact = runs;

    if stats.runs > 10 {
        // Zero balls faced gives an infinite strike rate, which earns the top bonus.
        let strike_rate = runs / stats.balls as f64 * 100.0;
        if strike_rate > 150.0 {
            impact += 10.0;
        } else if strike_rate > 120.0 {
            impact += 5.0;
        } else if strike_rate < 80.0 {
            impact -= 2.0;
        }
    }

    if stats.runs >= 50 {
        impact += 10.0;
    }
    if stats.runs >= 100 {
        impact += 20.0;
    }

    impact
}

fn bowling_impact(stats: &PlayerStats) -> f64 {
    let mut impact = stats.wickets as f64 * 25.0;

    if stats.wickets >= 3 {
        impact += 10.0;
    }
    if stats.wickets >= 5 {
        impact += 20.0;
    }

    if stats.balls_bowled >= 2 * BALLS_PER_OVER {
        let overs = stats.balls_bowled as f64 / BALLS_PER_OVER as f64;
        let economy = stats.runs_conceded as f64 / overs;
        if economy < 6.0 {
            impact += 10.0;
        } else if economy < 8.0 {
            impact += 5.0;
        } else if economy > 12.0 {
            impact -= 5.0;
        }
    }

    impact
}

fn fielding_impact(stats: &PlayerStats) -> f64 {
    stats.catches as f64 * 10.0 + stats.runouts as f64 * 15.0
}

/// Ordering for ranked output: score, runs, wickets (all descending),
/// then player id ascending.
fn rank_order(a: &ImpactScore, b: &ImpactScore) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.runs.cmp(&a.runs))
        .then_with(|| b.wickets.cmp(&a.wickets))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

/// Rank every player in the match by impact, best first.
pub fn get_match_impact_rankings(state: &Match) -> Vec<ImpactScore> {
    let mut rankings: Vec<ImpactScore> = [&state.home_team, &state.away_team]
        .into_iter()
        .flat_map(|team| {
            team.players.iter().map(move |stats| ImpactScore {
                player_id: stats.player_id.clone(),
                team_id: team.id.clone(),
                score: calculate_impact_score(stats, Role::AllRounder),
                runs: stats.runs,
                wickets: stats.wickets,
            })
        })
        .collect();

    rankings.sort_by(rank_order);
    rankings
}

/// Top-ranked player, if anyone has stats.
pub fn player_of_the_match(state: &Match) -> Option<ImpactScore> {
    get_match_impact_rankings(state).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::core::ids::MatchId;
    use crate::game::state::{Participant, Sport};

    fn stats(id: &str) -> PlayerStats {
        PlayerStats::new(PlayerId::new(id))
    }

    fn batter(runs: u32, balls: u32) -> PlayerStats {
        PlayerStats {
            runs,
            balls,
            ..stats("bat")
        }
    }

    fn bowler(wickets: u32, balls_bowled: u32, runs_conceded: u32) -> PlayerStats {
        PlayerStats {
            wickets,
            balls_bowled,
            runs_conceded,
            ..stats("bowl")
        }
    }

    #[test]
    fn test_runs_below_strike_rate_threshold() {
        // 10 runs off 50 balls: no strike-rate adjustment yet
        assert_eq!(calculate_impact_score(&batter(10, 50), Role::AllRounder), 10);
    }

    #[test]
    fn test_strike_rate_bands() {
        assert_eq!(calculate_impact_score(&batter(20, 10), Role::AllRounder), 30); // SR 200
        assert_eq!(calculate_impact_score(&batter(26, 20), Role::AllRounder), 31); // SR 130
        assert_eq!(calculate_impact_score(&batter(20, 20), Role::AllRounder), 20); // SR 100
        assert_eq!(calculate_impact_score(&batter(20, 40), Role::AllRounder), 18); // SR 50
    }

    #[test]
    fn test_slow_innings_penalised_once_past_ten_runs() {
        assert_eq!(calculate_impact_score(&batter(10, 100), Role::AllRounder), 10);
        assert_eq!(calculate_impact_score(&batter(11, 100), Role::AllRounder), 9);
    }

    #[test]
    fn test_zero_balls_gets_top_strike_rate_bonus() {
        assert_eq!(calculate_impact_score(&batter(12, 0), Role::AllRounder), 22);
    }

    #[test]
    fn test_batting_milestones_stack() {
        // 50 off 50: SR 100, +10 fifty
        assert_eq!(calculate_impact_score(&batter(50, 50), Role::AllRounder), 60);
        // 100 off 100: SR 100, +10 fifty, +20 hundred
        assert_eq!(calculate_impact_score(&batter(100, 100), Role::AllRounder), 130);
    }

    #[test]
    fn test_wicket_milestones_stack() {
        assert_eq!(calculate_impact_score(&bowler(2, 6, 10), Role::AllRounder), 50);
        assert_eq!(calculate_impact_score(&bowler(3, 6, 10), Role::AllRounder), 85);
        assert_eq!(calculate_impact_score(&bowler(4, 6, 10), Role::AllRounder), 110);
        assert_eq!(calculate_impact_score(&bowler(5, 6, 10), Role::AllRounder), 155);
    }

    #[test]
    fn test_economy_bands_need_two_overs() {
        // 11 balls: no economy adjustment
        assert_eq!(calculate_impact_score(&bowler(0, 11, 0), Role::AllRounder), 0);
        // 4 overs for 20: economy 5
        assert_eq!(calculate_impact_score(&bowler(0, 24, 20), Role::AllRounder), 10);
        // 4 overs for 28: economy 7
        assert_eq!(calculate_impact_score(&bowler(0, 24, 28), Role::AllRounder), 5);
        // 4 overs for 40: economy 10
        assert_eq!(calculate_impact_score(&bowler(0, 24, 40), Role::AllRounder), 0);
        // 2 overs for 30: economy 15
        assert_eq!(calculate_impact_score(&bowler(0, 12, 30), Role::AllRounder), -5);
    }

    #[test]
    fn test_fielding() {
        let fielder = PlayerStats {
            catches: 2,
            runouts: 1,
            ..stats("f")
        };
        assert_eq!(calculate_impact_score(&fielder, Role::AllRounder), 35);
    }

    #[test]
    fn test_role_selects_disciplines() {
        let all = PlayerStats {
            runs: 30,
            balls: 30,
            wickets: 2,
            balls_bowled: 6,
            runs_conceded: 10,
            catches: 1,
            ..stats("ar")
        };

        assert_eq!(calculate_impact_score(&all, Role::AllRounder), 30 + 50 + 10);
        assert_eq!(calculate_impact_score(&all, Role::Batter), 30 + 10);
        assert_eq!(calculate_impact_score(&all, Role::Bowler), 50 + 10);
    }

    #[test]
    fn test_rankings_sorted_with_tie_break() {
        let mut home = Participant::new("home", "Home");
        home.players.push(PlayerStats { runs: 8, ..stats("zed") });
        home.players.push(PlayerStats { catches: 1, ..stats("catcher") });
        let mut away = Participant::new("away", "Away");
        away.players.push(PlayerStats { runs: 10, ..stats("amy") });
        away.players.push(PlayerStats { wickets: 2, balls_bowled: 6, ..stats("bowler") });

        let m = Match::new(MatchId::new("m"), Sport::Cricket, home, away, Utc::now());
        let ranked = get_match_impact_rankings(&m);

        let order: Vec<&str> = ranked.iter().map(|r| r.player_id.as_str()).collect();
        // bowler 50; amy 10 (runs 10) beats catcher 10 (runs 0); zed 8
        assert_eq!(order, vec!["bowler", "amy", "catcher", "zed"]);
        assert_eq!(ranked[1].team_id, TeamId::new("away"));
        assert_eq!(ranked[2].team_id, TeamId::new("home"));
    }

    #[test]
    fn test_full_tie_breaks_on_player_id() {
        let mut home = Participant::new("home", "Home");
        home.players.push(stats("b"));
        home.players.push(stats("a"));
        let m = Match::new(MatchId::new("m"), Sport::Cricket, home, Participant::new("away", "Away"), Utc::now());

        let ranked = get_match_impact_rankings(&m);
        assert_eq!(ranked[0].player_id, PlayerId::new("a"));
        assert_eq!(ranked[1].player_id, PlayerId::new("b"));
    }

    #[test]
    fn test_player_of_the_match() {
        let m = Match::new(
            MatchId::new("m"),
            Sport::Cricket,
            Participant::new("home", "Home"),
            Participant::new("away", "Away"),
            Utc::now(),
        );
        assert!(player_of_the_match(&m).is_none());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Past the strike-rate gate, more runs never lowers the impact score.
            #[test]
            fn prop_runs_monotonic(runs in 11u32..300, balls in 0u32..300, wickets in 0u32..10) {
                let base = PlayerStats { runs, balls, wickets, ..stats("p") };
                let more = PlayerStats { runs: runs + 1, ..base.clone() };
                prop_assert!(
                    calculate_impact_score(&more, Role::AllRounder)
                        >= calculate_impact_score(&base, Role::AllRounder)
                );
            }

            /// Reaching three and five wickets adds the milestone bonus.
            #[test]
            fn prop_wicket_milestones(balls_bowled in 0u32..60, runs_conceded in 0u32..80) {
                let at = |wickets| calculate_impact_score(
                    &PlayerStats { wickets, balls_bowled, runs_conceded, ..stats("p") },
                    Role::AllRounder,
                );
                prop_assert_eq!(at(3) - at(2), 35);
                prop_assert_eq!(at(5) - at(4), 45);
            }

            /// Rankings are sorted by score and include every player.
            #[test]
            fn prop_rankings_sorted(runs in proptest::collection::vec(0u32..120, 0..12)) {
                let mut home = Participant::new("home", "Home");
                for (i, r) in runs.iter().enumerate() {
                    home.players.push(PlayerStats { runs: *r, balls: 30, ..stats(&format!("p{}", i)) });
                }
                let m = Match::new(MatchId::new("m"), Sport::Cricket, home, Participant::new("away", "Away"), Utc::now());

                let ranked = get_match_impact_rankings(&m);
                prop_assert_eq!(ranked.len(), runs.len());
                for pair in ranked.windows(2) {
                    prop_assert!(pair[0].score >= pair[1].score);
                }
            }
        }
    }
}
