//! Pitchside Engine
//!
//! Demo driver: generates a league, scores one cricket and one football
//! match through the session layer, and verifies the cricket scorebook.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pitchside::{
    VERSION,
    audit::{verify_transcript, ScoreTranscript},
    core::ids::{MatchId, PlayerId, TeamId, TournamentId},
    game::{
        events::{CardType, DismissalType, ExtraType, ScoreEvent},
        fixtures::{generate_round_robin_matches, Team},
        impact::player_of_the_match,
        roster::Roster,
        state::{Match, Sport},
    },
    session::{InMemoryStore, SessionConfig, SessionManager},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Pitchside Engine v{}", VERSION);

    let config = SessionConfig::from_env();
    info!(?config, "session config");

    let manager = SessionManager::new(Arc::new(InMemoryStore::new()), config);

    demo_cricket(&manager).await?;
    demo_football(&manager).await?;

    let removed = manager.cleanup().await;
    info!(removed, open = manager.session_count().await, "sessions cleaned up");

    Ok(())
}

fn league() -> Vec<Team> {
    vec![
        Team::new("lions", "City Lions"),
        Team::new("tigers", "Harbour Tigers"),
        Team::new("eagles", "Valley Eagles"),
        Team::new("sharks", "Bay Sharks"),
    ]
}

fn squad(prefix: &str) -> Vec<PlayerId> {
    (1..=11).map(|i| PlayerId::new(format!("{}-{:02}", prefix, i))).collect()
}

/// Seed a cricket league and score its opening fixture.
async fn demo_cricket(manager: &SessionManager<InMemoryStore>) -> anyhow::Result<()> {
    info!("=== Cricket League ===");

    let tournament = TournamentId::generate();
    let fixtures = generate_round_robin_matches(&league(), &tournament, Sport::Cricket);
    manager.seed_matches(&fixtures)?;
    info!(tournament = %tournament, fixtures = fixtures.len(), "league seeded");

    let first = fixtures.first().context("no fixtures generated")?;
    let id = first.id.clone();
    let (home, away) = (first.home_team.id.clone(), first.away_team.id.clone());
    info!("Opening fixture: {} vs {}", first.home_team.name, first.away_team.name);

    let batters = squad(home.as_str());
    let bowlers = squad(away.as_str());
    manager
        .set_roster(&id, Roster::new().with_team(home.clone(), batters.clone()).with_team(away.clone(), bowlers.clone()))
        .await?;

    let mut updates = manager.subscribe(&id).await?;

    // Two overs from two bowlers.
    let over_one = [1, 0, 4, 1, 6, 0];
    let over_two = [2, 0, 1, 4, 0, 1];
    let (b1, b2) = (bowlers[10].clone(), bowlers[9].clone());
    let (mut striker, mut other) = (batters[0].clone(), batters[1].clone());

    for (bowler, over) in [(&b1, over_one), (&b2, over_two)] {
        for runs in over {
            let event = ScoreEvent::delivery(striker.clone(), bowler.clone(), runs)
                .with_team(home.clone())
                .with_non_striker(other.clone());
            manager.submit_event(&id, event).await?;
            if runs % 2 == 1 {
                std::mem::swap(&mut striker, &mut other);
            }
        }
        std::mem::swap(&mut striker, &mut other);
    }

    let extras = [
        ScoreEvent::extra(ExtraType::Wide, 1, striker.clone(), b1.clone(), 0),
        ScoreEvent::extra(ExtraType::LegBye, 1, striker.clone(), b1.clone(), 0),
        ScoreEvent::wicket(other.clone(), b1.clone(), DismissalType::Caught, Some(bowlers[3].clone())),
    ];
    for event in extras {
        manager.submit_event(&id, event.with_team(home.clone())).await?;
    }

    // A ghost batter is turned away by roster validation.
    let ghost = ScoreEvent::delivery("substitute-xx", b1.clone(), 4).with_team(home.clone());
    if let Err(err) = manager.submit_event(&id, ghost).await {
        warn!(error = %err, "event rejected");
    }

    let mut seen = 0;
    while let Ok(update) = updates.try_recv() {
        seen += 1;
        if !update.new_players.is_empty() {
            info!(version = update.version, new = update.new_players.len(), "new players on scorecard");
        }
    }
    info!(updates = seen, "updates received");

    let snapshot = manager.snapshot(&id).await?;
    log_scorecard(&snapshot);

    let rankings = manager.complete(&id).await?;
    info!("=== Impact Rankings ===");
    for (rank, entry) in rankings.iter().take(5).enumerate() {
        info!("#{}: {} ({}) - impact {}", rank + 1, entry.player_id, entry.team_id, entry.score);
    }
    info!("Rankings JSON: {}", serde_json::to_string(&rankings)?);

    let completed = manager.snapshot(&id).await?;
    if let Some(potm) = player_of_the_match(&completed) {
        info!("Player of the match: {}", potm.player_id);
    }

    verify_scorebook(manager, &id).await
}

/// Replay the recorded scorebook and compare fingerprints.
async fn verify_scorebook(manager: &SessionManager<InMemoryStore>, id: &MatchId) -> anyhow::Result<()> {
    info!("=== Verifying Scorebook ===");

    let Some(transcript) = manager.transcript(id).await? else {
        warn!("transcript recording disabled, skipping verification");
        return Ok(());
    };

    let bytes = transcript.to_bytes()?;
    info!(events = transcript.event_count(), checkpoints = transcript.checkpoints.len(), bytes = bytes.len(), "transcript encoded");

    let result = verify_transcript(&ScoreTranscript::from_bytes(&bytes)?);
    info!("Recorded fingerprint: {}", hex::encode(result.expected_final_fingerprint));
    info!("Replayed fingerprint: {}", hex::encode(result.computed_final_fingerprint));

    if !result.valid {
        bail!("scorebook verification failed: {:?}", result.error);
    }
    info!("SCOREBOOK VERIFIED: fingerprints match");
    Ok(())
}

/// Score a short football match on its own fixture.
async fn demo_football(manager: &SessionManager<InMemoryStore>) -> anyhow::Result<()> {
    info!("=== Football Friendly ===");

    let teams = [Team::new("rovers", "Rovers"), Team::new("united", "United")];
    let fixtures = generate_round_robin_matches(&teams, &TournamentId::new("friendlies"), Sport::Football);
    manager.seed_matches(&fixtures)?;
    let id = fixtures.first().context("no fixtures generated")?.id.clone();

    let rovers = TeamId::new("rovers");
    let united = TeamId::new("united");
    let events = [
        ScoreEvent::goal(rovers.clone(), "rovers-09", Some(PlayerId::new("rovers-10"))),
        ScoreEvent::card(united.clone(), "united-04", CardType::Yellow),
        ScoreEvent::goal(united.clone(), "united-11", None),
        ScoreEvent::goal(rovers.clone(), "rovers-10", Some(PlayerId::new("rovers-07"))),
    ];
    for event in events {
        manager.submit_event(&id, event).await?;
    }

    manager.complete(&id).await?;
    let done = manager.snapshot(&id).await?;
    log_scorecard(&done);
    Ok(())
}

fn log_scorecard(m: &Match) {
    match m.sport {
        Sport::Football => info!(
            "{} {} - {} {}",
            m.home_team.name, m.home_team.score, m.away_team.score, m.away_team.name
        ),
        _ => {
            for team in [&m.home_team, &m.away_team] {
                info!("{}: {}/{} ({} overs)", team.name, team.score, team.wickets, team.overs_display());
            }
        }
    }
    if let Some(winner) = &m.winner_id {
        info!("Winner: {}", winner);
    }
    info!("Fingerprint: {}", hex::encode(m.fingerprint()));
}
