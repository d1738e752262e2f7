//! Scoring Session Management
//!
//! One session per match being scored. A session is the only writer for its
//! match: it validates, applies, persists and only then commits an event,
//! and fans the resulting update out to subscribers.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::audit::transcript::{ScoreTranscript, DEFAULT_CHECKPOINT_INTERVAL};
use crate::core::ids::{EventId, MatchId};
use crate::game::engine::{apply, complete_match, NewPlayer};
use crate::game::events::ScoreEvent;
use crate::game::impact::{get_match_impact_rankings, ImpactScore};
use crate::game::roster::{validate_event, Roster, ValidationError};
use crate::game::state::{Match, MatchStatus};
use crate::session::store::{MatchStore, StoreError, StoredMatch};

/// Configuration for scoring sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Validate events before applying (roster checks once a roster is set).
    pub validate_roster: bool,
    /// Record a scorebook transcript.
    pub record_transcript: bool,
    /// Events between transcript checkpoints.
    pub checkpoint_interval: u32,
    /// Update channel capacity per match.
    pub update_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            validate_roster: true,
            record_transcript: true,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            update_buffer: 256,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            validate_roster: env_flag("PITCHSIDE_VALIDATE_ROSTER", defaults.validate_roster),
            record_transcript: env_flag("PITCHSIDE_RECORD_TRANSCRIPT", defaults.record_transcript),
            checkpoint_interval: env_parse("PITCHSIDE_CHECKPOINT_INTERVAL", defaults.checkpoint_interval),
            update_buffer: env_parse("PITCHSIDE_UPDATE_BUFFER", defaults.update_buffer).max(1),
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Broadcast after every committed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    /// Match that changed.
    pub match_id: MatchId,
    /// Store version after the change.
    pub version: u64,
    /// Event that caused it; `None` for completion.
    pub event_id: Option<EventId>,
    /// Home score.
    pub home_score: u32,
    /// Away score.
    pub away_score: u32,
    /// Match status.
    pub status: MatchStatus,
    /// Stats rows created by the event.
    pub new_players: Vec<NewPlayer>,
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No stored match with this id.
    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    /// Match no longer accepts scoring.
    #[error("match {match_id} is {status:?} and accepts no further events")]
    MatchClosed {
        /// Match id
        match_id: MatchId,
        /// Its terminal status
        status: MatchStatus,
    },

    /// Event rejected before scoring.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Scoring state for one match.
pub struct ScoringSession {
    state: Match,
    version: u64,
    config: SessionConfig,
    roster: Option<Roster>,
    transcript: Option<ScoreTranscript>,
    update_tx: broadcast::Sender<ScoreUpdate>,
}

impl ScoringSession {
    /// Open a session on a stored match.
    pub fn new(stored: StoredMatch, config: SessionConfig) -> Self {
        let (update_tx, _) = broadcast::channel(config.update_buffer.max(1));

        Self {
            state: stored.state,
            version: stored.version,
            config,
            roster: None,
            transcript: None,
            update_tx,
        }
    }

    /// Current scorecard.
    pub fn state(&self) -> &Match {
        &self.state
    }

    /// Store version the current scorecard was saved as.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Registered roster.
    pub fn roster(&self) -> Option<&Roster> {
        self.roster.as_ref()
    }

    /// Register the squads used for validation.
    pub fn set_roster(&mut self, roster: Roster) {
        self.roster = Some(roster);
    }

    /// Transcript recorded so far.
    pub fn transcript(&self) -> Option<&ScoreTranscript> {
        self.transcript.as_ref()
    }

    /// Subscribe to updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScoreUpdate> {
        self.update_tx.subscribe()
    }

    /// Whether submitted players are checked against a registered roster.
    pub fn checks_roster(&self) -> bool {
        self.config.validate_roster && self.roster.is_some()
    }

    /// Whether the match is in a terminal status.
    pub fn is_closed(&self) -> bool {
        self.state.status.is_terminal()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::MatchClosed {
                match_id: self.state.id.clone(),
                status: self.state.status,
            });
        }
        Ok(())
    }

    /// Validate, apply, persist and commit one event.
    ///
    /// Nothing is committed unless the store accepts the write. On a version
    /// conflict the session reloads from the store before returning the
    /// error, so the caller can resubmit.
    pub fn submit<S: MatchStore>(&mut self, store: &S, event: ScoreEvent) -> Result<ScoreUpdate, SessionError> {
        self.ensure_open()?;

        // first event puts the match live
        let mut base = self.state.clone();
        if matches!(base.status, MatchStatus::Scheduled | MatchStatus::Draft) {
            base.status = MatchStatus::Live;
        }

        if self.config.validate_roster {
            let empty = Roster::default();
            validate_event(&base, &event, self.roster.as_ref().unwrap_or(&empty))?;
        }

        let applied = apply(&base, &event);
        let version = self.persist(store, &applied.state)?;

        if !self.checks_roster() {
            for player in &applied.new_players {
                warn!(
                    match_id = %base.id,
                    team_id = %player.team_id,
                    player_id = %player.player_id,
                    "unvetted player added to scorecard, no roster registered"
                );
            }
        }

        if self.config.record_transcript {
            let interval = self.config.checkpoint_interval;
            self.transcript
                .get_or_insert_with(|| ScoreTranscript::begin(&base, interval))
                .record(&event, &applied.state);
        }

        self.state = applied.state;
        self.version = version;

        let update = self.update(Some(event.id), applied.new_players);
        self.broadcast(update.clone());

        debug!(
            match_id = %self.state.id,
            version,
            home = self.state.home_team.score,
            away = self.state.away_team.score,
            "event committed"
        );

        Ok(update)
    }

    /// Complete the match and return its impact rankings.
    pub fn complete<S: MatchStore>(&mut self, store: &S) -> Result<Vec<ImpactScore>, SessionError> {
        self.ensure_open()?;

        let completed = complete_match(&self.state);
        let version = self.persist(store, &completed)?;

        if self.config.record_transcript {
            let interval = self.config.checkpoint_interval;
            self.transcript
                .get_or_insert_with(|| ScoreTranscript::begin(&self.state, interval))
                .finalize(&completed);
        }

        self.state = completed;
        self.version = version;

        let update = self.update(None, Vec::new());
        self.broadcast(update);

        info!(
            match_id = %self.state.id,
            home = self.state.home_team.score,
            away = self.state.away_team.score,
            winner = ?self.state.winner_id,
            "match completed"
        );

        Ok(get_match_impact_rankings(&self.state))
    }

    /// Replace local state with the stored copy.
    ///
    /// The transcript restarts from the reloaded scorecard on the next event.
    pub fn reload<S: MatchStore>(&mut self, store: &S) -> Result<(), SessionError> {
        let stored = store
            .load(&self.state.id)?
            .ok_or_else(|| SessionError::MatchNotFound(self.state.id.clone()))?;

        if self.transcript.take().is_some() {
            warn!(match_id = %self.state.id, "transcript discarded after reload");
        }

        self.state = stored.state;
        self.version = stored.version;
        Ok(())
    }

    fn persist<S: MatchStore>(&mut self, store: &S, next: &Match) -> Result<u64, SessionError> {
        match store.save(next, self.version) {
            Ok(version) => Ok(version),
            Err(err @ StoreError::VersionConflict { .. }) => {
                warn!(match_id = %self.state.id, error = %err, "stale session, reloading");
                self.reload(store)?;
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, event_id: Option<EventId>, new_players: Vec<NewPlayer>) -> ScoreUpdate {
        ScoreUpdate {
            match_id: self.state.id.clone(),
            version: self.version,
            event_id,
            home_score: self.state.home_team.score,
            away_score: self.state.away_team.score,
            status: self.state.status,
            new_players,
        }
    }

    fn broadcast(&self, update: ScoreUpdate) {
        // no subscribers is fine
        let _ = self.update_tx.send(update);
    }
}

/// Session manager for all matches being scored.
pub struct SessionManager<S: MatchStore> {
    /// Backing store.
    store: Arc<S>,
    /// Config applied to new sessions.
    config: SessionConfig,
    /// Open sessions.
    sessions: RwLock<BTreeMap<MatchId, Arc<Mutex<ScoringSession>>>>,
}

impl<S: MatchStore> SessionManager<S> {
    /// Create new session manager.
    pub fn new(store: Arc<S>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Insert freshly generated fixtures into the store.
    pub fn seed_matches(&self, matches: &[Match]) -> Result<usize, SessionError> {
        for m in matches {
            self.store.save(m, 0)?;
        }
        info!(count = matches.len(), "seeded matches");
        Ok(matches.len())
    }

    /// Get the session for a match, opening it from the store if needed.
    pub async fn open(&self, id: &MatchId) -> Result<Arc<Mutex<ScoringSession>>, SessionError> {
        if let Some(session) = self.get_session(id).await {
            return Ok(session);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(id) {
            return Ok(session.clone());
        }

        let stored = self
            .store
            .load(id)?
            .ok_or_else(|| SessionError::MatchNotFound(id.clone()))?;
        let session = Arc::new(Mutex::new(ScoringSession::new(stored, self.config.clone())));
        sessions.insert(id.clone(), session.clone());

        debug!(match_id = %id, "session opened");
        Ok(session)
    }

    /// Get an already open session.
    pub async fn get_session(&self, id: &MatchId) -> Option<Arc<Mutex<ScoringSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Register the squads for a match.
    pub async fn set_roster(&self, id: &MatchId, roster: Roster) -> Result<(), SessionError> {
        let session = self.open(id).await?;
        session.lock().await.set_roster(roster);
        Ok(())
    }

    /// Score one event.
    pub async fn submit_event(&self, id: &MatchId, event: ScoreEvent) -> Result<ScoreUpdate, SessionError> {
        let session = self.open(id).await?;
        let mut session = session.lock().await;
        session.submit(self.store.as_ref(), event)
    }

    /// Subscribe to a match's updates.
    pub async fn subscribe(&self, id: &MatchId) -> Result<broadcast::Receiver<ScoreUpdate>, SessionError> {
        let session = self.open(id).await?;
        let session = session.lock().await;
        Ok(session.subscribe())
    }

    /// Complete a match and return its impact rankings.
    pub async fn complete(&self, id: &MatchId) -> Result<Vec<ImpactScore>, SessionError> {
        let session = self.open(id).await?;
        let mut session = session.lock().await;
        session.complete(self.store.as_ref())
    }

    /// Current scorecard.
    pub async fn snapshot(&self, id: &MatchId) -> Result<Match, SessionError> {
        let session = self.open(id).await?;
        let session = session.lock().await;
        Ok(session.state().clone())
    }

    /// Transcript recorded for a match.
    pub async fn transcript(&self, id: &MatchId) -> Result<Option<ScoreTranscript>, SessionError> {
        let session = self.open(id).await?;
        let session = session.lock().await;
        Ok(session.transcript().cloned())
    }

    /// Remove a session.
    pub async fn remove_session(&self, id: &MatchId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
    }

    /// Get open session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Drop sessions whose match is finished. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut to_remove = Vec::new();

        for (id, session) in sessions.iter() {
            let s = session.lock().await;
            if s.is_closed() {
                to_remove.push(id.clone());
            }
        }

        for id in &to_remove {
            sessions.remove(id);
        }

        to_remove.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use crate::audit::verify::verify_transcript;
    use crate::core::ids::{PlayerId, TeamId};
    use crate::game::state::{Participant, Sport};
    use crate::session::store::InMemoryStore;

    fn test_match(id: &str) -> Match {
        let mut m = Match::new(
            MatchId::new(id),
            Sport::Cricket,
            Participant::new("home", "Home XI"),
            Participant::new("away", "Away XI"),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        );
        m.current_batting_team_id = Some(TeamId::new("home"));
        m
    }

    fn manager() -> SessionManager<InMemoryStore> {
        let manager = SessionManager::new(Arc::new(InMemoryStore::new()), SessionConfig::default());
        manager.seed_matches(&[test_match("m1"), test_match("m2")]).unwrap();
        manager
    }

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert!(config.validate_roster);
        assert!(config.record_transcript);
        assert_eq!(config.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);
        assert_eq!(config.update_buffer, 256);
    }

    #[tokio::test]
    async fn test_submit_persists_and_goes_live() {
        let manager = manager();
        let id = MatchId::new("m1");

        let update = manager
            .submit_event(&id, ScoreEvent::delivery("h1", "a1", 4))
            .await
            .unwrap();

        assert_eq!(update.version, 2);
        assert_eq!(update.home_score, 4);
        assert_eq!(update.status, MatchStatus::Live);
        assert_eq!(update.new_players.len(), 2);

        let stored = manager.store().load(&id).unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.state.home_team.score, 4);
        assert_eq!(stored.state.status, MatchStatus::Live);
    }

    #[tokio::test]
    async fn test_players_without_roster_are_reported() {
        let manager = manager();
        let id = MatchId::new("m1");

        let update = manager
            .submit_event(&id, ScoreEvent::delivery("newcomer", "a1", 1))
            .await
            .unwrap();
        let session = manager.get_session(&id).await.unwrap();
        assert!(!session.lock().await.checks_roster());
        assert!(update.new_players.contains(&NewPlayer {
            team_id: TeamId::new("home"),
            player_id: PlayerId::new("newcomer"),
        }));

        manager
            .set_roster(&id, Roster::new().with_team("home", ["newcomer", "h2"]).with_team("away", ["a1", "a2"]))
            .await
            .unwrap();
        assert!(session.lock().await.checks_roster());

        // registered players are still reported on first appearance
        let update = manager
            .submit_event(&id, ScoreEvent::delivery("h2", "a1", 0))
            .await
            .unwrap();
        assert_eq!(update.new_players.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_match() {
        let manager = manager();
        let err = manager
            .submit_event(&MatchId::new("nope"), ScoreEvent::delivery("h1", "a1", 0))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::MatchNotFound(MatchId::new("nope")));
    }

    #[tokio::test]
    async fn test_roster_rejection_commits_nothing() {
        let manager = manager();
        let id = MatchId::new("m1");
        manager
            .set_roster(&id, Roster::new().with_team("home", ["h1", "h2"]).with_team("away", ["a1"]))
            .await
            .unwrap();

        let err = manager
            .submit_event(&id, ScoreEvent::delivery("ghost", "a1", 6))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(ValidationError::NotOnRoster { .. })));

        let snapshot = manager.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.home_team.score, 0);
        assert!(snapshot.events.is_empty());
        assert_eq!(manager.store().load(&id).unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_version_conflict_reloads() {
        let manager = manager();
        let id = MatchId::new("m1");
        manager.submit_event(&id, ScoreEvent::delivery("h1", "a1", 1)).await.unwrap();

        // another writer bumps the stored copy
        let stored = manager.store().load(&id).unwrap().unwrap();
        let mut other = stored.state.clone();
        other.home_team.score = 50;
        manager.store().save(&other, stored.version).unwrap();

        let event = ScoreEvent::delivery("h1", "a1", 2);
        let err = manager.submit_event(&id, event.clone()).await.unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::VersionConflict { .. })));

        // session picked up the newer copy; resubmitting succeeds
        let update = manager.submit_event(&id, event).await.unwrap();
        assert_eq!(update.home_score, 52);
        assert_eq!(update.version, 4);
    }

    #[tokio::test]
    async fn test_single_writer_under_concurrency() {
        let manager = Arc::new(manager());
        let id = MatchId::new("m1");

        let mut handles = Vec::new();
        for i in 0..20u32 {
            let manager = manager.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .submit_event(&id, ScoreEvent::delivery("h1", "a1", i % 3))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let expected: u32 = (0..20u32).map(|i| i % 3).sum();
        let snapshot = manager.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.home_team.score, expected);
        assert_eq!(snapshot.events.len(), 20);
        assert_eq!(manager.store().load(&id).unwrap().unwrap().version, 21);
    }

    #[tokio::test]
    async fn test_updates_broadcast() {
        let manager = manager();
        let id = MatchId::new("m1");
        let mut rx = manager.subscribe(&id).await.unwrap();

        let event = ScoreEvent::delivery("h1", "a1", 6);
        let event_id = event.id.clone();
        manager.submit_event(&id, event).await.unwrap();

        let update = rx.recv().await.unwrap();
        assert_eq!(update.event_id, Some(event_id));
        assert_eq!(update.home_score, 6);
        assert_eq!(update.new_players[0].player_id, PlayerId::new("h1"));
    }

    #[tokio::test]
    async fn test_complete_rankings_and_transcript() {
        let manager = manager();
        let id = MatchId::new("m1");

        for runs in [4, 6, 1, 0, 2, 1] {
            manager.submit_event(&id, ScoreEvent::delivery("h1", "a1", runs)).await.unwrap();
        }
        let rankings = manager.complete(&id).await.unwrap();
        assert!(!rankings.is_empty());

        let snapshot = manager.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.status, MatchStatus::Completed);
        assert_eq!(snapshot.winner_id, Some(TeamId::new("home")));

        let transcript = manager.transcript(&id).await.unwrap().unwrap();
        assert_eq!(transcript.event_count(), 6);
        assert!(verify_transcript(&transcript).valid);

        let err = manager
            .submit_event(&id, ScoreEvent::delivery("h1", "a1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::MatchClosed { .. }));
        assert!(matches!(manager.complete(&id).await, Err(SessionError::MatchClosed { .. })));
    }

    #[tokio::test]
    async fn test_cleanup_drops_finished_sessions() {
        let manager = manager();
        manager.open(&MatchId::new("m1")).await.unwrap();
        manager.open(&MatchId::new("m2")).await.unwrap();
        assert_eq!(manager.session_count().await, 2);

        manager.complete(&MatchId::new("m1")).await.unwrap();
        assert_eq!(manager.cleanup().await, 1);
        assert_eq!(manager.session_count().await, 1);

        manager.remove_session(&MatchId::new("m2")).await;
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_transcript_disabled() {
        let config = SessionConfig {
            record_transcript: false,
            ..Default::default()
        };
        let manager = SessionManager::new(Arc::new(InMemoryStore::new()), config);
        manager.seed_matches(&[test_match("m1")]).unwrap();

        let id = MatchId::new("m1");
        manager.submit_event(&id, ScoreEvent::delivery("h1", "a1", 1)).await.unwrap();
        assert!(manager.transcript(&id).await.unwrap().is_none());
    }
}
