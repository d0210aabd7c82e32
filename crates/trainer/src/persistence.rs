use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use ledger_domain::{PracticeLog, SessionSnapshot};

use crate::storage::StorageBackend;

pub const GAME_STATE_KEY: &str = "ledger-game-v1";
pub const PRACTICE_KEY: &str = "ledger-practice-data";

const DEFAULT_QUIET_MS: u64 = 1000;
const DEFAULT_MAX_WAIT_MS: u64 = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Commit once no save has arrived for this long.
    pub quiet: Duration,
    /// Commit at the latest this long after the first uncommitted save.
    pub max_wait: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet: Duration::from_millis(DEFAULT_QUIET_MS),
            max_wait: Duration::from_millis(DEFAULT_MAX_WAIT_MS),
        }
    }
}

struct PendingWrite {
    snapshot: SessionSnapshot,
    first_at: Instant,
    last_at: Instant,
}

/// Debounced snapshot writer and the only component that touches storage.
pub struct PersistenceStore {
    backend: Arc<dyn StorageBackend>,
    config: DebounceConfig,
    pending: Option<PendingWrite>,
}

impl PersistenceStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_config(backend, DebounceConfig::default())
    }

    pub fn with_config(backend: Arc<dyn StorageBackend>, config: DebounceConfig) -> Self {
        Self {
            backend,
            config,
            pending: None,
        }
    }

    /// Reads the stored session. Missing or malformed data yields `None`.
    pub fn load(&self) -> Option<SessionSnapshot> {
        let text = match self.backend.read(GAME_STATE_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "failed to read saved game state");
                return None;
            }
        };
        match SessionSnapshot::from_json(&text) {
            Ok(snapshot) => {
                info!(
                    correct = snapshot.score.correct,
                    total = snapshot.score.total,
                    "loaded saved game state"
                );
                Some(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "failed to parse saved game state");
                None
            }
        }
    }

    pub fn save(&mut self, snapshot: SessionSnapshot) {
        self.save_at(snapshot, Instant::now());
    }

    /// Queues `snapshot` for the next commit, replacing any queued one.
    pub fn save_at(&mut self, snapshot: SessionSnapshot, now: Instant) {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.snapshot = snapshot;
                pending.last_at = now;
            }
            None => {
                self.pending = Some(PendingWrite {
                    snapshot,
                    first_at: now,
                    last_at: now,
                });
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| {
            let quiet_deadline = pending.last_at + self.config.quiet;
            let max_deadline = pending.first_at + self.config.max_wait;
            quiet_deadline.min(max_deadline)
        })
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Commits the queued snapshot if its deadline has passed.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.next_deadline() {
            Some(deadline) if now >= deadline => self.flush(),
            _ => false,
        }
    }

    /// Commits the queued snapshot immediately. Returns whether a write
    /// was attempted.
    pub fn flush(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if let Err(err) = self.commit(&pending.snapshot) {
            warn!(error = %err, "failed to save game state");
        }
        true
    }

    /// Drops the queued snapshot without writing it.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!("discarded pending game state write");
        }
    }

    /// Removes the stored session and any queued write.
    pub fn clear(&mut self) -> Result<()> {
        self.pending = None;
        self.backend.remove(GAME_STATE_KEY)
    }

    pub fn load_practice(&self) -> PracticeLog {
        match self.backend.read(PRACTICE_KEY) {
            Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(error = %err, "failed to parse practice log");
                PracticeLog::new()
            }),
            Ok(None) => PracticeLog::new(),
            Err(err) => {
                warn!(error = %err, "failed to read practice log");
                PracticeLog::new()
            }
        }
    }

    pub fn save_practice(&self, log: &PracticeLog) {
        let result = serde_json::to_string(log)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.backend.write(PRACTICE_KEY, &json));
        if let Err(err) = result {
            warn!(error = %err, "failed to save practice log");
        }
    }

    fn commit(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        self.backend.write(GAME_STATE_KEY, &json)?;
        debug!(bytes = json.len(), "game state committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use ledger_domain::{
        Clef, Note, NoteName, NoteSelection, ReviewEntry, ReviewSnapshot, Score,
    };
    use time::macros::date;

    fn snapshot(correct: u32, total: u32) -> SessionSnapshot {
        SessionSnapshot {
            score: Score { correct, total },
            note_selection: NoteSelection {
                note: Note::new(NoteName::D, 4),
                clef: Clef::Treble,
                is_answer_revealed: true,
            },
            review: ReviewSnapshot {
                incorrect_notes: vec![ReviewEntry::new(Note::new(NoteName::G, 2), Clef::Bass)],
                review_queue: Vec::new(),
                is_review_mode: false,
            },
        }
    }

    fn store() -> (PersistenceStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        (PersistenceStore::new(Arc::new(storage.clone())), storage)
    }

    #[test]
    fn save_flush_load_round_trip() {
        let (mut store, _) = store();
        let saved = snapshot(1, 2);
        store.save(saved.clone());
        assert!(store.flush());
        assert_eq!(store.load(), Some(saved));
    }

    #[test]
    fn rapid_saves_coalesce_into_last_payload() {
        let (mut store, storage) = store();
        let start = Instant::now();
        for i in 0..5u32 {
            store.save_at(snapshot(i, 10), start + Duration::from_millis(100 * u64::from(i)));
        }
        assert!(!store.poll_at(start + Duration::from_millis(1399)));
        assert_eq!(storage.write_count(), 0);
        assert!(store.poll_at(start + Duration::from_millis(1400)));
        assert_eq!(storage.write_count(), 1);
        assert_eq!(store.load().unwrap().score, Score { correct: 4, total: 10 });
        assert!(!store.poll_at(start + Duration::from_secs(10)));
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn max_wait_bounds_continuous_activity() {
        let (mut store, storage) = store();
        let start = Instant::now();
        let mut commits_at = Vec::new();
        for tick in 0..=120u64 {
            let now = start + Duration::from_millis(tick * 100);
            store.save_at(snapshot(0, tick as u32), now);
            if store.poll_at(now) {
                commits_at.push(tick * 100);
            }
        }
        assert_eq!(commits_at, vec![5000, 10100]);
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn nothing_is_written_before_deadline() {
        let (mut store, storage) = store();
        let start = Instant::now();
        assert!(!store.has_pending());
        store.save_at(snapshot(1, 1), start);
        assert!(store.has_pending());
        assert!(storage.get(GAME_STATE_KEY).is_none());
        assert_eq!(store.next_deadline(), Some(start + Duration::from_millis(1000)));
    }

    #[test]
    fn cancel_discards_pending_write() {
        let (mut store, storage) = store();
        store.save(snapshot(1, 1));
        store.cancel();
        assert!(!store.has_pending());
        assert!(!store.flush());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn malformed_state_loads_as_none() {
        let (store, storage) = store();
        storage.insert(GAME_STATE_KEY, "{\"score\":");
        assert_eq!(store.load(), None);
        storage.insert(GAME_STATE_KEY, serde_json::to_string(&snapshot(3, 1)).unwrap());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn clear_removes_saved_state() {
        let (mut store, _) = store();
        store.save(snapshot(1, 1));
        store.flush();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn practice_log_round_trip() {
        let (store, storage) = store();
        assert!(store.load_practice().is_empty());
        let mut log = PracticeLog::new();
        log.add_seconds(date!(2026 - 10 - 19), 30);
        store.save_practice(&log);
        assert_eq!(storage.get(PRACTICE_KEY).as_deref(), Some(r#"{"2026-10-19":30}"#));
        assert_eq!(store.load_practice(), log);
    }
}
