use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ledger_domain::{
    Clef, DomainError, GameSettings, Note, NoteSelection, ReviewEntry, Score, SessionSnapshot,
    StemDirection,
};

use crate::clock::Clock;
use crate::persistence::PersistenceStore;
use crate::practice::PracticeTracker;
use crate::review::ReviewQueue;
use crate::scoring::ScoreTracker;
use crate::selector::{DrawnNote, NoteSelector};
use crate::timer::{seconds, CountdownTimer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Phase {
    SettingsOpen,
    /// A restored session waiting for an explicit resume.
    Paused,
    Playing,
    AnswerRevealed,
    TimedOut,
}

impl Phase {
    fn is_in_game(self) -> bool {
        matches!(self, Phase::Playing | Phase::AnswerRevealed | Phase::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    Start,
    Reveal,
    MarkCorrect,
    MarkIncorrect,
    TimeoutContinue,
    StartReview,
    StopReview,
    /// Puts the current review card at the back of the queue, unscored.
    SkipReview,
    Resume,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Changed,
    TimedOut,
    ReviewFinished,
}

/// Derived state for rendering and input collaborators.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameView {
    pub phase: Phase,
    pub note: Note,
    pub clef: Clef,
    pub stem: StemDirection,
    pub is_answer_revealed: bool,
    pub score: Score,
    pub timer_enabled: bool,
    pub timer_progress: f32,
    pub time_left: Duration,
    pub is_time_expired: bool,
    pub can_review: bool,
    pub is_review_mode: bool,
    pub is_review_finished: bool,
    pub review_queue_len: usize,
    pub practice_total_seconds: u64,
    pub practice_week_seconds: u64,
}

#[cfg(test)]
impl GameView {
    pub(crate) fn placeholder() -> Self {
        let note = Note::from_diatonic_step(6);
        Self {
            phase: Phase::SettingsOpen,
            note,
            clef: Clef::Treble,
            stem: Clef::Treble.stem_direction(&note),
            is_answer_revealed: false,
            score: Score::default(),
            timer_enabled: false,
            timer_progress: 1.0,
            time_left: Duration::ZERO,
            is_time_expired: false,
            can_review: false,
            is_review_mode: false,
            is_review_finished: false,
            review_queue_len: 0,
            practice_total_seconds: 0,
            practice_week_seconds: 0,
        }
    }
}

/// Session state machine tying note selection, scoring, the countdown,
/// review drills and persistence together. Invalid actions are no-ops that
/// return `false`.
pub struct GameController {
    settings: GameSettings,
    height_hint: Option<f32>,
    phase: Phase,
    resume_phase: Phase,
    current: DrawnNote,
    selector: NoteSelector,
    score: ScoreTracker,
    review: ReviewQueue,
    timer: CountdownTimer,
    store: PersistenceStore,
    practice: PracticeTracker,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    subscribers: Vec<Sender<GameEvent>>,
}

impl GameController {
    /// Builds a controller, restoring a saved session into `Paused` when one
    /// exists and opening settings otherwise.
    pub fn new(
        settings: GameSettings,
        store: PersistenceStore,
        clock: Arc<dyn Clock>,
        mut rng: StdRng,
    ) -> Result<Self, DomainError> {
        settings.validate()?;
        let selector = NoteSelector;
        let practice = PracticeTracker::new(store.load_practice());
        let timer = CountdownTimer::new(seconds(settings.time_limit_seconds));

        let restored = store.load().and_then(|snapshot| {
            ScoreTracker::from_score(snapshot.score).map(|score| (snapshot, score))
        });
        let (phase, resume_phase, current, score, review) = match restored {
            Some((snapshot, score)) => {
                let selection = &snapshot.note_selection;
                let resume_phase = if selection.is_answer_revealed {
                    Phase::AnswerRevealed
                } else {
                    Phase::Playing
                };
                let review = ReviewQueue::restore(&snapshot.review);
                let shown = ReviewEntry::new(selection.note, selection.clef);
                // A review round resumes on its queue head so grading never
                // pops a card that was not shown.
                let (entry, resume_phase) = match review
                    .current()
                    .filter(|head| review.is_review_mode() && !head.same_card(&shown))
                {
                    Some(head) => (head, Phase::Playing),
                    None => (shown, resume_phase),
                };
                info!(
                    note = %entry.note,
                    clef = %entry.clef,
                    "restored previous session"
                );
                (
                    Phase::Paused,
                    resume_phase,
                    DrawnNote {
                        note: entry.note,
                        clef: entry.clef,
                    },
                    score,
                    review,
                )
            }
            None => (
                Phase::SettingsOpen,
                Phase::Playing,
                selector.draw(&settings, None, &mut rng),
                ScoreTracker::new(),
                ReviewQueue::new(),
            ),
        };

        Ok(Self {
            settings,
            height_hint: None,
            phase,
            resume_phase,
            current,
            selector,
            score,
            review,
            timer,
            store,
            practice,
            clock,
            rng,
            subscribers: Vec::new(),
        })
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> DrawnNote {
        self.current
    }

    pub fn score(&self) -> Score {
        self.score.score()
    }

    pub fn review(&self) -> &ReviewQueue {
        &self.review
    }

    pub fn is_answer_revealed(&self) -> bool {
        match self.phase {
            Phase::AnswerRevealed | Phase::TimedOut => true,
            Phase::Paused => self.resume_phase == Phase::AnswerRevealed,
            Phase::Playing | Phase::SettingsOpen => false,
        }
    }

    /// Applies new settings. Only the settings screen may change them, so
    /// outside `SettingsOpen` this returns `Ok(false)` and keeps the old ones.
    pub fn update_settings(&mut self, settings: GameSettings) -> Result<bool, DomainError> {
        settings.validate()?;
        if self.phase != Phase::SettingsOpen {
            return Ok(false);
        }
        debug!(?settings, "settings updated");
        self.settings = settings;
        self.notify(GameEvent::Changed);
        Ok(true)
    }

    /// Height of the drawing area, used to limit ledger lines on small screens.
    pub fn set_viewport_height(&mut self, height: Option<f32>) {
        self.height_hint = height;
    }

    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::Start => self.start(),
            Action::Reveal => self.reveal(),
            Action::MarkCorrect => self.mark_correct(),
            Action::MarkIncorrect => self.mark_incorrect(),
            Action::TimeoutContinue => self.timeout_continue(),
            Action::StartReview => self.start_review(),
            Action::StopReview => self.stop_review(),
            Action::SkipReview => self.skip_review(),
            Action::Resume => self.resume(),
            Action::Restart => self.restart(),
        }
    }

    pub fn start(&mut self) -> bool {
        if self.phase != Phase::SettingsOpen {
            return false;
        }
        let now = self.clock.now();
        self.score.reset();
        self.review.reset();
        self.current = self.draw();
        self.enter_playing(now);
        info!(settings = ?self.settings, "game started");
        self.changed(now, true);
        true
    }

    pub fn reveal(&mut self) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let now = self.clock.now();
        self.timer.disarm_at(now);
        self.phase = Phase::AnswerRevealed;
        self.changed(now, true);
        true
    }

    pub fn mark_correct(&mut self) -> bool {
        if self.phase != Phase::AnswerRevealed {
            return false;
        }
        let now = self.clock.now();
        self.score.mark_correct();
        debug!(note = %self.current.note, "answered correctly");
        self.advance_review();
        self.next_card(now);
        true
    }

    pub fn mark_incorrect(&mut self) -> bool {
        if self.phase != Phase::AnswerRevealed {
            return false;
        }
        self.grade_incorrect();
        true
    }

    pub fn timeout_continue(&mut self) -> bool {
        if self.phase != Phase::TimedOut {
            return false;
        }
        self.grade_incorrect();
        true
    }

    pub fn start_review(&mut self) -> bool {
        if !(self.phase.is_in_game() || self.phase == Phase::Paused) || self.review.is_review_mode()
        {
            return false;
        }
        let Some(head) = self.review.start_review(&mut self.rng) else {
            return false;
        };
        let now = self.clock.now();
        self.show_entry(head);
        self.enter_playing(now);
        self.changed(now, true);
        true
    }

    pub fn stop_review(&mut self) -> bool {
        if !self.review.is_review_mode() || self.phase == Phase::SettingsOpen {
            return false;
        }
        let now = self.clock.now();
        self.review.cancel();
        self.current = self.draw();
        self.enter_playing(now);
        self.changed(now, true);
        true
    }

    pub fn skip_review(&mut self) -> bool {
        if !self.review.is_review_mode() || !self.phase.is_in_game() {
            return false;
        }
        let Some(head) = self.review.requeue_current() else {
            return false;
        };
        let now = self.clock.now();
        self.show_entry(head);
        self.enter_playing(now);
        self.changed(now, true);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }
        let now = self.clock.now();
        self.timer.reset(seconds(self.settings.time_limit_seconds));
        self.phase = self.resume_phase;
        if self.phase == Phase::Playing {
            self.arm_timer(now);
        }
        info!(note = %self.current.note, "session resumed");
        self.changed(now, false);
        true
    }

    pub fn restart(&mut self) -> bool {
        if self.phase == Phase::SettingsOpen {
            return false;
        }
        let now = self.clock.now();
        self.timer.disarm_at(now);
        self.phase = Phase::SettingsOpen;
        info!(score = ?self.score.score(), "returned to settings");
        self.changed(now, false);
        true
    }

    /// Drives scheduled work: timer expiry, debounced saves and practice time.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if self.timer.poll_at(now) {
            self.on_timeout(now);
        }
        self.store.poll_at(now);
        let today = self.clock.today();
        self.practice.poll_at(now, today, &self.store);
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.timer.next_deadline(),
            self.store.next_deadline(),
            self.practice.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Forces pending writes out, e.g. when the app is about to be hidden.
    pub fn suspend(&mut self) {
        let now = self.clock.now();
        let today = self.clock.today();
        if self.store.has_pending() {
            debug!("flushing pending game state before suspend");
            self.store.flush();
        }
        self.practice.flush_at(now, today, &self.store);
    }

    pub fn shutdown(&mut self) {
        let now = self.clock.now();
        let today = self.clock.today();
        self.timer.disarm_at(now);
        self.store.flush();
        self.practice.set_active_at(false, now, today, &self.store);
        info!("session closed");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            score: self.score.score(),
            note_selection: NoteSelection {
                note: self.current.note,
                clef: self.current.clef,
                is_answer_revealed: self.is_answer_revealed(),
            },
            review: self.review.snapshot(),
        }
    }

    pub fn view(&self) -> GameView {
        let now = self.clock.now();
        let log = self.practice.log();
        GameView {
            phase: self.phase,
            note: self.current.note,
            clef: self.current.clef,
            stem: self.current.clef.stem_direction(&self.current.note),
            is_answer_revealed: self.is_answer_revealed(),
            score: self.score.score(),
            timer_enabled: self.settings.time_limit_enabled,
            timer_progress: self.timer.progress_at(now),
            time_left: self.timer.time_left_at(now),
            is_time_expired: self.phase == Phase::TimedOut,
            can_review: self.review.can_review(),
            is_review_mode: self.review.is_review_mode(),
            is_review_finished: self.review.is_review_finished(),
            review_queue_len: self.review.queue().len(),
            practice_total_seconds: log.total_seconds(),
            practice_week_seconds: log.week_seconds(self.clock.today()),
        }
    }

    fn grade_incorrect(&mut self) {
        let now = self.clock.now();
        self.score.mark_incorrect();
        self.review.record_miss(self.current.note, self.current.clef);
        debug!(note = %self.current.note, clef = %self.current.clef, "answered incorrectly");
        self.advance_review();
        self.next_card(now);
    }

    fn advance_review(&mut self) {
        if self.review.is_review_mode() && self.review.advance().is_none() {
            self.notify(GameEvent::ReviewFinished);
        }
    }

    /// Shows the review head while a round is running, otherwise a fresh draw.
    fn next_card(&mut self, now: Instant) {
        match self.review.current().filter(|_| self.review.is_review_mode()) {
            Some(entry) => self.show_entry(entry),
            None => self.current = self.draw(),
        }
        self.enter_playing(now);
        self.changed(now, true);
    }

    fn show_entry(&mut self, entry: ReviewEntry) {
        self.current = DrawnNote {
            note: entry.note,
            clef: entry.clef,
        };
    }

    fn draw(&mut self) -> DrawnNote {
        self.selector
            .draw(&self.settings, self.height_hint, &mut self.rng)
    }

    fn enter_playing(&mut self, now: Instant) {
        self.phase = Phase::Playing;
        self.timer.reset(seconds(self.settings.time_limit_seconds));
        self.arm_timer(now);
    }

    fn arm_timer(&mut self, now: Instant) {
        let duration = seconds(self.settings.time_limit_seconds);
        if self
            .timer
            .arm_at(self.settings.time_limit_enabled, duration, now)
        {
            self.on_timeout(now);
        }
    }

    fn on_timeout(&mut self, now: Instant) {
        if self.phase != Phase::Playing {
            return;
        }
        self.phase = Phase::TimedOut;
        info!(note = %self.current.note, "time ran out");
        self.notify(GameEvent::TimedOut);
        self.changed(now, true);
    }

    fn changed(&mut self, now: Instant, persist: bool) {
        if persist {
            self.store.save_at(self.snapshot(), now);
        }
        let today = self.clock.today();
        self.practice
            .set_active_at(self.phase.is_in_game(), now, today, &self.store);
        self.notify(GameEvent::Changed);
    }

    fn notify(&mut self, event: GameEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        self.store.cancel();
    }
}
